//! Merj Core - EQ Processor
//!
//! This crate wraps the MerjEQ signal path for a plugin host:
//! - Stream configuration and validation
//! - Lock-free parameter store shared between control and audio threads
//! - Block processor with the host lifecycle (prepare, process, release)
//! - Serializable parameter state for session recall
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │     Host / Editor ──set()──▶ ParameterStore (atomics)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ snapshot() once per block
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │  Low Shelf ──▶ Peak ──▶ High Shelf ──▶ Saturation          │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod params;
mod processor;
mod state;

pub use config::StreamConfig;
pub use error::{ProcessorError, ProcessorResult};
pub use params::{ParameterId, ParameterRange, ParameterSnapshot, ParameterStore};
pub use processor::{AudioProcessor, EqProcessor};
pub use state::EqState;

// Re-export DSP types for convenience
pub use merj_dsp::{Band, BandParameters, ChainState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = StreamConfig::default();
        let _processor = EqProcessor::default();
        let _state = EqState::default();
    }
}
