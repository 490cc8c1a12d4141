//! Processor Error Types

use thiserror::Error;

/// Errors that can occur in the EQ processor
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Processor used before prepare() - output silenced")]
    Uninitialized,

    #[error("DSP error: {0}")]
    DspError(#[from] merj_dsp::DspError),

    #[error("State error: {0}")]
    StateError(#[from] serde_json::Error),
}

/// Result type alias for processor operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;
