//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while designing filters
///
/// These are contract violations by the caller. The real-time path clamps
/// every input before it reaches the coefficient calculator, so none of
/// these should ever be produced on the audio thread.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl DspError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        DspError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}
