//! Stream Configuration

use serde::{Deserialize, Serialize};

use crate::error::{ProcessorError, ProcessorResult};

/// Audio stream configuration handed over by the host at prepare time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Largest block the host will deliver, in frames
    pub max_block_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_block_size: 512,
        }
    }
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: u16, max_block_size: u32) -> Self {
        Self {
            sample_rate,
            channels,
            max_block_size,
        }
    }

    /// Calculate latency in milliseconds of one full block
    pub fn latency_ms(&self) -> f32 {
        (self.max_block_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> ProcessorResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(ProcessorError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(ProcessorError::ConfigError(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        if self.max_block_size < 16 || self.max_block_size > 8192 {
            return Err(ProcessorError::ConfigError(format!(
                "Invalid block size: {}",
                self.max_block_size
            )));
        }
        Ok(())
    }
}
