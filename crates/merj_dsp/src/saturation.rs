//! Soft Saturation
//!
//! Output stage applying `tanh(2x)`: a smooth, odd-symmetric soft clip with
//! no threshold and roughly +6 dB of drive for small signals.
//!
//! # Properties
//! - Output lies strictly inside (-1, 1). Where `tanh` rounds to ±1 in f32
//!   the result is held one ulp inside the interval
//! - Monotonic, and `process(-x) == -process(x)`
//! - Not idempotent: applying it again compresses further. This is a
//!   waveshaper, not a limiter.
//!
//! Disabled, the stage is an exact identity.

/// Drive applied before the tanh curve
const DRIVE: f32 = 2.0;

/// Largest f32 strictly below 1.0
const JUST_BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Stateless tanh waveshaper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaturationStage {
    enabled: bool,
}

impl SaturationStage {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Process a single sample
    ///
    /// # Real-time Safety
    /// No allocations, no state, O(1) time.
    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        if self.enabled {
            soft_saturate(sample)
        } else {
            sample
        }
    }

    /// Process a buffer in-place
    #[inline]
    pub fn process_buffer(&self, buffer: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in buffer.iter_mut() {
            *sample = soft_saturate(*sample);
        }
    }
}

/// `tanh(2x)`, kept strictly inside (-1, 1)
#[inline]
pub fn soft_saturate(sample: f32) -> f32 {
    (sample * DRIVE).tanh().clamp(-JUST_BELOW_ONE, JUST_BELOW_ONE)
}
