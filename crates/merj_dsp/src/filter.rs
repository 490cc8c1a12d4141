//! Biquad Filter
//!
//! One (channel, band) filter instance: a `biquad` crate Direct Form I
//! section paired with the cookbook coefficients it currently runs.
//!
//! ```text
//! y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] − a1·y[n-1] − a2·y[n-2]
//! ```

use biquad::{Biquad as _, DirectForm1};

use crate::coeffs::BiquadCoefficients;

/// A single biquad section owning its coefficients and delay state
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Kept alongside the filter's own copy for analysis
    coeffs: BiquadCoefficients,
    filter: DirectForm1<f32>,
}

impl Biquad {
    pub fn new(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            filter: DirectForm1::<f32>::new(coeffs.into()),
        }
    }

    /// Process a single sample
    ///
    /// # Real-time Safety
    /// No allocations, O(1) time.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        self.filter.run(input)
    }

    /// Process a buffer in-place, samples in temporal order
    #[inline]
    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.filter.run(*sample);
        }
    }

    /// Swap in a new coefficient set, returning the previous one
    ///
    /// The delay registers are kept, so the output stays continuous across
    /// the change. Call between blocks, never in the middle of one.
    pub fn replace_coefficients(&mut self, coeffs: BiquadCoefficients) -> BiquadCoefficients {
        self.filter.update_coefficients(coeffs.into());
        std::mem::replace(&mut self.coeffs, coeffs)
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coeffs
    }

    /// Reset filter state (clear delay lines)
    ///
    /// Call on stream start/stop and sample-rate change, never mid-block.
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new(BiquadCoefficients::IDENTITY)
    }
}
