//! Biquad Coefficient Calculator
//!
//! Shelf and peak designs from the RBJ (Robert Bristow-Johnson) Audio EQ
//! Cookbook. All intermediate math runs in f64 and the result is rounded to
//! f32 once, so coefficients for low corner frequencies keep their poles
//! well inside the unit circle.
//!
//! Gains are linear amplitudes: callers convert decibels with [`db_to_gain`]
//! before designing a filter.

use std::f64::consts::PI;

use crate::error::DspError;

/// Shelf slope used by both shelving bands (Butterworth-like transition)
pub const SHELF_SLOPE: f32 = 0.707;

/// Which side of the corner frequency a shelf acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    Low,
    High,
}

/// Five biquad coefficients normalized so that a0 = 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Pass-through filter: y[n] = x[n]
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Normalize a raw cookbook result by a0
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }

    /// Magnitude response in dB at `frequency`, evaluated on the unit circle
    pub fn magnitude_db(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * f64::from(frequency) / f64::from(sample_rate);
        let (sin1, cos1) = w.sin_cos();
        let (sin2, cos2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (f64::from(self.b0), f64::from(self.b1), f64::from(self.b2));
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        let num_re = b0 + b1 * cos1 + b2 * cos2;
        let num_im = -(b1 * sin1 + b2 * sin2);
        let den_re = 1.0 + a1 * cos1 + a2 * cos2;
        let den_im = -(a1 * sin1 + a2 * sin2);

        let power = (num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im);
        (10.0 * power.log10()) as f32
    }

    /// Both poles strictly inside the unit circle (stability triangle)
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<BiquadCoefficients> for biquad::Coefficients<f32> {
    fn from(c: BiquadCoefficients) -> Self {
        biquad::Coefficients {
            a1: c.a1,
            a2: c.a2,
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
        }
    }
}

/// Convert dB gain to linear amplitude
/// Formula: amplitude = 10^(dB/20)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

fn check_sample_rate(sample_rate: f32) -> Result<f64, DspError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DspError::invalid(
            "sample_rate",
            f64::from(sample_rate),
            "must be positive and finite",
        ));
    }
    Ok(f64::from(sample_rate))
}

fn check_frequency(frequency: f32, sample_rate: f64) -> Result<f64, DspError> {
    let frequency = f64::from(frequency);
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(DspError::invalid("frequency", frequency, "must be positive"));
    }
    if frequency >= sample_rate / 2.0 {
        return Err(DspError::invalid(
            "frequency",
            frequency,
            "must be below the Nyquist frequency",
        ));
    }
    Ok(frequency)
}

fn check_positive(name: &'static str, value: f32) -> Result<f64, DspError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DspError::invalid(name, f64::from(value), "must be positive and finite"));
    }
    Ok(f64::from(value))
}

/// Design a low or high shelf
///
/// `linear_gain` is the plateau gain. At the corner frequency the response
/// sits halfway (in dB) between unity and the plateau.
pub fn shelf_coefficients(
    kind: ShelfKind,
    sample_rate: f32,
    corner_frequency: f32,
    slope: f32,
    linear_gain: f32,
) -> Result<BiquadCoefficients, DspError> {
    let fs = check_sample_rate(sample_rate)?;
    let f0 = check_frequency(corner_frequency, fs)?;
    let slope = check_positive("slope", slope)?;
    let gain = check_positive("gain", linear_gain)?;

    let a = gain.sqrt();
    let (sin_w0, cos_w0) = (2.0 * PI * f0 / fs).sin_cos();
    // 2 * sqrt(A) * alpha, with alpha = sin(w0) / (2 * slope)
    let beta = sin_w0 * a.sqrt() / slope;
    let a_plus = a + 1.0;
    let a_minus = a - 1.0;

    let coeffs = match kind {
        ShelfKind::Low => BiquadCoefficients::normalized(
            a * (a_plus - a_minus * cos_w0 + beta),
            2.0 * a * (a_minus - a_plus * cos_w0),
            a * (a_plus - a_minus * cos_w0 - beta),
            a_plus + a_minus * cos_w0 + beta,
            -2.0 * (a_minus + a_plus * cos_w0),
            a_plus + a_minus * cos_w0 - beta,
        ),
        ShelfKind::High => BiquadCoefficients::normalized(
            a * (a_plus + a_minus * cos_w0 + beta),
            -2.0 * a * (a_minus + a_plus * cos_w0),
            a * (a_plus + a_minus * cos_w0 - beta),
            a_plus - a_minus * cos_w0 + beta,
            2.0 * (a_minus - a_plus * cos_w0),
            a_plus - a_minus * cos_w0 - beta,
        ),
    };
    Ok(coeffs)
}

/// Design a peak (bell) filter with bandwidth set by `q`
///
/// The response at `center_frequency` equals `linear_gain` exactly, and
/// boost and cut of the same magnitude are mirror images in dB.
pub fn peak_coefficients(
    sample_rate: f32,
    center_frequency: f32,
    q: f32,
    linear_gain: f32,
) -> Result<BiquadCoefficients, DspError> {
    let fs = check_sample_rate(sample_rate)?;
    let f0 = check_frequency(center_frequency, fs)?;
    let q = check_positive("q", q)?;
    let gain = check_positive("gain", linear_gain)?;

    let a = gain.sqrt();
    let (sin_w0, cos_w0) = (2.0 * PI * f0 / fs).sin_cos();
    let alpha = sin_w0 / (2.0 * q);
    let c = -2.0 * cos_w0;

    Ok(BiquadCoefficients::normalized(
        1.0 + alpha * a,
        c,
        1.0 - alpha * a,
        1.0 + alpha / a,
        c,
        1.0 - alpha / a,
    ))
}

/// Source of coefficients for a [`FilterChain`](crate::FilterChain)
///
/// The chain only ever talks to this trait, so alternative designs (or an
/// instrumented wrapper in tests) can be dropped in without touching the
/// change-detection logic.
pub trait CoefficientDesigner {
    fn shelf(
        &self,
        kind: ShelfKind,
        sample_rate: f32,
        corner_frequency: f32,
        slope: f32,
        linear_gain: f32,
    ) -> Result<BiquadCoefficients, DspError>;

    fn peak(
        &self,
        sample_rate: f32,
        center_frequency: f32,
        q: f32,
        linear_gain: f32,
    ) -> Result<BiquadCoefficients, DspError>;
}

/// Audio EQ Cookbook designer
#[derive(Debug, Clone, Copy, Default)]
pub struct Cookbook;

impl CoefficientDesigner for Cookbook {
    #[inline]
    fn shelf(
        &self,
        kind: ShelfKind,
        sample_rate: f32,
        corner_frequency: f32,
        slope: f32,
        linear_gain: f32,
    ) -> Result<BiquadCoefficients, DspError> {
        shelf_coefficients(kind, sample_rate, corner_frequency, slope, linear_gain)
    }

    #[inline]
    fn peak(
        &self,
        sample_rate: f32,
        center_frequency: f32,
        q: f32,
        linear_gain: f32,
    ) -> Result<BiquadCoefficients, DspError> {
        peak_coefficients(sample_rate, center_frequency, q, linear_gain)
    }
}
