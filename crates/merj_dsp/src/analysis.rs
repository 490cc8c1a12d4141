//! Tone Response Measurement
//!
//! Measures the steady-state gain of any per-sample process at a single
//! frequency. A sine is fed through the process, the first quarter second
//! is discarded to let filters settle, and the output amplitude is then
//! recovered by synchronous (I/Q) detection over a whole number of periods.
//! Accumulation runs in f64, so the measurement itself contributes well
//! under 0.001 dB of error.

use std::f64::consts::PI;

/// Settling time discarded before measuring (seconds)
const SETTLE_SECONDS: f64 = 0.25;

/// Approximate length of the measurement window (seconds)
const WINDOW_SECONDS: f64 = 0.5;

/// Default test tone amplitude
pub const DEFAULT_AMPLITUDE: f32 = 0.5;

/// Result of measuring one tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMeasurement {
    pub frequency: f32,
    /// Output amplitude at the tone frequency divided by input amplitude, in dB
    pub gain_db: f32,
    /// Output amplitude at the tone frequency
    pub amplitude: f32,
    /// Largest absolute output sample inside the window
    pub peak: f32,
}

/// Feed a sine of `amplitude` through `process` and measure the result
pub fn measure_tone(
    mut process: impl FnMut(f32) -> f32,
    frequency: f32,
    sample_rate: f32,
    amplitude: f32,
) -> ToneMeasurement {
    let fs = f64::from(sample_rate);
    let freq = f64::from(frequency);
    let omega = 2.0 * PI * freq / fs;

    let settle = (fs * SETTLE_SECONDS) as usize;
    let periods = (freq * WINDOW_SECONDS).floor().max(1.0);
    let window = ((periods * fs / freq).round() as usize).max(1);

    let mut in_phase = 0.0_f64;
    let mut quadrature = 0.0_f64;
    let mut peak = 0.0_f32;

    for n in 0..settle + window {
        let phase = omega * n as f64;
        let input = (f64::from(amplitude) * phase.sin()) as f32;
        let output = process(input);

        if n >= settle {
            in_phase += f64::from(output) * phase.sin();
            quadrature += f64::from(output) * phase.cos();
            peak = peak.max(output.abs());
        }
    }

    let measured = 2.0 * in_phase.hypot(quadrature) / window as f64;
    ToneMeasurement {
        frequency,
        gain_db: (20.0 * (measured / f64::from(amplitude)).log10()) as f32,
        amplitude: measured as f32,
        peak,
    }
}

/// Steady-state gain of `process` at `frequency`, in dB
pub fn tone_gain_db(process: impl FnMut(f32) -> f32, frequency: f32, sample_rate: f32) -> f32 {
    measure_tone(process, frequency, sample_rate, DEFAULT_AMPLITUDE).gain_db
}
