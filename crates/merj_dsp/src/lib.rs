//! Merj DSP - Digital Signal Processing Module
//!
//! This crate provides the signal path of the MerjEQ equalizer:
//! - Audio EQ Cookbook coefficient design (low shelf, peak, high shelf)
//! - `biquad` Direct Form I sections, one per channel and band
//! - Three-band filter chain with per-band change detection
//! - `tanh` soft saturation output stage
//! - Denormal protection for recursive filters
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Coefficients are recomputed inline, between samples, only when a band's
//! parameters actually change; per-channel filter state is never shared.

pub mod analysis;
mod chain;
mod coeffs;
mod denormal;
mod error;
mod filter;
mod saturation;

pub use chain::{
    Band, BandParameters, ChainState, FilterChain, DEFAULT_Q, MAX_GAIN_DB, MAX_Q, MIN_GAIN_DB,
    MIN_Q,
};
pub use coeffs::{
    db_to_gain, peak_coefficients, shelf_coefficients, BiquadCoefficients, CoefficientDesigner,
    Cookbook, ShelfKind, SHELF_SLOPE,
};
pub use denormal::DenormalGuard;
pub use error::DspError;
pub use filter::Biquad;
pub use saturation::{soft_saturate, SaturationStage};
