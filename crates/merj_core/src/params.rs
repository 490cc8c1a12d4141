//! Parameter Layout and Lock-Free Parameter Store
//!
//! The host (or the editor) writes parameters from a control thread while
//! the audio thread reads them once per block. Every parameter lives in its
//! own atomic, so a block-start [`ParameterStore::snapshot`] is a handful
//! of relaxed loads: never blocking, never torn within a parameter.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use merj_dsp::{Band, BandParameters, DEFAULT_Q, MAX_GAIN_DB, MAX_Q, MIN_GAIN_DB, MIN_Q};

/// Host-visible parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowGain,
    MidGain,
    HighGain,
    MidQ,
    SaturationEnabled,
}

/// Inclusive value range of a parameter, with linear normalisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Map a plain value to 0..=1
    pub fn to_normalized(&self, value: f32) -> f32 {
        (self.clamp(value) - self.min) / (self.max - self.min)
    }

    /// Map 0..=1 back to a plain value
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }
}

const GAIN_RANGE: ParameterRange = ParameterRange::new(MIN_GAIN_DB, MAX_GAIN_DB);
const Q_RANGE: ParameterRange = ParameterRange::new(MIN_Q, MAX_Q);
const TOGGLE_RANGE: ParameterRange = ParameterRange::new(0.0, 1.0);

impl ParameterId {
    pub const ALL: [ParameterId; 5] = [
        ParameterId::LowGain,
        ParameterId::MidGain,
        ParameterId::HighGain,
        ParameterId::MidQ,
        ParameterId::SaturationEnabled,
    ];

    /// Stable identifier used by hosts and saved state
    pub const fn id(self) -> &'static str {
        match self {
            ParameterId::LowGain => "LowGain",
            ParameterId::MidGain => "MidGain",
            ParameterId::HighGain => "HighGain",
            ParameterId::MidQ => "MidQ",
            ParameterId::SaturationEnabled => "saturationEnabled",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ParameterId::LowGain => "Low Gain",
            ParameterId::MidGain => "Mid Gain",
            ParameterId::HighGain => "High Gain",
            ParameterId::MidQ => "Mid Q",
            ParameterId::SaturationEnabled => "Saturation Enabled",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.id() == id)
    }

    pub const fn range(self) -> ParameterRange {
        match self {
            ParameterId::LowGain | ParameterId::MidGain | ParameterId::HighGain => GAIN_RANGE,
            ParameterId::MidQ => Q_RANGE,
            ParameterId::SaturationEnabled => TOGGLE_RANGE,
        }
    }

    /// Default plain value (toggles use 0.0 / 1.0)
    pub const fn default_value(self) -> f32 {
        match self {
            ParameterId::LowGain | ParameterId::MidGain | ParameterId::HighGain => 0.0,
            ParameterId::MidQ => DEFAULT_Q,
            ParameterId::SaturationEnabled => 0.0,
        }
    }

    pub const fn is_toggle(self) -> bool {
        matches!(self, ParameterId::SaturationEnabled)
    }

    /// Gain parameter driving `band`
    pub const fn gain_for(band: Band) -> Self {
        match band {
            Band::LowShelf => ParameterId::LowGain,
            Band::PeakBell => ParameterId::MidGain,
            Band::HighShelf => ParameterId::HighGain,
        }
    }
}

/// Parameter values read once at the start of a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub low_gain_db: f32,
    pub mid_gain_db: f32,
    pub high_gain_db: f32,
    pub mid_q: f32,
    pub saturation_enabled: bool,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            low_gain_db: 0.0,
            mid_gain_db: 0.0,
            high_gain_db: 0.0,
            mid_q: DEFAULT_Q,
            saturation_enabled: false,
        }
    }
}

impl ParameterSnapshot {
    /// Parameters for one band (Q only matters for the peak band)
    pub fn band(&self, band: Band) -> BandParameters {
        let gain_db = match band {
            Band::LowShelf => self.low_gain_db,
            Band::PeakBell => self.mid_gain_db,
            Band::HighShelf => self.high_gain_db,
        };
        BandParameters::new(gain_db, self.mid_q)
    }
}

/// Shared parameter state between control and audio threads
///
/// Rust pattern: AtomicF32 doesn't exist, so floats are stored as their bit
/// pattern in an AtomicU32. Relaxed ordering is enough: each parameter is an
/// independent value with a single writer and a single reader.
#[derive(Debug)]
pub struct ParameterStore {
    low_gain_bits: AtomicU32,
    mid_gain_bits: AtomicU32,
    high_gain_bits: AtomicU32,
    mid_q_bits: AtomicU32,
    saturation_enabled: AtomicBool,
}

impl ParameterStore {
    /// Create a store holding every parameter's default
    pub fn new() -> Self {
        Self {
            low_gain_bits: AtomicU32::new(ParameterId::LowGain.default_value().to_bits()),
            mid_gain_bits: AtomicU32::new(ParameterId::MidGain.default_value().to_bits()),
            high_gain_bits: AtomicU32::new(ParameterId::HighGain.default_value().to_bits()),
            mid_q_bits: AtomicU32::new(ParameterId::MidQ.default_value().to_bits()),
            saturation_enabled: AtomicBool::new(false),
        }
    }

    fn float_slot(&self, id: ParameterId) -> Option<&AtomicU32> {
        match id {
            ParameterId::LowGain => Some(&self.low_gain_bits),
            ParameterId::MidGain => Some(&self.mid_gain_bits),
            ParameterId::HighGain => Some(&self.high_gain_bits),
            ParameterId::MidQ => Some(&self.mid_q_bits),
            ParameterId::SaturationEnabled => None,
        }
    }

    /// Set a parameter from its plain value
    ///
    /// Values are clamped into range; non-finite values reset the parameter
    /// to its default. Toggles switch on above 0.5.
    pub fn set(&self, id: ParameterId, value: f32) {
        match self.float_slot(id) {
            Some(slot) => {
                let value = if value.is_finite() {
                    id.range().clamp(value)
                } else {
                    id.default_value()
                };
                slot.store(value.to_bits(), Ordering::Relaxed);
            }
            None => self.set_saturation_enabled(value > 0.5),
        }
    }

    /// Current plain value (toggles read as 0.0 / 1.0)
    pub fn get(&self, id: ParameterId) -> f32 {
        match self.float_slot(id) {
            Some(slot) => f32::from_bits(slot.load(Ordering::Relaxed)),
            None => {
                if self.saturation_enabled() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Set a parameter from a host-normalised 0..=1 value
    pub fn set_normalized(&self, id: ParameterId, normalized: f32) {
        if normalized.is_finite() {
            self.set(id, id.range().from_normalized(normalized));
        }
    }

    pub fn normalized(&self, id: ParameterId) -> f32 {
        id.range().to_normalized(self.get(id))
    }

    pub fn set_saturation_enabled(&self, enabled: bool) {
        self.saturation_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn saturation_enabled(&self) -> bool {
        self.saturation_enabled.load(Ordering::Relaxed)
    }

    /// Set the gain of `band`, and Q as well for the peak band
    pub fn set_band(&self, band: Band, params: BandParameters) {
        self.set(ParameterId::gain_for(band), params.gain_db);
        if band.has_variable_q() {
            self.set(ParameterId::MidQ, params.q);
        }
    }

    /// Restore every parameter to its default
    pub fn reset_to_defaults(&self) {
        for id in ParameterId::ALL {
            self.set(id, id.default_value());
        }
    }

    /// Read every parameter once
    ///
    /// # Real-time Safety
    /// Five relaxed atomic loads. No locks, no allocation.
    #[inline]
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            low_gain_db: f32::from_bits(self.low_gain_bits.load(Ordering::Relaxed)),
            mid_gain_db: f32::from_bits(self.mid_gain_bits.load(Ordering::Relaxed)),
            high_gain_db: f32::from_bits(self.high_gain_bits.load(Ordering::Relaxed)),
            mid_q: f32::from_bits(self.mid_q_bits.load(Ordering::Relaxed)),
            saturation_enabled: self.saturation_enabled.load(Ordering::Relaxed),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
