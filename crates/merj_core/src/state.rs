//! Saved Processor State
//!
//! Parameter values persisted by the host between sessions. Keys use the
//! host-visible parameter identifiers; any key missing from saved state
//! falls back to that parameter's default, so older sessions still load.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProcessorResult;
use crate::params::{ParameterId, ParameterSnapshot, ParameterStore};

fn default_gain() -> f32 {
    ParameterId::LowGain.default_value()
}

fn default_q() -> f32 {
    ParameterId::MidQ.default_value()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqState {
    #[serde(rename = "LowGain", default = "default_gain")]
    pub low_gain_db: f32,

    #[serde(rename = "MidGain", default = "default_gain")]
    pub mid_gain_db: f32,

    #[serde(rename = "HighGain", default = "default_gain")]
    pub high_gain_db: f32,

    #[serde(rename = "MidQ", default = "default_q")]
    pub mid_q: f32,

    #[serde(rename = "saturationEnabled", default)]
    pub saturation_enabled: bool,
}

impl Default for EqState {
    fn default() -> Self {
        ParameterSnapshot::default().into()
    }
}

impl From<ParameterSnapshot> for EqState {
    fn from(snapshot: ParameterSnapshot) -> Self {
        Self {
            low_gain_db: snapshot.low_gain_db,
            mid_gain_db: snapshot.mid_gain_db,
            high_gain_db: snapshot.high_gain_db,
            mid_q: snapshot.mid_q,
            saturation_enabled: snapshot.saturation_enabled,
        }
    }
}

impl EqState {
    /// Capture the current values of a parameter store
    pub fn capture(store: &ParameterStore) -> Self {
        store.snapshot().into()
    }

    /// Write these values into a parameter store (clamped on the way in)
    pub fn apply(&self, store: &ParameterStore) {
        store.set(ParameterId::LowGain, self.low_gain_db);
        store.set(ParameterId::MidGain, self.mid_gain_db);
        store.set(ParameterId::HighGain, self.high_gain_db);
        store.set(ParameterId::MidQ, self.mid_q);
        store.set_saturation_enabled(self.saturation_enabled);
        debug!("Restored parameter state: {:?}", self);
    }

    pub fn to_json(&self) -> ProcessorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ProcessorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
