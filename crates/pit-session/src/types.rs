//! Session data types shared by the store, the protocol and reports.

use pit_sim::{ModelSample, ModelState, Profile};
use serde::{Deserialize, Serialize};

/// One sampled output, as recorded in the session and sent to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    /// Unix seconds on the session clock.
    pub ts: i64,
    pub pit: f64,
    pub meat1: Option<f64>,
    pub meat2: Option<f64>,
    pub fan: u8,
    pub damper: u8,
    pub sp: f64,
    pub lid: bool,
}

impl Reading {
    /// Stamp a model sample with `session_start + floor(sim_time)`.
    pub fn from_sample(sample: &ModelSample, session_start_ts: i64) -> Self {
        Self {
            ts: session_start_ts + sample.sim_time_s.floor() as i64,
            pit: sample.pit,
            meat1: sample.meat1,
            meat2: sample.meat2,
            fan: sample.fan_percent,
            damper: sample.damper_percent,
            sp: sample.setpoint,
            lid: sample.lid_open,
        }
    }
}

/// Client-set alarm targets. Stored for reporting only; the model never
/// reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlarmTargets {
    pub meat1_target: Option<f64>,
    pub meat2_target: Option<f64>,
}

impl AlarmTargets {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            meat1_target: profile.meat1_target,
            meat2_target: profile.meat2_target,
        }
    }
}

/// Everything written to the session file.
///
/// Every field defaults, so partial or older files still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(rename = "sessionData")]
    pub readings: Vec<Reading>,
    pub session_start_ts: Option<i64>,
    pub current_setpoint: Option<f64>,
    pub alarm_targets: Option<AlarmTargets>,
    pub model_state: Option<ModelState>,
}
