//! Complete mutable state of the thermal model.

use crate::events::EventSchedule;
use crate::noise::NoiseSource;
use crate::profile::{Profile, StallParams};
use pit_controls::{FanMode, PidState};
use serde::{Deserialize, Serialize};

/// Every field that changes while the model runs.
///
/// Serializing this struct and restoring it into a fresh model reproduces the
/// original trajectory exactly, noise included. Missing fields load from the
/// default profile's initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelState {
    pub pit_temp: f64,
    pub meat1_temp: f64,
    pub meat2_temp: f64,
    pub ambient_temp: f64,
    pub setpoint: f64,

    pub fan_percent: f64,
    pub damper_percent: f64,
    pub fan_mode: FanMode,
    pub fan_on_threshold: f64,

    /// 1.0 = fully lit.
    pub fire_energy: f64,
    pub fire_out: bool,

    pub lid_open: bool,
    /// Simulated seconds until the lid closes.
    pub lid_remaining_s: f64,
    pub lid_drop_applied: bool,
    /// Pit temperature captured when the current lid opening began.
    pub pre_lid_pit_temp: f64,

    pub meat1_connected: bool,
    pub meat2_connected: bool,

    pub stall: StallParams,
    pub stall_time_accumulated_s: f64,
    pub in_stall: bool,

    /// Total simulated seconds since session start. Never decreases.
    pub sim_time_s: f64,
    pub pid: PidState,
    pub has_reached_setpoint: bool,
    pub overshoot_remaining: f64,

    pub noise: NoiseSource,
    pub events: EventSchedule,
}

impl ModelState {
    /// Initial state for a profile, with a fresh noise stream. Invalid
    /// profile numbers are replaced by defaults first.
    pub fn from_profile(profile: &Profile, noise: NoiseSource) -> Self {
        let profile = profile.clone().sanitized();
        Self {
            pit_temp: profile.initial_pit_temp,
            meat1_temp: profile.meat1_start,
            meat2_temp: profile.meat2_start,
            ambient_temp: profile.ambient_temp(),
            setpoint: profile.target_pit_temp,
            fan_percent: 0.0,
            damper_percent: 0.0,
            fan_mode: profile.fan_mode,
            fan_on_threshold: profile.fan_on_threshold,
            fire_energy: 1.0,
            fire_out: false,
            lid_open: false,
            lid_remaining_s: 0.0,
            lid_drop_applied: false,
            pre_lid_pit_temp: 0.0,
            meat1_connected: true,
            meat2_connected: true,
            stall: profile.stall,
            stall_time_accumulated_s: 0.0,
            in_stall: false,
            sim_time_s: 0.0,
            pid: PidState::default(),
            has_reached_setpoint: false,
            overshoot_remaining: 0.0,
            noise,
            events: EventSchedule::armed(&profile.events),
        }
    }
}

impl Default for ModelState {
    fn default() -> Self {
        Self::from_profile(&Profile::default(), NoiseSource::from_entropy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_profile_defaults() {
        let state: ModelState =
            serde_json::from_str(r#"{"pit_temp": 180.5, "sim_time_s": 1200}"#).unwrap();
        assert_eq!(state.pit_temp, 180.5);
        assert_eq!(state.sim_time_s, 1200.0);
        assert_eq!(state.setpoint, 225.0);
        assert_eq!(state.fire_energy, 1.0);
        assert!(state.meat1_connected);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = ModelState::from_profile(&Profile::default(), NoiseSource::from_seed(9));
        let json = serde_json::to_string(&state).unwrap();
        let back: ModelState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
