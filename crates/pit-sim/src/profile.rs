//! Cook profiles: initial conditions, stall behaviour and scripted events.

use crate::error::{SimError, SimResult};
use crate::events::{EventKind, Probe, ScheduledEvent, DEFAULT_LID_OPEN_S};
use pit_controls::{FanMode, DEFAULT_FAN_ON_THRESHOLD};
use pit_core::{finite_or, positive_or};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_PIT_TEMP: f64 = 70.0;
const DEFAULT_MEAT_START: f64 = 40.0;
const DEFAULT_TARGET_PIT: f64 = 225.0;

/// Evaporative stall band for probe 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StallParams {
    pub enabled: bool,
    /// Stall begins once probe 1 reaches this temperature (°F).
    pub temp_low: f64,
    /// Probe 1 is held at or below this during the first half of the stall.
    pub temp_high: f64,
    /// Total time spent stalling before the stall fully releases.
    pub duration_hours: f64,
}

impl Default for StallParams {
    fn default() -> Self {
        Self {
            enabled: false,
            temp_low: 150.0,
            temp_high: 170.0,
            duration_hours: 4.0,
        }
    }
}

impl StallParams {
    pub fn duration_s(&self) -> f64 {
        self.duration_hours * 3600.0
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        let temp_low = finite_or(self.temp_low, defaults.temp_low);
        let mut temp_high = finite_or(self.temp_high, defaults.temp_high);
        if temp_high < temp_low {
            temp_high = temp_low;
        }
        Self {
            enabled: self.enabled,
            temp_low,
            temp_high,
            duration_hours: positive_or(self.duration_hours, defaults.duration_hours),
        }
    }
}

/// Immutable cook configuration. Defines the state a new session resets to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub description: String,
    /// Initial pit temperature; also the ambient temperature.
    pub initial_pit_temp: f64,
    pub meat1_start: f64,
    pub meat2_start: f64,
    pub target_pit_temp: f64,
    pub meat1_target: Option<f64>,
    pub meat2_target: Option<f64>,
    pub stall: StallParams,
    pub fan_mode: FanMode,
    pub fan_on_threshold: f64,
    pub events: Vec<ScheduledEvent>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "normal".to_string(),
            description: "Steady 225°F cook, no incidents".to_string(),
            initial_pit_temp: DEFAULT_PIT_TEMP,
            meat1_start: DEFAULT_MEAT_START,
            meat2_start: DEFAULT_MEAT_START,
            target_pit_temp: DEFAULT_TARGET_PIT,
            meat1_target: Some(195.0),
            meat2_target: None,
            stall: StallParams::default(),
            fan_mode: FanMode::default(),
            fan_on_threshold: DEFAULT_FAN_ON_THRESHOLD,
            events: Vec::new(),
        }
    }
}

impl Profile {
    /// Replace missing or invalid numbers with defaults so the model never
    /// sees NaN or a non-positive duration.
    ///
    /// Events with a non-finite offset or setpoint are dropped; negative
    /// offsets fire immediately.
    pub fn sanitized(self) -> Self {
        let events = self
            .events
            .into_iter()
            .filter_map(|event| {
                if !event.at_s.is_finite() {
                    tracing::warn!(profile = %self.name, "dropping event with non-finite offset");
                    return None;
                }
                let kind = match event.kind {
                    EventKind::SetpointChange { sp } if !sp.is_finite() => {
                        tracing::warn!(profile = %self.name, "dropping setpoint event without a value");
                        return None;
                    }
                    EventKind::LidOpen { duration_s } => EventKind::LidOpen {
                        duration_s: positive_or(duration_s, DEFAULT_LID_OPEN_S),
                    },
                    other => other,
                };
                Some(ScheduledEvent {
                    at_s: event.at_s.max(0.0),
                    kind,
                    fired: false,
                })
            })
            .collect();

        Self {
            initial_pit_temp: finite_or(self.initial_pit_temp, DEFAULT_PIT_TEMP),
            meat1_start: finite_or(self.meat1_start, DEFAULT_MEAT_START),
            meat2_start: finite_or(self.meat2_start, DEFAULT_MEAT_START),
            target_pit_temp: positive_or(self.target_pit_temp, DEFAULT_TARGET_PIT),
            meat1_target: self.meat1_target.filter(|t| t.is_finite() && *t > 0.0),
            meat2_target: self.meat2_target.filter(|t| t.is_finite() && *t > 0.0),
            stall: self.stall.sanitized(),
            fan_on_threshold: finite_or(self.fan_on_threshold, DEFAULT_FAN_ON_THRESHOLD)
                .clamp(0.0, 99.0),
            events,
            ..self
        }
    }

    /// Load a profile from a YAML file. Missing fields take defaults.
    pub fn load_yaml(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SimError::ProfileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let profile: Profile =
            serde_yaml::from_str(&content).map_err(|e| SimError::ProfileParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(profile.sanitized())
    }

    pub fn ambient_temp(&self) -> f64 {
        self.initial_pit_temp
    }
}

const HOUR: f64 = 3600.0;

/// The scenarios shipped with the simulator.
pub fn builtin_profiles() -> Vec<Profile> {
    let base = Profile::default();
    vec![
        base.clone(),
        Profile {
            name: "stall".to_string(),
            description: "Brisket with a 4 hour stall between 150 and 170°F".to_string(),
            meat1_target: Some(203.0),
            stall: StallParams {
                enabled: true,
                ..StallParams::default()
            },
            ..base.clone()
        },
        Profile {
            name: "lid-open".to_string(),
            description: "Lid opened at 1h for 2 minutes and at 3h for 1 minute".to_string(),
            events: vec![
                ScheduledEvent::new(HOUR, EventKind::LidOpen { duration_s: 120.0 }),
                ScheduledEvent::new(3.0 * HOUR, EventKind::LidOpen { duration_s: 60.0 }),
            ],
            ..base.clone()
        },
        Profile {
            name: "fire-out".to_string(),
            description: "Fire dies at 2h and the pit cools to ambient".to_string(),
            events: vec![ScheduledEvent::new(2.0 * HOUR, EventKind::FireOut)],
            ..base.clone()
        },
        Profile {
            name: "probe-disconnect".to_string(),
            description: "Meat probe 2 is unplugged at 90 minutes".to_string(),
            meat2_target: Some(165.0),
            events: vec![ScheduledEvent::new(
                1.5 * HOUR,
                EventKind::ProbeDisconnect {
                    probe: Probe::Meat2,
                },
            )],
            ..base.clone()
        },
        Profile {
            name: "setpoint-change".to_string(),
            description: "Starts at 225°F and is bumped to 275°F at 2h".to_string(),
            events: vec![ScheduledEvent::new(
                2.0 * HOUR,
                EventKind::SetpointChange { sp: 275.0 },
            )],
            ..base
        },
    ]
}

pub fn profile_names() -> Vec<String> {
    builtin_profiles().into_iter().map(|p| p.name).collect()
}

/// Look up a built-in profile by name.
pub fn find_profile(name: &str) -> SimResult<Profile> {
    builtin_profiles()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| SimError::UnknownProfile {
            name: name.to_string(),
            available: profile_names(),
        })
}
