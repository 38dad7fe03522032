//! The thermal model: one pure state transition per simulated increment.

use crate::events::{EventKind, Probe, ScheduledEvent};
use crate::noise::NoiseSource;
use crate::profile::Profile;
use crate::state::ModelState;
use pit_controls::{split_range, FanMode, PidController};
use pit_core::{approach_factor, format_sim_time};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pit thermal time constant (s).
const PIT_TAU: f64 = 300.0;
/// Pit time constant while the lid is open (s).
const LID_TAU: f64 = 60.0;
/// Lid-open pit temperature settles this far above ambient (°F).
const LID_OFFSET: f64 = 20.0;
/// Pit temperature reached with a fully lit fire and full airflow (°F).
const MAX_FIRE_TEMP: f64 = 400.0;
/// Airflow fraction available with fan and damper shut.
const NATURAL_DRAFT: f64 = 0.15;

const OVERSHOOT_ARM_FRACTION: f64 = 0.95;
const OVERSHOOT_GAIN: f64 = 0.08;
const OVERSHOOT_TAU: f64 = 180.0;
const OVERSHOOT_CUTOFF: f64 = 0.5;

const FIRE_DECAY_RATE: f64 = 0.000003;
const FIRE_OUT_DECAY_RATE: f64 = 0.0005;
const EMBER_FLOOR: f64 = 0.05;
const LOW_FIRE_ENERGY: f64 = 0.1;
const LOW_FIRE_COOLING_TAU: f64 = 600.0;

const MEAT1_TAU: f64 = 1800.0;
const MEAT2_TAU: f64 = MEAT1_TAU * 0.75;
const STALL_FLOOR: f64 = 0.02;

const PIT_NOISE: f64 = 0.8;
const PROBE_NOISE: f64 = 0.3;

/// A simulated fault surfaced alongside each reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    FireOut,
    ProbeDisconnected(Probe),
}

impl Fault {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fault::FireOut => "fire_out",
            Fault::ProbeDisconnected(Probe::Meat1) => "meat1_disconnect",
            Fault::ProbeDisconnected(Probe::Meat2) => "meat2_disconnect",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sampled output of the model.
///
/// Temperatures carry bounded noise and are rounded to 0.1 °F; a
/// disconnected probe reads `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSample {
    pub sim_time_s: f64,
    pub pit: f64,
    pub meat1: Option<f64>,
    pub meat2: Option<f64>,
    pub fan_percent: u8,
    pub damper_percent: u8,
    pub setpoint: f64,
    pub lid_open: bool,
    pub faults: Vec<Fault>,
}

/// Reduced-order smoker model.
///
/// Owns its controller and event schedule. All mutation goes through
/// `&mut self`, so a single owner serializes ticks and commands.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    state: ModelState,
    controller: PidController,
}

impl ThermalModel {
    /// Build a model from a profile with a randomly seeded noise stream.
    pub fn new(profile: &Profile) -> Self {
        Self::with_noise(profile, NoiseSource::from_entropy())
    }

    /// Build a model whose noise stream is fully determined by `seed`.
    pub fn with_seed(profile: &Profile, seed: u64) -> Self {
        Self::with_noise(profile, NoiseSource::from_seed(seed))
    }

    fn with_noise(profile: &Profile, noise: NoiseSource) -> Self {
        Self {
            state: ModelState::from_profile(profile, noise),
            controller: PidController::smoker(),
        }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn sim_time(&self) -> f64 {
        self.state.sim_time_s
    }

    pub fn setpoint(&self) -> f64 {
        self.state.setpoint
    }

    /// Capture every mutable field.
    pub fn serialize(&self) -> ModelState {
        self.state.clone()
    }

    /// Replace the whole state with a snapshot taken by `serialize`.
    pub fn restore(&mut self, snapshot: ModelState) {
        self.state = snapshot;
    }

    /// Return to the profile's initial conditions: clock at zero, every event
    /// re-armed, stall accumulator cleared. The noise stream keeps running.
    pub fn reset(&mut self, profile: &Profile) {
        let noise = self.state.noise.clone();
        self.state = ModelState::from_profile(profile, noise);
    }

    /// Change the setpoint: clears integral action and re-arms the overshoot
    /// bump for the next approach.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        if !setpoint.is_finite() {
            tracing::warn!(setpoint, "ignoring non-finite setpoint");
            return;
        }
        self.state.setpoint = setpoint;
        self.state.has_reached_setpoint = false;
        self.state.pid.reset_integral();
    }

    pub fn set_fan_mode(&mut self, mode: FanMode) {
        self.state.fan_mode = mode;
    }

    /// Advance the model by `dt` simulated seconds.
    ///
    /// A supplied setpoint that differs from the current one is applied as a
    /// setpoint change before anything else. Never fails: a non-finite or
    /// negative `dt` is treated as zero.
    pub fn update(&mut self, dt: f64, setpoint: Option<f64>) -> ModelSample {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        if let Some(sp) = setpoint {
            if sp != self.state.setpoint {
                self.set_setpoint(sp);
            }
        }

        self.state.sim_time_s += dt;

        let lid_opened_now = self.dispatch_events();
        self.advance_lid(dt, lid_opened_now);
        self.update_actuators(dt);
        self.update_fire(dt);
        if self.state.fire_out {
            self.state.fan_percent = 100.0;
            self.state.damper_percent = 100.0;
        }
        self.update_pit(dt);
        self.update_meats(dt);

        self.sample()
    }

    /// Fire every due event in time order. Returns whether a lid opening
    /// started during this increment.
    fn dispatch_events(&mut self) -> bool {
        let now = self.state.sim_time_s;
        let due = self.state.events.take_due(now);
        let mut lid_opened = false;
        for event in due {
            lid_opened |= self.apply_event(&event);
        }
        lid_opened
    }

    fn apply_event(&mut self, event: &ScheduledEvent) -> bool {
        let clock = format_sim_time(self.state.sim_time_s);
        match event.kind {
            EventKind::SetpointChange { sp } => {
                tracing::info!(%clock, sp, "event: setpoint changed");
                self.set_setpoint(sp);
                false
            }
            EventKind::LidOpen { duration_s } => {
                // Time already elapsed since the scheduled opening counts
                // against the duration.
                let late_by = (self.state.sim_time_s - event.at_s).max(0.0);
                tracing::info!(%clock, duration_s, "event: lid opened");
                self.state.lid_open = true;
                self.state.lid_remaining_s = duration_s - late_by;
                self.state.lid_drop_applied = false;
                true
            }
            EventKind::FireOut => {
                tracing::info!(%clock, "event: fire out");
                self.state.fire_out = true;
                false
            }
            EventKind::ProbeDisconnect { probe } => {
                tracing::info!(%clock, %probe, "event: probe disconnected");
                match probe {
                    Probe::Meat1 => self.state.meat1_connected = false,
                    Probe::Meat2 => self.state.meat2_connected = false,
                }
                false
            }
        }
    }

    /// A lid opened during this increment stays open through it; the
    /// countdown starts on the next one. This holds even when one large
    /// increment already covers the whole opening: the lid reports open
    /// for that sample and closes on the following update.
    fn advance_lid(&mut self, dt: f64, opened_now: bool) {
        let s = &mut self.state;
        if !s.lid_open || opened_now {
            return;
        }
        s.lid_remaining_s -= dt;
        if s.lid_remaining_s <= 0.0 {
            s.lid_open = false;
            s.lid_remaining_s = 0.0;
            s.lid_drop_applied = false;
            tracing::info!(clock = %format_sim_time(s.sim_time_s), "lid closed");
        }
    }

    fn update_actuators(&mut self, dt: f64) {
        let s = &mut self.state;
        let (pid, demand) = self.controller.update(&s.pid, s.pit_temp, s.setpoint, dt);
        s.pid = pid;
        let demand = if s.lid_open { 0.0 } else { demand };
        let out = split_range(demand, s.fan_mode, s.fan_on_threshold);
        s.fan_percent = out.fan_percent;
        s.damper_percent = out.damper_percent;
    }

    fn update_fire(&mut self, dt: f64) {
        let s = &mut self.state;
        s.fire_energy = if s.fire_out {
            (s.fire_energy - FIRE_OUT_DECAY_RATE * dt).max(0.0)
        } else {
            (s.fire_energy - FIRE_DECAY_RATE * dt).max(EMBER_FLOOR)
        };
    }

    fn update_pit(&mut self, dt: f64) {
        let s = &mut self.state;

        if s.lid_open {
            if !s.lid_drop_applied {
                s.pre_lid_pit_temp = s.pit_temp;
                s.lid_drop_applied = true;
            }
            let target = s.ambient_temp + LID_OFFSET;
            s.pit_temp += (target - s.pit_temp) * approach_factor(dt, LID_TAU);
            return;
        }

        let airflow = (s.fan_percent / 100.0) * (s.damper_percent / 100.0);
        let effective_airflow = NATURAL_DRAFT + (1.0 - NATURAL_DRAFT) * airflow;
        let heat = s.fire_energy * effective_airflow;
        let target = s.ambient_temp + (MAX_FIRE_TEMP - s.ambient_temp) * heat;
        s.pit_temp += (target - s.pit_temp) * approach_factor(dt, PIT_TAU);

        if !s.has_reached_setpoint && s.pit_temp >= s.setpoint * OVERSHOOT_ARM_FRACTION {
            s.has_reached_setpoint = true;
            s.overshoot_remaining = ((s.setpoint - s.ambient_temp) * OVERSHOOT_GAIN).max(0.0);
        }
        if s.overshoot_remaining > 0.0 {
            let applied = s.overshoot_remaining * approach_factor(dt, OVERSHOOT_TAU);
            s.pit_temp += applied;
            s.overshoot_remaining -= applied;
            if s.overshoot_remaining < OVERSHOOT_CUTOFF {
                s.overshoot_remaining = 0.0;
            }
        }

        if s.fire_energy < LOW_FIRE_ENERGY {
            s.pit_temp += (s.ambient_temp - s.pit_temp) * approach_factor(dt, LOW_FIRE_COOLING_TAU);
        }
    }

    fn update_meats(&mut self, dt: f64) {
        let s = &mut self.state;

        if s.meat1_connected {
            let mut alpha = approach_factor(dt, MEAT1_TAU);
            let mut ceiling = None;

            if s.stall.enabled {
                let duration = s.stall.duration_s();
                if s.meat1_temp >= s.stall.temp_low && s.stall_time_accumulated_s < duration {
                    if !s.in_stall {
                        tracing::debug!(clock = %format_sim_time(s.sim_time_s), "probe 1 entered stall");
                    }
                    s.in_stall = true;
                    s.stall_time_accumulated_s += dt;
                    let progress = (s.stall_time_accumulated_s / duration).min(1.0);
                    alpha *= STALL_FLOOR + (1.0 - STALL_FLOOR) * progress.powi(3);
                    if progress < 0.5 {
                        ceiling = Some(s.stall.temp_high);
                    }
                } else if s.stall_time_accumulated_s >= duration {
                    s.in_stall = false;
                }
            }

            s.meat1_temp += (s.pit_temp - s.meat1_temp) * alpha;
            if let Some(high) = ceiling {
                s.meat1_temp = s.meat1_temp.min(high);
            }
        }

        if s.meat2_connected {
            s.meat2_temp += (s.pit_temp - s.meat2_temp) * approach_factor(dt, MEAT2_TAU);
        }
    }

    fn sample(&mut self) -> ModelSample {
        let s = &mut self.state;

        let pit = s.noise.apply(s.pit_temp, PIT_NOISE);
        let meat1 = if s.meat1_connected {
            Some(s.noise.apply(s.meat1_temp, PROBE_NOISE))
        } else {
            None
        };
        let meat2 = if s.meat2_connected {
            Some(s.noise.apply(s.meat2_temp, PROBE_NOISE))
        } else {
            None
        };

        let mut faults = Vec::new();
        if s.fire_out {
            faults.push(Fault::FireOut);
        }
        if !s.meat1_connected {
            faults.push(Fault::ProbeDisconnected(Probe::Meat1));
        }
        if !s.meat2_connected {
            faults.push(Fault::ProbeDisconnected(Probe::Meat2));
        }

        ModelSample {
            sim_time_s: s.sim_time_s,
            pit,
            meat1,
            meat2,
            fan_percent: s.fan_percent.round().clamp(0.0, 100.0) as u8,
            damper_percent: s.damper_percent.round().clamp(0.0, 100.0) as u8,
            setpoint: s.setpoint,
            lid_open: s.lid_open,
            faults,
        }
    }
}
