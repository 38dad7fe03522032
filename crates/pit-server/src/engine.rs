//! The single owner of model and session state.

use crate::error::{ServerError, ServerResult};
use crate::protocol::{DataMessage, HistoryMessage};
use pit_controls::FanMode;
use pit_core::ensure_in_range;
use pit_session::{AlarmTargets, EstimateParams, Reading, Session, SessionSnapshot};
use pit_sim::{Profile, ThermalModel};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Accepted setpoint range (°F).
pub const SETPOINT_MIN: f64 = 32.0;
pub const SETPOINT_MAX: f64 = 700.0;

/// Engine shared between the tick loop, the gateway and connections. The
/// tokio mutex is FIFO-fair, so ticks and commands apply in arrival order.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub data: DataMessage,
    /// The reading count reached a multiple of the persist interval.
    pub persist: bool,
}

/// Thermal model plus the session it records into.
///
/// All methods take `&mut self`; callers serialize access through
/// [`SharedEngine`].
#[derive(Debug)]
pub struct Engine {
    profile: Profile,
    model: ThermalModel,
    session: Session,
    persist_every: usize,
    estimate: EstimateParams,
}

impl Engine {
    pub fn new(profile: Profile, model: ThermalModel, start_ts: i64) -> Self {
        let profile = profile.sanitized();
        let session = Session::new(start_ts, AlarmTargets::from_profile(&profile));
        Self {
            profile,
            model,
            session,
            persist_every: 30,
            estimate: EstimateParams::default(),
        }
    }

    pub fn with_persist_every(mut self, readings: usize) -> Self {
        self.persist_every = readings;
        self
    }

    pub fn with_estimate(mut self, params: EstimateParams) -> Self {
        self.estimate = params;
        self
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn model(&self) -> &ThermalModel {
        &self.model
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn setpoint(&self) -> f64 {
        self.model.setpoint()
    }

    /// Resume from a saved snapshot. Fields missing from the snapshot keep
    /// their current values.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.session = Session::from_snapshot(&snapshot, &self.session);
        match snapshot.model_state {
            Some(state) => self.model.restore(state),
            None => {
                if let Some(sp) = snapshot.current_setpoint {
                    self.model.set_setpoint(sp);
                }
            }
        }
    }

    /// Advance the model by `dt` simulated seconds and record the reading.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        let sample = self.model.update(dt, None);
        let reading = Reading::from_sample(&sample, self.session.start_ts());
        self.session.push(reading.clone());

        let persist = self.persist_every > 0 && self.session.len() % self.persist_every == 0;
        let targets = self.session.alarm_targets();
        let data = DataMessage {
            ts: reading.ts,
            pit: reading.pit,
            meat1: reading.meat1,
            meat2: reading.meat2,
            fan: reading.fan,
            damper: reading.damper,
            sp: reading.sp,
            lid: reading.lid,
            est: self.session.estimate_done(&self.estimate),
            errors: sample.faults.iter().map(|f| f.as_str().to_string()).collect(),
            meat1_target: targets.meat1_target,
            meat2_target: targets.meat2_target,
            fan_mode: self.model.state().fan_mode,
        };
        TickOutcome { data, persist }
    }

    pub fn set_setpoint(&mut self, sp: f64) -> ServerResult<()> {
        let sp = ensure_in_range(sp, SETPOINT_MIN, SETPOINT_MAX, "setpoint")?;
        self.model.set_setpoint(sp);
        Ok(())
    }

    pub fn set_alarm_targets(&mut self, targets: AlarmTargets) {
        *self.session.alarm_targets_mut() = targets;
    }

    pub fn set_fan_mode(&mut self, mode: FanMode) {
        self.model.set_fan_mode(mode);
    }

    /// Reset the model to the profile and drop every reading. Returns the
    /// restored setpoint.
    pub fn new_session(&mut self, start_ts: i64) -> f64 {
        self.model.reset(&self.profile);
        self.session.clear(start_ts);
        self.model.setpoint()
    }

    pub fn export(&self, format: &str) -> ServerResult<String> {
        match format {
            "csv" => Ok(self.session.to_csv()),
            other => Err(ServerError::UnsupportedFormat(other.to_string())),
        }
    }

    /// History for a newly connected client; `None` for an empty session.
    pub fn history(&self) -> Option<HistoryMessage> {
        if self.session.is_empty() {
            return None;
        }
        let targets = self.session.alarm_targets();
        Some(HistoryMessage {
            data: self.session.readings().to_vec(),
            sp: self.model.setpoint(),
            meat1_target: targets.meat1_target,
            meat2_target: targets.meat2_target,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(self.model.setpoint(), self.model.serialize())
    }
}
