//! In-memory cook session.

use crate::csv::to_csv;
use crate::estimate::{estimate_done, EstimateParams};
use crate::types::{AlarmTargets, Reading, SessionSnapshot};
use pit_sim::ModelState;

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Append-only reading history plus the clock and alarm targets it was
/// recorded against.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    readings: Vec<Reading>,
    start_ts: i64,
    alarm_targets: AlarmTargets,
}

impl Session {
    pub fn new(start_ts: i64, alarm_targets: AlarmTargets) -> Self {
        Self {
            readings: Vec::new(),
            start_ts,
            alarm_targets,
        }
    }

    /// Rebuild a session from a snapshot. Fields absent from the snapshot
    /// keep the values of `fallback`.
    pub fn from_snapshot(snapshot: &SessionSnapshot, fallback: &Session) -> Self {
        Self {
            readings: snapshot.readings.clone(),
            start_ts: snapshot.session_start_ts.unwrap_or(fallback.start_ts),
            alarm_targets: snapshot.alarm_targets.unwrap_or(fallback.alarm_targets),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn start_ts(&self) -> i64 {
        self.start_ts
    }

    pub fn alarm_targets(&self) -> AlarmTargets {
        self.alarm_targets
    }

    pub fn alarm_targets_mut(&mut self) -> &mut AlarmTargets {
        &mut self.alarm_targets
    }

    /// Drop every reading and restart the session clock. Alarm targets are
    /// kept.
    pub fn clear(&mut self, start_ts: i64) {
        self.readings.clear();
        self.start_ts = start_ts;
    }

    /// Estimated unix time at which probe 1 reaches its alarm target.
    pub fn estimate_done(&self, params: &EstimateParams) -> Option<i64> {
        estimate_done(&self.readings, self.alarm_targets.meat1_target, params)
    }

    pub fn to_csv(&self) -> String {
        to_csv(&self.readings)
    }

    pub fn snapshot(&self, setpoint: f64, model_state: ModelState) -> SessionSnapshot {
        SessionSnapshot {
            readings: self.readings.clone(),
            session_start_ts: Some(self.start_ts),
            current_setpoint: Some(setpoint),
            alarm_targets: Some(self.alarm_targets),
            model_state: Some(model_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: i64) -> Reading {
        Reading {
            ts,
            pit: 225.0,
            meat1: Some(100.0),
            ..Reading::default()
        }
    }

    #[test]
    fn clear_keeps_alarm_targets() {
        let targets = AlarmTargets {
            meat1_target: Some(195.0),
            meat2_target: None,
        };
        let mut session = Session::new(1_000, targets);
        session.push(reading(1_005));
        session.push(reading(1_010));
        assert_eq!(session.len(), 2);

        session.clear(2_000);
        assert!(session.is_empty());
        assert_eq!(session.start_ts(), 2_000);
        assert_eq!(session.alarm_targets(), targets);
    }

    #[test]
    fn snapshot_fields_fall_back_when_missing() {
        let fallback = Session::new(
            500,
            AlarmTargets {
                meat1_target: Some(203.0),
                meat2_target: None,
            },
        );
        let snapshot = SessionSnapshot {
            readings: vec![reading(600)],
            ..SessionSnapshot::default()
        };
        let session = Session::from_snapshot(&snapshot, &fallback);
        assert_eq!(session.len(), 1);
        assert_eq!(session.start_ts(), 500);
        assert_eq!(session.alarm_targets().meat1_target, Some(203.0));
    }
}
