//! Scripted, time-triggered perturbations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lid-open duration used when a profile omits one.
pub const DEFAULT_LID_OPEN_S: f64 = 60.0;

fn default_lid_duration() -> f64 {
    DEFAULT_LID_OPEN_S
}

/// A meat probe channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Probe {
    Meat1,
    Meat2,
}

impl Probe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Probe::Meat1 => "meat1",
            Probe::Meat2 => "meat2",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventKind {
    /// Replace the setpoint, reset the integral and re-arm overshoot.
    SetpointChange { sp: f64 },
    /// Open the lid for `duration_s` simulated seconds.
    LidOpen {
        #[serde(default = "default_lid_duration")]
        duration_s: f64,
    },
    /// Extinguish the fire for the rest of the session.
    FireOut,
    /// Disconnect a probe for the rest of the session.
    ProbeDisconnect { probe: Probe },
}

/// An event pinned to a simulated-time offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Offset from session start in simulated seconds.
    pub at_s: f64,
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(default)]
    pub fired: bool,
}

impl ScheduledEvent {
    pub fn new(at_s: f64, kind: EventKind) -> Self {
        Self {
            at_s,
            kind,
            fired: false,
        }
    }
}

/// Ordered event schedule.
///
/// Events are kept sorted by offset (ties keep their declaration order), so
/// draining due events always yields them in time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ScheduledEvent>", into = "Vec<ScheduledEvent>")]
pub struct EventSchedule {
    events: Vec<ScheduledEvent>,
}

impl From<Vec<ScheduledEvent>> for EventSchedule {
    fn from(mut events: Vec<ScheduledEvent>) -> Self {
        events.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        Self { events }
    }
}

impl From<EventSchedule> for Vec<ScheduledEvent> {
    fn from(schedule: EventSchedule) -> Self {
        schedule.events
    }
}

impl EventSchedule {
    /// Build a fresh schedule with every fired flag cleared.
    pub fn armed(events: &[ScheduledEvent]) -> Self {
        let events = events
            .iter()
            .map(|e| ScheduledEvent { fired: false, ..*e })
            .collect::<Vec<_>>();
        Self::from(events)
    }

    /// Mark every unfired event with `at_s <= now` as fired and return them
    /// in time order.
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let mut due = Vec::new();
        for event in &mut self.events {
            if event.at_s > now {
                break;
            }
            if !event.fired {
                event.fired = true;
                due.push(*event);
            }
        }
        due
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn fired_count(&self) -> usize {
        self.events.iter().filter(|e| e.fired).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> EventSchedule {
        EventSchedule::from(vec![
            ScheduledEvent::new(300.0, EventKind::FireOut),
            ScheduledEvent::new(100.0, EventKind::LidOpen { duration_s: 30.0 }),
            ScheduledEvent::new(
                200.0,
                EventKind::ProbeDisconnect {
                    probe: Probe::Meat2,
                },
            ),
        ])
    }

    #[test]
    fn schedule_is_sorted_by_offset() {
        let offsets: Vec<f64> = schedule().iter().map(|e| e.at_s).collect();
        assert_eq!(offsets, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn take_due_fires_each_event_once_in_order() {
        let mut s = schedule();
        assert!(s.take_due(50.0).is_empty());

        let due = s.take_due(250.0);
        assert_eq!(due.len(), 2);
        assert!(matches!(due[0].kind, EventKind::LidOpen { .. }));
        assert!(matches!(due[1].kind, EventKind::ProbeDisconnect { .. }));

        assert!(s.take_due(250.0).is_empty());
        assert_eq!(s.take_due(1_000.0).len(), 1);
        assert_eq!(s.fired_count(), 3);
    }

    #[test]
    fn event_kinds_use_tagged_representation() {
        let json = serde_json::to_value(ScheduledEvent::new(
            60.0,
            EventKind::SetpointChange { sp: 250.0 },
        ))
        .unwrap();
        assert_eq!(json["type"], "setpoint-change");
        assert_eq!(json["sp"], 250.0);
        assert_eq!(json["at_s"], 60.0);

        let lid: ScheduledEvent =
            serde_json::from_str(r#"{"at_s": 10, "type": "lid-open"}"#).unwrap();
        assert_eq!(
            lid.kind,
            EventKind::LidOpen {
                duration_s: DEFAULT_LID_OPEN_S
            }
        );
        assert!(!lid.fired);
    }

    #[test]
    fn deserialized_schedule_is_sorted() {
        let s: EventSchedule = serde_json::from_str(
            r#"[{"at_s": 20, "type": "fire-out"}, {"at_s": 10, "type": "fire-out", "fired": true}]"#,
        )
        .unwrap();
        let first = s.iter().next().unwrap();
        assert_eq!(first.at_s, 10.0);
        assert!(first.fired);
    }
}
