//! JSON wire protocol shared with the dashboard and the firmware.
//!
//! Every message is an object with a `type` key; session messages add an
//! `action` key. Temperatures are always °F.

use pit_controls::FanMode;
use pit_session::Reading;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Server → client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Data(DataMessage),
    History(HistoryMessage),
    Session(SessionMessage),
}

/// One tick's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub ts: i64,
    pub pit: f64,
    pub meat1: Option<f64>,
    pub meat2: Option<f64>,
    pub fan: u8,
    pub damper: u8,
    pub sp: f64,
    pub lid: bool,
    /// Estimated unix time probe 1 reaches its target.
    pub est: Option<i64>,
    pub errors: Vec<String>,
    pub meat1_target: Option<f64>,
    pub meat2_target: Option<f64>,
    pub fan_mode: FanMode,
}

/// Full session history, sent once to each new connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub data: Vec<Reading>,
    pub sp: f64,
    pub meat1_target: Option<f64>,
    pub meat2_target: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SessionMessage {
    /// Broadcast after a new session starts.
    Reset { sp: f64 },
    /// Export reply, sent only to the requester.
    Download { format: String, data: String },
}

impl ServerMessage {
    /// Serialize once for fan-out to every subscriber.
    pub fn encode(&self) -> Option<Arc<str>> {
        match serde_json::to_string(self) {
            Ok(text) => Some(text.into()),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server message");
                None
            }
        }
    }
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientCommand {
    Set {
        sp: f64,
    },
    /// Replaces both targets; an absent or null target clears it.
    Alarm {
        #[serde(default, rename = "meat1Target")]
        meat1_target: Option<f64>,
        #[serde(default, rename = "meat2Target")]
        meat2_target: Option<f64>,
    },
    Config {
        #[serde(rename = "fanMode")]
        fan_mode: String,
    },
    Session(SessionCommand),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SessionCommand {
    New,
    Download {
        #[serde(default = "default_format")]
        format: String,
    },
}

fn default_format() -> String {
    "csv".to_string()
}

impl ClientCommand {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_value(msg: &ServerMessage) -> Value {
        serde_json::from_str(&msg.encode().unwrap()).unwrap()
    }

    #[test]
    fn data_message_shape() {
        let msg = ServerMessage::Data(DataMessage {
            ts: 1_700_000_005,
            pit: 224.7,
            meat1: Some(151.3),
            meat2: None,
            fan: 35,
            damper: 35,
            sp: 225.0,
            lid: false,
            est: None,
            errors: vec!["meat2_disconnect".to_string()],
            meat1_target: Some(195.0),
            meat2_target: None,
            fan_mode: FanMode::Coupled,
        });
        assert_eq!(
            to_value(&msg),
            json!({
                "type": "data",
                "ts": 1_700_000_005,
                "pit": 224.7,
                "meat1": 151.3,
                "meat2": null,
                "fan": 35,
                "damper": 35,
                "sp": 225.0,
                "lid": false,
                "est": null,
                "errors": ["meat2_disconnect"],
                "meat1Target": 195.0,
                "meat2Target": null,
                "fanMode": "coupled"
            })
        );
    }

    #[test]
    fn session_messages_carry_action() {
        let reset = ServerMessage::Session(SessionMessage::Reset { sp: 225.0 });
        assert_eq!(
            to_value(&reset),
            json!({"type": "session", "action": "reset", "sp": 225.0})
        );

        let download = ServerMessage::Session(SessionMessage::Download {
            format: "csv".to_string(),
            data: "timestamp,pit".to_string(),
        });
        assert_eq!(
            to_value(&download),
            json!({"type": "session", "action": "download", "format": "csv", "data": "timestamp,pit"})
        );
    }

    #[test]
    fn history_message_shape() {
        let msg = ServerMessage::History(HistoryMessage {
            data: vec![Reading {
                ts: 10,
                pit: 100.0,
                meat1: None,
                meat2: Some(50.0),
                fan: 1,
                damper: 2,
                sp: 225.0,
                lid: true,
            }],
            sp: 225.0,
            meat1_target: None,
            meat2_target: Some(165.0),
        });
        let value = to_value(&msg);
        assert_eq!(value["type"], "history");
        assert_eq!(value["data"][0]["meat1"], Value::Null);
        assert_eq!(value["data"][0]["lid"], true);
        assert_eq!(value["meat2Target"], 165.0);
    }

    #[test]
    fn parses_client_commands() {
        assert_eq!(
            ClientCommand::parse(r#"{"type":"set","sp":250}"#).unwrap(),
            ClientCommand::Set { sp: 250.0 }
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"alarm","meat1Target":195}"#).unwrap(),
            ClientCommand::Alarm {
                meat1_target: Some(195.0),
                meat2_target: None,
            }
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"alarm","meat1Target":null,"meat2Target":160}"#)
                .unwrap(),
            ClientCommand::Alarm {
                meat1_target: None,
                meat2_target: Some(160.0),
            }
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"session","action":"new"}"#).unwrap(),
            ClientCommand::Session(SessionCommand::New)
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"session","action":"download"}"#).unwrap(),
            ClientCommand::Session(SessionCommand::Download {
                format: "csv".to_string()
            })
        );
        assert_eq!(
            ClientCommand::parse(r#"{"type":"config","fanMode":"fan_only"}"#).unwrap(),
            ClientCommand::Config {
                fan_mode: "fan_only".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(ClientCommand::parse("not json").is_err());
        assert!(ClientCommand::parse(r#"{"type":"reboot"}"#).is_err());
        assert!(ClientCommand::parse(r#"{"type":"set"}"#).is_err());
        assert!(ClientCommand::parse(r#"{"type":"set","sp":"hot"}"#).is_err());
        assert!(ClientCommand::parse(r#"{"type":"session","action":"explode"}"#).is_err());
        assert!(ClientCommand::parse(r#"{"sp":250}"#).is_err());
    }
}
