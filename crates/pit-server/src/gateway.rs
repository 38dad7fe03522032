//! Applies inbound client commands to the engine.

use crate::broadcast::Broadcaster;
use crate::engine::SharedEngine;
use crate::error::ServerResult;
use crate::persist::PersistHandle;
use crate::protocol::{ClientCommand, ServerMessage, SessionCommand, SessionMessage};
use pit_controls::FanMode;
use pit_session::{unix_now, AlarmTargets};
use std::sync::Arc;

/// Single entry point for client commands.
///
/// Each command takes the engine lock for its whole effect, so it applies
/// atomically and in order with ticks. Bad input is logged and ignored.
#[derive(Clone)]
pub struct ProtocolGateway {
    engine: SharedEngine,
    broadcaster: Broadcaster,
    persister: PersistHandle,
}

impl ProtocolGateway {
    pub fn new(engine: SharedEngine, broadcaster: Broadcaster, persister: PersistHandle) -> Self {
        Self {
            engine,
            broadcaster,
            persister,
        }
    }

    /// Handle one text frame. Returns a reply meant only for the sender.
    pub async fn handle_text(&self, text: &str) -> Option<Arc<str>> {
        let command = match ClientCommand::parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, raw = %text, "ignoring malformed client message");
                return None;
            }
        };
        match self.apply(command).await {
            Ok(reply) => reply.and_then(|msg| msg.encode()),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring rejected client command");
                None
            }
        }
    }

    /// Apply a parsed command.
    pub async fn apply(&self, command: ClientCommand) -> ServerResult<Option<ServerMessage>> {
        let mut engine = self.engine.lock().await;
        match command {
            ClientCommand::Set { sp } => {
                engine.set_setpoint(sp)?;
                tracing::info!(sp, "client set setpoint");
                Ok(None)
            }
            ClientCommand::Alarm {
                meat1_target,
                meat2_target,
            } => {
                engine.set_alarm_targets(AlarmTargets {
                    meat1_target,
                    meat2_target,
                });
                tracing::info!(?meat1_target, ?meat2_target, "client set alarm targets");
                Ok(None)
            }
            ClientCommand::Config { fan_mode } => {
                let mode: FanMode = fan_mode.parse()?;
                engine.set_fan_mode(mode);
                tracing::info!(%mode, "client set fan mode");
                Ok(None)
            }
            ClientCommand::Session(SessionCommand::New) => {
                let sp = engine.new_session(unix_now());
                self.persister.delete();
                tracing::info!("client started a new session");
                if let Some(msg) = ServerMessage::Session(SessionMessage::Reset { sp }).encode() {
                    self.broadcaster.publish(msg);
                }
                Ok(None)
            }
            ClientCommand::Session(SessionCommand::Download { format }) => {
                let data = engine.export(&format)?;
                tracing::info!(readings = engine.session().len(), "sending session export");
                Ok(Some(ServerMessage::Session(SessionMessage::Download {
                    format,
                    data,
                })))
            }
        }
    }
}
