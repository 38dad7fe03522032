//! Real-time session server for the smoker simulator.
//!
//! One [`Engine`] owns the thermal model and the session. It sits behind an
//! async mutex shared by:
//!
//! - the [`RealtimeLoop`], which ticks the model on a fixed wall-clock
//!   period and fans each reading out through the [`Broadcaster`]
//! - the [`ProtocolGateway`], which applies client commands one at a time
//! - WebSocket connections, which only read history on connect
//!
//! Snapshot writes go through a background [`Persister`] so disk latency
//! never stalls a tick.

pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod persist;
pub mod protocol;
pub mod realtime;
pub mod server;
pub mod ws;

pub use broadcast::Broadcaster;
pub use config::ServerConfig;
pub use engine::{Engine, SharedEngine, TickOutcome};
pub use error::{ServerError, ServerResult};
pub use gateway::ProtocolGateway;
pub use persist::{PersistHandle, Persister};
pub use protocol::{ClientCommand, DataMessage, HistoryMessage, ServerMessage, SessionMessage};
pub use realtime::RealtimeLoop;
pub use server::{build_router, run, AppState};
