//! Server configuration.

use pit_session::EstimateParams;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Slowest accepted speed multiplier.
pub const MIN_SPEED: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Wall-clock time between ticks. Independent of `speed`.
    pub tick_period: Duration,
    /// Simulated seconds per tick at 1x.
    pub sim_seconds_per_tick: f64,
    /// Simulated-time multiplier.
    pub speed: f64,
    /// Save the session every this many readings. Zero disables periodic
    /// saves; the shutdown save still happens.
    pub persist_every: usize,
    pub estimate: EstimateParams,
    pub session_file: PathBuf,
    /// Dashboard assets served at `/` when set.
    pub static_dir: Option<PathBuf>,
    /// Per-subscriber buffer of outbound messages before a slow client
    /// starts skipping.
    pub broadcast_capacity: usize,
    /// Fixed noise seed; random when `None`.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            tick_period: Duration::from_secs(1),
            sim_seconds_per_tick: 5.0,
            speed: 1.0,
            persist_every: 30,
            estimate: EstimateParams::default(),
            session_file: PathBuf::from("session.json"),
            static_dir: None,
            broadcast_capacity: 256,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Set the speed multiplier, floored at [`MIN_SPEED`]. Non-finite values
    /// fall back to 1x.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() {
            speed.max(MIN_SPEED)
        } else {
            1.0
        };
        self
    }

    /// Simulated seconds advanced by each tick.
    pub fn sim_dt(&self) -> f64 {
        self.sim_seconds_per_tick * self.speed
    }
}
