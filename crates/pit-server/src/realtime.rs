//! Wall-clock paced tick loop.

use crate::broadcast::Broadcaster;
use crate::engine::SharedEngine;
use crate::persist::PersistHandle;
use crate::protocol::ServerMessage;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Drives the engine at a fixed period.
///
/// The speed multiplier only changes `sim_dt`; the tick period stays the
/// same, so faster runs produce more simulated time per message rather than
/// more messages.
pub struct RealtimeLoop {
    engine: SharedEngine,
    broadcaster: Broadcaster,
    persister: PersistHandle,
    tick_period: Duration,
    sim_dt: f64,
}

impl RealtimeLoop {
    pub fn new(
        engine: SharedEngine,
        broadcaster: Broadcaster,
        persister: PersistHandle,
        tick_period: Duration,
        sim_dt: f64,
    ) -> Self {
        Self {
            engine,
            broadcaster,
            persister,
            tick_period,
            sim_dt,
        }
    }

    /// Tick until `shutdown` turns true or its sender goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.tick_period,
            self.tick_period,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(
            period_ms = self.tick_period.as_millis() as u64,
            sim_dt = self.sim_dt,
            "simulation loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick_once().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("simulation loop stopped");
    }

    /// Run exactly one tick: advance, record, maybe persist, broadcast.
    pub async fn tick_once(&self) {
        let mut engine = self.engine.lock().await;
        let outcome = engine.tick(self.sim_dt);
        if outcome.persist {
            self.persister.save(engine.snapshot());
        }
        // Published under the lock so a connection that subscribes while
        // holding it sees each reading either in history or live, never both.
        if let Some(msg) = ServerMessage::Data(outcome.data).encode() {
            self.broadcaster.publish(msg);
        }
    }
}
