//! HTTP/WebSocket server wiring and lifecycle.

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::engine::{Engine, SharedEngine};
use crate::error::{ServerError, ServerResult};
use crate::gateway::ProtocolGateway;
use crate::persist::Persister;
use crate::realtime::RealtimeLoop;
use crate::ws::ws_handler;
use axum::routing::get;
use axum::Router;
use pit_session::{unix_now, SessionStore};
use pit_sim::{Profile, ThermalModel};
use std::future::Future;
use std::path::Path;
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// State handed to every connection.
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub broadcaster: Broadcaster,
    pub gateway: ProtocolGateway,
    /// Flips to `true` when the server is shutting down.
    pub shutdown: watch::Receiver<bool>,
}

/// `/ws` plus, when given, static dashboard files for every other path.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new().route("/ws", get(ws_handler));
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Run the simulator until `shutdown_signal` resolves, then stop the tick
/// loop and write a final snapshot.
pub async fn run<F>(config: ServerConfig, profile: Profile, shutdown_signal: F) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = SessionStore::new(config.session_file.clone());
    let model = match config.seed {
        Some(seed) => ThermalModel::with_seed(&profile, seed),
        None => ThermalModel::new(&profile),
    };
    let profile_name = profile.name.clone();
    let mut engine = Engine::new(profile, model, unix_now())
        .with_persist_every(config.persist_every)
        .with_estimate(config.estimate);
    if let Some(snapshot) = store.restore() {
        engine.restore(snapshot);
    }
    let engine = engine.into_shared();

    let broadcaster = Broadcaster::new(config.broadcast_capacity);
    let (persister, persist_task) = Persister::new(store).spawn();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let gateway = ProtocolGateway::new(engine.clone(), broadcaster.clone(), persister.clone());
    let state = AppState {
        engine: engine.clone(),
        broadcaster: broadcaster.clone(),
        gateway,
        shutdown: shutdown_rx.clone(),
    };
    let app = build_router(state, config.static_dir.as_deref());

    let addr = config.listen_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(
        %addr,
        profile = %profile_name,
        speed = config.speed,
        sim_dt = config.sim_dt(),
        static_dir = ?config.static_dir,
        "simulator listening"
    );

    let sim = RealtimeLoop::new(
        engine.clone(),
        broadcaster,
        persister.clone(),
        config.tick_period,
        config.sim_dt(),
    );
    let sim_task = tokio::spawn(sim.run(shutdown_rx));

    let signal_tx = shutdown_tx.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal.await;
            tracing::info!("shutting down");
            let _ = signal_tx.send(true);
        })
        .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sim_task.await {
        tracing::error!(error = %e, "simulation loop panicked");
    }

    let snapshot = engine.lock().await.snapshot();
    persister.save(snapshot);
    persister.shutdown();
    if let Err(e) = persist_task.await {
        tracing::error!(error = %e, "persister panicked");
    }
    tracing::info!("final session snapshot written");

    served.map_err(ServerError::Serve)
}
