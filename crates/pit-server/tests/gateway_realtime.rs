use pit_controls::FanMode;
use pit_server::*;
use pit_session::{SessionSnapshot, SessionStore};
use pit_sim::{find_profile, ThermalModel};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;

struct Harness {
    engine: SharedEngine,
    broadcaster: Broadcaster,
    persister: PersistHandle,
    gateway: ProtocolGateway,
    store: SessionStore,
    _dir: tempfile::TempDir,
}

fn harness(profile: &str, persist_every: usize) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let profile = find_profile(profile).unwrap();
    let model = ThermalModel::with_seed(&profile, 42);
    let engine = Engine::new(profile, model, 1_700_000_000)
        .with_persist_every(persist_every)
        .into_shared();
    let broadcaster = Broadcaster::new(64);
    let (persister, _task) = Persister::new(store.clone()).spawn();
    let gateway = ProtocolGateway::new(engine.clone(), broadcaster.clone(), persister.clone());
    Harness {
        engine,
        broadcaster,
        persister,
        gateway,
        store,
        _dir: dir,
    }
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn set_alarm_and_config_commands_apply() {
    let h = harness("normal", 0);

    assert!(h.gateway.handle_text(r#"{"type":"set","sp":250}"#).await.is_none());
    assert!(h
        .gateway
        .handle_text(r#"{"type":"alarm","meat2Target":160}"#)
        .await
        .is_none());
    assert!(h
        .gateway
        .handle_text(r#"{"type":"config","fanMode":"fan_and_damper"}"#)
        .await
        .is_none());

    let mut engine = h.engine.lock().await;
    assert_eq!(engine.setpoint(), 250.0);
    let targets = engine.session().alarm_targets();
    assert_eq!(targets.meat1_target, None);
    assert_eq!(targets.meat2_target, Some(160.0));
    assert_eq!(engine.model().state().fan_mode, FanMode::FanAndDamper);

    let data = engine.tick(5.0).data;
    assert_eq!(data.sp, 250.0);
    assert_eq!(data.fan_mode, FanMode::FanAndDamper);
}

#[tokio::test]
async fn malformed_and_rejected_commands_change_nothing() {
    let h = harness("normal", 0);
    for raw in [
        "{{{",
        r#"{"type":"launch"}"#,
        r#"{"type":"set"}"#,
        r#"{"type":"set","sp":9000}"#,
        r#"{"type":"config","fanMode":"turbo"}"#,
        r#"{"type":"session","action":"download","format":"pdf"}"#,
    ] {
        assert!(h.gateway.handle_text(raw).await.is_none(), "reply to {raw}");
    }

    let engine = h.engine.lock().await;
    assert_eq!(engine.setpoint(), 225.0);
    assert_eq!(engine.model().state().fan_mode, FanMode::Coupled);
    assert_eq!(engine.session().alarm_targets().meat1_target, Some(195.0));
}

#[tokio::test]
async fn download_replies_with_csv() {
    let h = harness("probe-disconnect", 0);
    {
        let mut engine = h.engine.lock().await;
        for _ in 0..(5400 / 5 + 2) {
            engine.tick(5.0);
        }
    }
    let mut updates = h.broadcaster.subscribe();

    let reply = h
        .gateway
        .handle_text(r#"{"type":"session","action":"download","format":"csv"}"#)
        .await
        .expect("download reply");
    let reply = parse(&reply);
    assert_eq!(reply["type"], "session");
    assert_eq!(reply["action"], "download");
    assert_eq!(reply["format"], "csv");

    let csv = reply["data"].as_str().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "timestamp,pit,meat1,meat2,fan,damper,setpoint,lid");
    assert_eq!(lines.len(), 5400 / 5 + 3);
    let last: Vec<&str> = lines[lines.len() - 1].split(',').collect();
    assert_eq!(last[3], "");
    assert!(!last[2].is_empty());

    // The export goes only to the requester.
    assert!(updates.try_recv().is_err());
}

#[tokio::test]
async fn new_session_resets_broadcasts_and_deletes_snapshot() {
    let h = harness("setpoint-change", 0);
    {
        let mut engine = h.engine.lock().await;
        for _ in 0..(3 * 3600 / 5) {
            engine.tick(5.0);
        }
        assert_eq!(engine.setpoint(), 275.0);
        h.persister.save(engine.snapshot());
    }
    h.persister.flush().await;
    assert!(h.store.path().exists());

    let mut updates = h.broadcaster.subscribe();
    assert!(h
        .gateway
        .handle_text(r#"{"type":"session","action":"new"}"#)
        .await
        .is_none());

    let reset = parse(&updates.recv().await.unwrap());
    assert_eq!(reset["type"], "session");
    assert_eq!(reset["action"], "reset");
    assert_eq!(reset["sp"], 225.0);

    h.persister.flush().await;
    assert!(!h.store.path().exists());

    let engine = h.engine.lock().await;
    assert!(engine.session().is_empty());
    assert!(engine.history().is_none());
    assert_eq!(engine.model().sim_time(), 0.0);
    assert_eq!(engine.model().state().events.fired_count(), 0);
    assert_eq!(engine.setpoint(), 225.0);
}

#[tokio::test(start_paused = true)]
async fn speed_scales_simulated_time_not_tick_rate() {
    for speed in [1.0, 10.0] {
        let config = ServerConfig::default().with_speed(speed);
        let h = harness("normal", 0);
        let mut updates = h.broadcaster.subscribe();
        let (stop_tx, stop_rx) = watch::channel(false);

        let sim = RealtimeLoop::new(
            h.engine.clone(),
            h.broadcaster.clone(),
            h.persister.clone(),
            config.tick_period,
            config.sim_dt(),
        );
        let task = tokio::spawn(sim.run(stop_rx));
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        let engine = h.engine.lock().await;
        assert_eq!(engine.session().len(), 5, "ticks at speed {speed}");
        assert_eq!(engine.model().sim_time(), 5.0 * 5.0 * speed);

        let mut received = 0;
        while let Ok(msg) = updates.try_recv() {
            assert_eq!(parse(&msg)["type"], "data");
            received += 1;
        }
        assert_eq!(received, 5);
    }
}

// Periodic saves count readings, so at higher speed each save covers more
// simulated time.
#[tokio::test(start_paused = true)]
async fn persist_interval_counts_readings_regardless_of_speed() {
    for speed in [1.0, 10.0] {
        let config = ServerConfig::default().with_speed(speed);
        let h = harness("normal", 3);
        let sim = RealtimeLoop::new(
            h.engine.clone(),
            h.broadcaster.clone(),
            h.persister.clone(),
            config.tick_period,
            config.sim_dt(),
        );

        for _ in 0..7 {
            sim.tick_once().await;
        }
        h.persister.flush().await;

        let saved: SessionSnapshot = h.store.try_load().unwrap().unwrap();
        assert_eq!(saved.readings.len(), 6);
        let sim_time = saved.model_state.unwrap().sim_time_s;
        assert_eq!(sim_time, 6.0 * config.sim_dt());
    }
}

#[tokio::test]
async fn subscribers_after_tick_see_it_in_history_only() {
    let h = harness("normal", 0);
    let sim = RealtimeLoop::new(
        h.engine.clone(),
        h.broadcaster.clone(),
        h.persister.clone(),
        Duration::from_secs(1),
        5.0,
    );
    sim.tick_once().await;

    let (mut updates, history) = {
        let engine = h.engine.lock().await;
        (h.broadcaster.subscribe(), engine.history())
    };
    assert_eq!(history.unwrap().data.len(), 1);
    assert!(updates.try_recv().is_err());

    sim.tick_once().await;
    let live = parse(&updates.recv().await.unwrap());
    assert_eq!(live["ts"], 1_700_000_010);
}
