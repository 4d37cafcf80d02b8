use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use techcity_telemetry::config::StoreBackend;
use techcity_telemetry::store::MemoryStore;
use techcity_telemetry::{routes, Config, Simulator, SimulatorOptions};

#[derive(Debug, Deserialize)]
struct Status {
    is_running: bool,
    active_timer_count: usize,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    outcome: String,
    status: Status,
}

#[derive(Debug, Deserialize)]
struct StopResponse {
    stopped: bool,
    status: Status,
}

#[derive(Debug, Deserialize)]
struct BackfillReport {
    sensors: usize,
    points_written: u64,
    failed_sensors: Vec<i32>,
}

fn test_config() -> Config {
    // ---
    Config {
        store_backend: StoreBackend::Memory,
        db_url: None,
        db_pool_max: 1,
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        interval_secs: 1,
        autostart: false,
        stagger_ms: 0,
        heartbeat_secs: 300,
        backfill_pause_every: 0,
        backfill_pause_ms: 0,
    }
}

/// Serve the control routes over a memory store on an ephemeral port.
async fn spawn_app() -> Result<String> {
    // ---
    let cfg = test_config();
    let options = SimulatorOptions {
        stagger: Duration::ZERO,
        ..cfg.simulator_options()
    };
    let simulator = Arc::new(Simulator::new(Arc::new(MemoryStore::new()), options));
    let app = routes::router(simulator, cfg.clone());

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn health_reports_simulator_state() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let body: Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["simulator_running"], false);
    Ok(())
}

#[tokio::test]
async fn control_lifecycle_over_http() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    // Nothing registered yet: start is refused without flipping to running
    let resp: StartResponse = client
        .post(format!("{}/simulator/start", base))
        .json(&json!({}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp.outcome, "no_active_sensors");
    assert!(!resp.status.is_running);

    let seeded: Value = client
        .post(format!("{}/simulator/seed", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(seeded["inserted"], 6);

    let zero = client
        .post(format!("{}/simulator/start", base))
        .json(&json!({ "interval_seconds": 0 }))
        .send()
        .await?;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let resp: StartResponse = client
        .post(format!("{}/simulator/start", base))
        .json(&json!({ "interval_seconds": 1 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp.outcome, "started");
    assert_eq!(resp.status.active_timer_count, 7);

    let again: StartResponse = client
        .post(format!("{}/simulator/start", base))
        .json(&json!({ "interval_seconds": 1 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(again.outcome, "already_running");
    assert_eq!(again.status.active_timer_count, 7);

    let status: Status = client
        .get(format!("{}/simulator/status", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(status.is_running);

    let stop: StopResponse = client
        .post(format!("{}/simulator/stop", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(stop.stopped);
    assert!(!stop.status.is_running);

    let stop: StopResponse = client
        .post(format!("{}/simulator/stop", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(!stop.stopped);
    assert_eq!(stop.status.active_timer_count, 0);
    Ok(())
}

#[tokio::test]
async fn backfill_over_http() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    client
        .post(format!("{}/simulator/seed", base))
        .send()
        .await?
        .error_for_status()?;

    let report: BackfillReport = client
        .post(format!("{}/simulator/backfill", base))
        .json(&json!({ "days": 1 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(report.sensors, 6);
    assert_eq!(report.points_written, 6 * 49);
    assert!(report.failed_sensors.is_empty());

    let rejected = client
        .post(format!("{}/simulator/backfill", base))
        .json(&json!({ "days": 0 }))
        .send()
        .await?;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let oversized = client
        .post(format!("{}/simulator/backfill", base))
        .json(&json!({ "days": 100_000_000u32 }))
        .send()
        .await?;
    assert_eq!(oversized.status(), StatusCode::BAD_REQUEST);
    let body: Value = oversized.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("3650"));
    Ok(())
}

#[tokio::test]
async fn start_without_body_uses_default_interval() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    client
        .post(format!("{}/simulator/seed", base))
        .send()
        .await?
        .error_for_status()?;

    let resp = client.post(format!("{}/simulator/start", base)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let started: StartResponse = resp.json().await?;
    assert_eq!(started.outcome, "started");
    assert!(started.status.is_running);

    let stop: StopResponse = client
        .post(format!("{}/simulator/stop", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(stop.stopped);
    Ok(())
}
