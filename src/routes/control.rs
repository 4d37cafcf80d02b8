// src/routes/control.rs
//! Control surface for the simulator: status, start, stop, backfill, seed.
//!
//! Authentication happens in front of this service; every route here
//! assumes an already-authorised admin caller.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{Config, SimulatorError, SimulatorStatus, StartOutcome};
use crate::simulator::Simulator;

// ---

type AppState = (Arc<Simulator>, Config);

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/simulator/status", get(status))
        .route("/simulator/start", post(start))
        .route("/simulator/stop", post(stop))
        .route("/simulator/backfill", post(backfill))
        .route("/simulator/seed", post(seed))
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Falls back to `SIMULATOR_INTERVAL_SECS` when absent, as does a
    /// request with no body at all.
    interval_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BackfillRequest {
    days: u32,
}

#[derive(Debug, Serialize)]
struct StartResponse {
    outcome: &'static str,
    status: SimulatorStatus,
}

#[derive(Debug, Serialize)]
struct StopResponse {
    stopped: bool,
    status: SimulatorStatus,
}

async fn status(State((simulator, _)): State<AppState>) -> Json<SimulatorStatus> {
    Json(simulator.status())
}

async fn start(
    State((simulator, config)): State<AppState>,
    req: Option<Json<StartRequest>>,
) -> Response {
    // ---
    let interval = req
        .and_then(|Json(req)| req.interval_seconds)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.default_interval());
    info!("POST /simulator/start - interval {:?}", interval);

    let outcome = match simulator.start(interval).await {
        Ok(StartOutcome::Started { .. }) => "started",
        Ok(StartOutcome::AlreadyRunning) => "already_running",
        Ok(StartOutcome::NoActiveSensors) => "no_active_sensors",
        Err(e) => return error_response(e),
    };

    let body = StartResponse {
        outcome,
        status: simulator.status(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn stop(State((simulator, _)): State<AppState>) -> Json<StopResponse> {
    // ---
    info!("POST /simulator/stop");
    let stopped = simulator.stop().await;
    Json(StopResponse {
        stopped,
        status: simulator.status(),
    })
}

async fn backfill(
    State((simulator, _)): State<AppState>,
    Json(req): Json<BackfillRequest>,
) -> Response {
    // ---
    info!("POST /simulator/backfill - {} days", req.days);
    match simulator.backfill(req.days).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn seed(State((simulator, _)): State<AppState>) -> Response {
    // ---
    info!("POST /simulator/seed");
    match simulator.seed_test_sensors().await {
        Ok(inserted) => (StatusCode::OK, Json(json!({ "inserted": inserted }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

fn error_response(err: SimulatorError) -> Response {
    // ---
    let status = match err {
        SimulatorError::ZeroInterval
        | SimulatorError::ZeroDays
        | SimulatorError::TooManyDays { .. } => StatusCode::BAD_REQUEST,
        SimulatorError::Store(_) => {
            error!("Simulator store failure: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
