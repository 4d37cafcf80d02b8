// src/routes/health.rs
//! Liveness endpoint for the telemetry service.
//!
//! `/health` answers as soon as the HTTP server is up, whether or not the
//! simulator is running, and reports which of the two it is. Sibling of
//! `control.rs` under the `routes` gateway.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::simulator::Simulator;
use crate::Config;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    simulator_running: bool,
}

/// Handle `GET /health`.
///
/// Reads the simulator's status snapshot only; never touches the store.
async fn health(State((simulator, _)): State<(Arc<Simulator>, Config)>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        simulator_running: simulator.status().is_running,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<(Arc<Simulator>, Config)> {
    Router::new().route("/health", get(health))
}
