use std::sync::Arc;

use axum::Router;

use crate::simulator::Simulator;
use crate::Config;

mod control;
mod health;

// ---

pub fn router(simulator: Arc<Simulator>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(control::router())
        .merge(health::router())
        .with_state((simulator, config))
}
