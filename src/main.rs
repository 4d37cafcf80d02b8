//! Application entry point for the `techcity-telemetry` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the store (PostgreSQL pool + schema, or in-memory)
//! - Constructing the simulator and optionally starting it
//! - Mounting the control routes and serving them with Axum
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required** for the Postgres backend)
//! - `STORE_BACKEND` (optional) – `postgres` or `memory`
//! - `TELEMETRY_LOG_LEVEL` (optional) – crate log level (default: `info`)
//! - `TELEMETRY_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the simulator tuning variables.
use std::{env, io::IsTerminal, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::{anyhow, Result};

use techcity_telemetry::config::{self, StoreBackend};
use techcity_telemetry::store::{MemoryStore, PgStore, TelemetryStore};
use techcity_telemetry::{routes, schema, Config, Simulator, StartOutcome};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = build_store(&cfg).await?;
    let simulator = Arc::new(Simulator::new(store, cfg.simulator_options()));

    if cfg.autostart {
        match simulator.start(cfg.default_interval()).await? {
            StartOutcome::Started { sensors } => {
                tracing::info!("Autostarted simulator for {} sensors", sensors)
            }
            other => tracing::warn!("Autostart did not start the simulator: {:?}", other),
        }
    }

    // Build app from routes gateway
    let app: Router = routes::router(simulator.clone(), cfg.clone());

    tracing::info!("Listening on {}", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    simulator.stop().await;
    Ok(())
}

// ---

async fn build_store(cfg: &Config) -> Result<Arc<dyn TelemetryStore>> {
    // ---
    match cfg.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db_url = cfg
                .db_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL must be set for the postgres backend"))?;

            tracing::info!("Attempting to connect to database: {}", config::mask_db_url(db_url));

            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_pool_max)
                .connect(db_url)
                .await
                .map_err(|e| {
                    anyhow!(
                        "Failed to connect to database '{}': {}",
                        config::mask_db_url(db_url),
                        e
                    )
                })?;

            tracing::info!("Successfully connected to database");

            schema::create_schema(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `TELEMETRY_LOG_LEVEL` (default `info`)
/// applies to this crate while dependencies such as sqlx and hyper stay at
/// `warn`, so per-cycle "Reading recorded" lines are not buried under query logs.
///
/// `TELEMETRY_SPAN_EVENTS=full|enter_exit` widens span events beyond CLOSE,
/// and `FORCE_COLOR` overrides TTY detection for ANSI output.
fn init_tracing() {
    // ---
    let env_filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => {
            let level = env::var("TELEMETRY_LOG_LEVEL")
                .ok()
                .and_then(|v| v.parse::<Level>().ok())
                .unwrap_or(Level::INFO);
            EnvFilter::new(format!("warn,techcity_telemetry={level}"))
        }
    };

    let span_events = match env::var("TELEMETRY_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let ansi = match env::var("FORCE_COLOR").as_deref() {
        Ok("1" | "true" | "yes") => true,
        Ok("0" | "false" | "no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(span_events)
        .with_ansi(ansi)
        .with_target(true)
        .with_line_number(true)
        .compact()
        .init();
}
