//! Configuration loader for the `techcity-telemetry` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Result};

use crate::backfill::BackfillOptions;
use crate::simulator::SimulatorOptions;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref() {
            None => $default,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => bail!("Invalid {}: '{}' is not a boolean", $var_name, other),
        }
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Where sensors, readings and alerts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("Invalid STORE_BACKEND: '{}'", other)),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    pub store_backend: StoreBackend,

    /// PostgreSQL connection string; present whenever the backend is Postgres.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the control API binds to.
    pub listen_addr: SocketAddr,

    /// Tick interval used when a start request does not name one.
    pub interval_secs: u32,

    /// Start the realtime simulator immediately after boot.
    pub autostart: bool,

    /// Offset between successive sensors' first ticks.
    pub stagger_ms: u32,

    pub heartbeat_secs: u32,

    /// Backfill throttle: points between pauses, and pause length.
    pub backfill_pause_every: u32,
    pub backfill_pause_ms: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (Postgres backend only)
///
/// Optional:
/// - `STORE_BACKEND` – `postgres` or `memory` (default: postgres)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `LISTEN_ADDR` – bind address (default: 0.0.0.0:8080)
/// - `SIMULATOR_INTERVAL_SECS` – default tick interval (default: 30)
/// - `SIMULATOR_AUTOSTART` – start simulating at boot (default: false)
/// - `SIMULATOR_STAGGER_MS` – per-sensor start offset (default: 1000)
/// - `HEARTBEAT_SECS` – heartbeat log period (default: 300)
/// - `BACKFILL_PAUSE_EVERY` – points between backfill pauses (default: 100)
/// - `BACKFILL_PAUSE_MS` – backfill pause length (default: 100)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let store_backend = match env::var("STORE_BACKEND") {
        Ok(v) => v.parse()?,
        Err(_) => StoreBackend::Postgres,
    };
    let db_url = match store_backend {
        StoreBackend::Postgres => Some(require_env!("DATABASE_URL")),
        StoreBackend::Memory => env::var("DATABASE_URL").ok(),
    };
    let listen_addr = match env::var("LISTEN_ADDR") {
        Ok(v) => v
            .parse()
            .map_err(|e| anyhow!("Invalid LISTEN_ADDR: {}", e))?,
        Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
    };

    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let interval_secs = parse_env_u32!("SIMULATOR_INTERVAL_SECS", 30);
    let autostart = parse_env_bool!("SIMULATOR_AUTOSTART", false);
    let stagger_ms = parse_env_u32!("SIMULATOR_STAGGER_MS", 1000);
    let heartbeat_secs = parse_env_u32!("HEARTBEAT_SECS", 300);
    let backfill_pause_every = parse_env_u32!("BACKFILL_PAUSE_EVERY", 100);
    let backfill_pause_ms = parse_env_u32!("BACKFILL_PAUSE_MS", 100);

    if interval_secs == 0 {
        bail!("SIMULATOR_INTERVAL_SECS must be greater than zero");
    }
    if heartbeat_secs == 0 {
        bail!("HEARTBEAT_SECS must be greater than zero");
    }

    Ok(Config {
        store_backend,
        db_url,
        db_pool_max,
        listen_addr,
        interval_secs,
        autostart,
        stagger_ms,
        heartbeat_secs,
        backfill_pause_every,
        backfill_pause_ms,
    })
}

/// Replace the password in a connection URL with `****`.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // A colon followed by `//` is the scheme separator, not a password
            if !db_url[colon_pos + 1..].starts_with("//") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

impl Config {
    /// Interval used when a start request does not carry one.
    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    pub fn simulator_options(&self) -> SimulatorOptions {
        // ---
        SimulatorOptions {
            stagger: Duration::from_millis(u64::from(self.stagger_ms)),
            heartbeat: Duration::from_secs(u64::from(self.heartbeat_secs)),
            backfill: BackfillOptions {
                pause_every: self.backfill_pause_every,
                pause: Duration::from_millis(u64::from(self.backfill_pause_ms)),
            },
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all other values.
    pub fn log_config(&self) {
        // ---
        let masked_db_url = self
            .db_url
            .as_deref()
            .map(mask_db_url)
            .unwrap_or_else(|| "(unset)".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  STORE_BACKEND           : {:?}", self.store_backend);
        tracing::info!("  DATABASE_URL            : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  LISTEN_ADDR             : {}", self.listen_addr);
        tracing::info!("  SIMULATOR_INTERVAL_SECS : {}", self.interval_secs);
        tracing::info!("  SIMULATOR_AUTOSTART     : {}", self.autostart);
        tracing::info!("  SIMULATOR_STAGGER_MS    : {}", self.stagger_ms);
        tracing::info!("  HEARTBEAT_SECS          : {}", self.heartbeat_secs);
        tracing::info!("  BACKFILL_PAUSE_EVERY    : {}", self.backfill_pause_every);
        tracing::info!("  BACKFILL_PAUSE_MS       : {}", self.backfill_pause_ms);
    }
}
