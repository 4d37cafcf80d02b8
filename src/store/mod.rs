//! Store seam between the simulator and durable storage.
//!
//! The simulator never talks to a database directly. It is handed an
//! `Arc<dyn TelemetryStore>` at construction and only uses the key-based
//! operations below:
//! - `SensorRegistry` – which sensors exist and are active
//! - `ReadingStore`   – last reading per sensor, append new readings
//! - `AlertStore`     – recent-alert lookup for deduplication, append alerts
//!
//! Two backends live here: [`PgStore`] for production and [`MemoryStore`]
//! for demo runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{AlertType, NewAlert, NewSensor, Reading, SensorId, SensorInfo};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

#[async_trait]
pub trait SensorRegistry: Send + Sync {
    /// All sensors currently eligible for simulation.
    async fn list_active_sensors(&self) -> StoreResult<Vec<SensorInfo>>;

    /// Register a new active sensor and return its id.
    async fn insert_sensor(&self, sensor: &NewSensor) -> StoreResult<SensorId>;
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Most recent reading for `sensor_id`, if any.
    async fn last_reading(&self, sensor_id: SensorId) -> StoreResult<Option<Reading>>;

    /// Append a reading. `None` timestamps are stamped with the current time.
    async fn insert_reading(
        &self,
        sensor_id: SensorId,
        value: f64,
        unit: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Whether an unresolved alert of `alert_type` was created at or after `since`.
    async fn has_recent_unresolved_alert(
        &self,
        sensor_id: SensorId,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn insert_alert(&self, alert: &NewAlert) -> StoreResult<()>;
}

/// Everything the simulator needs from storage.
pub trait TelemetryStore: SensorRegistry + ReadingStore + AlertStore {}

impl<T> TelemetryStore for T where T: SensorRegistry + ReadingStore + AlertStore {}
