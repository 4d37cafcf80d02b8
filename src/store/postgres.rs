//! PostgreSQL-backed store.
//!
//! Tables are created by [`crate::schema::create_schema`] before this store
//! is handed to the simulator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{AlertStore, ReadingStore, SensorRegistry};
use crate::error::StoreResult;
use crate::models::{AlertType, NewAlert, NewSensor, Reading, SensorId, SensorInfo};

// ---

/// Status value the registry uses for sensors eligible for simulation.
const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SensorRegistry for PgStore {
    async fn list_active_sensors(&self) -> StoreResult<Vec<SensorInfo>> {
        // ---
        let sensors = sqlx::query_as::<_, SensorInfo>(
            r#"
            SELECT id, name, sensor_type, location
              FROM sensors
             WHERE status = $1
             ORDER BY id
            "#,
        )
        .bind(ACTIVE_STATUS)
        .fetch_all(&self.pool)
        .await?;

        Ok(sensors)
    }

    async fn insert_sensor(&self, sensor: &NewSensor) -> StoreResult<SensorId> {
        // ---
        let id: SensorId = sqlx::query_scalar(
            r#"
            INSERT INTO sensors (name, sensor_type, location, latitude, longitude, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&sensor.name)
        .bind(sensor.sensor_type.as_str())
        .bind(&sensor.location)
        .bind(sensor.latitude)
        .bind(sensor.longitude)
        .bind(ACTIVE_STATUS)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl ReadingStore for PgStore {
    async fn last_reading(&self, sensor_id: SensorId) -> StoreResult<Option<Reading>> {
        // ---
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            SELECT sensor_id, value, unit, timestamp
              FROM sensor_readings
             WHERE sensor_id = $1
             ORDER BY timestamp DESC
             LIMIT 1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reading)
    }

    async fn insert_reading(
        &self,
        sensor_id: SensorId,
        value: f64,
        unit: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO sensor_readings (sensor_id, value, unit, timestamp)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            "#,
        )
        .bind(sensor_id)
        .bind(value)
        .bind(unit)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn has_recent_unresolved_alert(
        &self,
        sensor_id: SensorId,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // ---
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                  FROM alerts
                 WHERE sensor_id   = $1
                   AND alert_type  = $2
                   AND resolved_at IS NULL
                   AND created_at >= $3
            )
            "#,
        )
        .bind(sensor_id)
        .bind(alert_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_alert(&self, alert: &NewAlert) -> StoreResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO alerts (
                sensor_id, alert_type, threshold_value, current_value, message
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(alert.sensor_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.threshold_value)
        .bind(alert.current_value)
        .bind(&alert.message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
