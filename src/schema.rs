//! Database schema management for `techcity-telemetry`.
//!
//! Ensures the registry, reading and alert tables exist before the
//! simulator touches them. Applied once on startup from `main.rs` when the
//! Postgres backend is selected.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist.
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Sensor registry; `status = 'active'` marks sensors eligible for simulation
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensors (
            id           SERIAL PRIMARY KEY,
            name         TEXT             NOT NULL,
            sensor_type  TEXT             NOT NULL,
            location     TEXT             NOT NULL,
            latitude     DOUBLE PRECISION,
            longitude    DOUBLE PRECISION,
            status       TEXT             NOT NULL DEFAULT 'active',
            created_at   TIMESTAMPTZ      NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_readings (
            id         BIGSERIAL PRIMARY KEY,
            sensor_id  INTEGER          NOT NULL REFERENCES sensors (id) ON DELETE CASCADE,
            value      DOUBLE PRECISION NOT NULL,
            unit       TEXT             NOT NULL,
            timestamp  TIMESTAMPTZ      NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id               SERIAL PRIMARY KEY,
            sensor_id        INTEGER          NOT NULL REFERENCES sensors (id) ON DELETE CASCADE,
            alert_type       TEXT             NOT NULL CHECK (alert_type IN ('warning', 'critical')),
            threshold_value  DOUBLE PRECISION NOT NULL,
            current_value    DOUBLE PRECISION NOT NULL,
            message          TEXT             NOT NULL,
            created_at       TIMESTAMPTZ      NOT NULL DEFAULT NOW(),
            resolved_at      TIMESTAMPTZ
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Latest-reading lookup runs once per sensor per tick
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_readings_sensor_ts
            ON sensor_readings (sensor_id, timestamp DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Dedup check filters on unresolved alerts by sensor and severity
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_open
            ON alerts (sensor_id, alert_type, created_at)
         WHERE resolved_at IS NULL;
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
