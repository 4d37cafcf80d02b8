//! Historical backfill.
//!
//! Writes a dense past series for every active sensor, one point every 30
//! minutes from `days` ago up to now inclusive. Each sensor walks from a
//! fresh first value. Alerts are never evaluated here.

use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::error::{SimulatorError, StoreResult};
use crate::generator;
use crate::models::{SensorId, SensorInfo};
use crate::store::TelemetryStore;
use crate::thresholds::{self, SensorType};

// ---

/// Spacing between two backfilled points.
pub const POINT_SPACING_MINUTES: i64 = 30;

/// Points per day at [`POINT_SPACING_MINUTES`].
pub const POINTS_PER_DAY: u32 = 48;

/// Longest history a single request may ask for (about ten years).
pub const MAX_BACKFILL_DAYS: u32 = 3650;

/// Write throttling. Does not affect which points are written.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Pause after this many points per sensor; `0` disables pausing.
    pub pause_every: u32,
    pub pause: Duration,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            pause_every: 100,
            pause: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Active sensors considered.
    pub sensors: usize,
    pub points_written: u64,
    /// Sensors whose series stopped early on a store failure.
    pub failed_sensors: Vec<SensorId>,
    /// Sensors with a type that has no thresholds.
    pub skipped_sensors: Vec<SensorId>,
}

/// Backfill `days` of history for every active sensor.
pub async fn run<S>(store: &S, days: u32, options: &BackfillOptions) -> Result<BackfillReport, SimulatorError>
where
    S: TelemetryStore + ?Sized,
{
    // ---
    if days == 0 {
        return Err(SimulatorError::ZeroDays);
    }
    let steps = days
        .checked_mul(POINTS_PER_DAY)
        .filter(|_| days <= MAX_BACKFILL_DAYS)
        .ok_or(SimulatorError::TooManyDays {
            days,
            max: MAX_BACKFILL_DAYS,
        })?;

    let sensors = store.list_active_sensors().await?;
    let now = Utc::now();
    let mut rng = StdRng::from_entropy();
    let mut report = BackfillReport {
        sensors: sensors.len(),
        ..BackfillReport::default()
    };

    tracing::info!(days, sensors = sensors.len(), "Starting historical backfill");

    for sensor in &sensors {
        let kind = match thresholds::lookup(&sensor.sensor_type) {
            Ok((kind, _)) => kind,
            Err(e) => {
                tracing::warn!(sensor_id = sensor.id, "Skipping backfill: {}", e);
                report.skipped_sensors.push(sensor.id);
                continue;
            }
        };

        let mut written = 0u64;
        let result = backfill_sensor(store, sensor, kind, now, steps, options, &mut rng, &mut written).await;
        report.points_written += written;

        match result {
            Ok(()) => {
                tracing::info!(sensor_id = sensor.id, points = written, "Sensor backfilled");
            }
            Err(e) => {
                tracing::error!(
                    sensor_id = sensor.id,
                    points = written,
                    "Backfill failed for sensor: {}",
                    e
                );
                report.failed_sensors.push(sensor.id);
            }
        }
    }

    tracing::info!(
        points = report.points_written,
        failed = report.failed_sensors.len(),
        "Historical backfill complete"
    );
    Ok(report)
}

/// Timestamp of the point `remaining` steps before `now`.
pub fn point_timestamp(now: DateTime<Utc>, remaining: u32) -> DateTime<Utc> {
    now - chrono::Duration::minutes(POINT_SPACING_MINUTES * i64::from(remaining))
}

#[allow(clippy::too_many_arguments)]
async fn backfill_sensor<S, R>(
    store: &S,
    sensor: &SensorInfo,
    kind: SensorType,
    now: DateTime<Utc>,
    steps: u32,
    options: &BackfillOptions,
    rng: &mut R,
    written: &mut u64,
) -> StoreResult<()>
where
    S: TelemetryStore + ?Sized,
    R: Rng + Send,
{
    // ---
    let unit = kind.thresholds().unit;
    let mut last = None;

    for remaining in (0..=steps).rev() {
        let timestamp = point_timestamp(now, remaining);
        let hour = timestamp.with_timezone(&Local).hour();
        let value = generator::next_value(kind, last, hour, rng);

        store.insert_reading(sensor.id, value, unit, Some(timestamp)).await?;
        last = Some(value);
        *written += 1;

        if options.pause_every > 0 && *written % u64::from(options.pause_every) == 0 {
            tokio::time::sleep(options.pause).await;
        }
    }
    Ok(())
}
