//! Threshold alert evaluation with a one-hour deduplication window.

use chrono::{Duration, Utc};

use crate::error::StoreResult;
use crate::models::{AlertType, NewAlert, SensorInfo};
use crate::store::AlertStore;
use crate::thresholds::{self, SensorType, ThresholdConfig};

// ---

/// Lookback within which an unresolved alert of the same severity suppresses a new one.
pub const DEDUP_WINDOW_HOURS: i64 = 1;

/// What the evaluator decided for one reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Sensor type has no thresholds; nothing was checked.
    Skipped,
    /// Value is below the warning level.
    Normal,
    /// Threshold crossed but an active alert already covers it.
    Suppressed(AlertType),
    /// A new alert was persisted.
    Raised(NewAlert),
}

/// Severity for `value` and the level it crossed, or `None` below warning.
pub fn classify(value: f64, cfg: &ThresholdConfig) -> Option<(AlertType, f64)> {
    // ---
    if value >= cfg.critical_level {
        Some((AlertType::Critical, cfg.critical_level))
    } else if value >= cfg.warning_level {
        Some((AlertType::Warning, cfg.warning_level))
    } else {
        None
    }
}

/// Human-readable alert text.
pub fn alert_message(
    alert_type: AlertType,
    sensor: &SensorInfo,
    kind: SensorType,
    value: f64,
    threshold: f64,
    unit: &str,
) -> String {
    // ---
    format!(
        "{}: {} ({}) {} reading {:.1} {} reached threshold {} {}",
        alert_type.label(),
        sensor.name,
        sensor.location,
        kind,
        value,
        unit,
        threshold,
        unit
    )
}

/// Evaluate a fresh reading and persist an alert when warranted.
///
/// Store failures propagate to the caller, which owns per-sensor isolation.
pub async fn evaluate<S>(store: &S, sensor: &SensorInfo, value: f64) -> StoreResult<Evaluation>
where
    S: AlertStore + ?Sized,
{
    // ---
    let (kind, cfg) = match thresholds::lookup(&sensor.sensor_type) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(sensor_id = sensor.id, "Skipping alert evaluation: {}", e);
            return Ok(Evaluation::Skipped);
        }
    };

    let Some((alert_type, threshold)) = classify(value, cfg) else {
        return Ok(Evaluation::Normal);
    };

    let since = Utc::now() - Duration::hours(DEDUP_WINDOW_HOURS);
    if store
        .has_recent_unresolved_alert(sensor.id, alert_type, since)
        .await?
    {
        tracing::debug!(
            sensor_id = sensor.id,
            %alert_type,
            "Alert suppressed, active alert within dedup window"
        );
        return Ok(Evaluation::Suppressed(alert_type));
    }

    let alert = NewAlert {
        sensor_id: sensor.id,
        alert_type,
        threshold_value: threshold,
        current_value: value,
        message: alert_message(alert_type, sensor, kind, value, threshold, cfg.unit),
    };
    store.insert_alert(&alert).await?;

    tracing::warn!(
        sensor_id = sensor.id,
        %alert_type,
        value,
        threshold,
        "{}",
        alert.message
    );

    Ok(Evaluation::Raised(alert))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::SensorId;
    use crate::store::MemoryStore;

    fn sensor(sensor_type: &str) -> SensorInfo {
        // ---
        SensorInfo {
            id: 7,
            name: "Central Station".to_string(),
            sensor_type: sensor_type.to_string(),
            location: "Downtown".to_string(),
        }
    }

    #[test]
    fn test_classification_boundaries() {
        // ---
        let cfg = SensorType::Temperature.thresholds();

        assert_eq!(classify(cfg.warning_level, cfg), Some((AlertType::Warning, 25.0)));
        assert_eq!(classify(cfg.critical_level, cfg), Some((AlertType::Critical, 30.0)));
        assert_eq!(classify(cfg.warning_level - 1.0, cfg), None);
        assert_eq!(classify(cfg.critical_level - 1.0, cfg), Some((AlertType::Warning, 25.0)));
        assert_eq!(classify(cfg.max, cfg), Some((AlertType::Critical, 30.0)));
    }

    #[test]
    fn test_message_contents() {
        // ---
        let msg = alert_message(
            AlertType::Critical,
            &sensor("noise"),
            SensorType::Noise,
            91.237,
            85.0,
            "dB",
        );
        assert_eq!(
            msg,
            "CRITICAL: Central Station (Downtown) noise reading 91.2 dB reached threshold 85 dB"
        );
    }

    #[tokio::test]
    async fn test_duplicate_critical_alert_suppressed() {
        // ---
        let store = MemoryStore::new();
        let s = sensor("temperature");

        let first = evaluate(&store, &s, 33.0).await.unwrap();
        let second = evaluate(&store, &s, 34.5).await.unwrap();

        assert!(matches!(first, Evaluation::Raised(ref a) if a.alert_type == AlertType::Critical));
        assert_eq!(second, Evaluation::Suppressed(AlertType::Critical));
        assert_eq!(store.alerts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_severities_deduplicate_independently() {
        // ---
        let store = MemoryStore::new();
        let s = sensor("temperature");

        evaluate(&store, &s, 26.0).await.unwrap();
        evaluate(&store, &s, 31.0).await.unwrap();
        evaluate(&store, &s, 27.0).await.unwrap();

        let alerts = store.alerts().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
        assert_eq!(alerts[1].alert_type, AlertType::Critical);
        assert!(alerts.iter().all(|a| a.is_active()));
    }

    #[tokio::test]
    async fn test_resolved_alert_allows_new_one() {
        // ---
        let store = MemoryStore::new();
        let s = sensor("traffic");

        evaluate(&store, &s, 95.0).await.unwrap();
        store.resolve_alerts(s.id).unwrap();
        let again = evaluate(&store, &s, 96.0).await.unwrap();

        assert!(matches!(again, Evaluation::Raised(_)));
        assert_eq!(store.alerts().unwrap().len(), 2);
    }

    fn critical_alert(sensor_id: SensorId) -> NewAlert {
        // ---
        NewAlert {
            sensor_id,
            alert_type: AlertType::Critical,
            threshold_value: 30.0,
            current_value: 32.0,
            message: "CRITICAL: earlier alert".to_string(),
        }
    }

    #[tokio::test]
    async fn test_alert_older_than_window_no_longer_suppresses() {
        // ---
        let store = MemoryStore::new();
        let s = sensor("temperature");
        store
            .insert_alert_at(&critical_alert(s.id), Utc::now() - Duration::minutes(61))
            .unwrap();

        let outcome = evaluate(&store, &s, 33.0).await.unwrap();

        assert!(matches!(outcome, Evaluation::Raised(ref a) if a.alert_type == AlertType::Critical));
        let alerts = store.alerts().unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.is_active()), "old alert is still unresolved");
    }

    #[tokio::test]
    async fn test_alert_inside_window_still_suppresses() {
        // ---
        let store = MemoryStore::new();
        let s = sensor("temperature");
        store
            .insert_alert_at(&critical_alert(s.id), Utc::now() - Duration::minutes(59))
            .unwrap();

        let outcome = evaluate(&store, &s, 33.0).await.unwrap();

        assert_eq!(outcome, Evaluation::Suppressed(AlertType::Critical));
        assert_eq!(store.alerts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_normal_and_unknown_types_do_not_alert() {
        // ---
        let store = MemoryStore::new();

        assert_eq!(evaluate(&store, &sensor("humidity"), 40.0).await.unwrap(), Evaluation::Normal);
        assert_eq!(evaluate(&store, &sensor("seismic"), 1e9).await.unwrap(), Evaluation::Skipped);
        assert!(store.alerts().unwrap().is_empty());
    }
}
