//! In-process store used for `STORE_BACKEND=memory` runs and tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AlertStore, ReadingStore, SensorRegistry};
use crate::error::{StoreError, StoreResult};
use crate::models::{Alert, AlertType, NewAlert, NewSensor, Reading, SensorId, SensorInfo};

// ---

#[derive(Debug, Default)]
struct Tables {
    sensors: Vec<SensorInfo>,
    readings: Vec<Reading>,
    alerts: Vec<Alert>,
}

/// Store holding every table in memory. All registered sensors are active.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with registry rows, kept as given.
    pub fn with_sensors(sensors: impl IntoIterator<Item = SensorInfo>) -> Self {
        // ---
        let tables = Tables {
            sensors: sensors.into_iter().collect(),
            ..Tables::default()
        };
        Self {
            tables: Mutex::new(tables),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Snapshot of every stored reading, in insertion order.
    pub fn readings(&self) -> StoreResult<Vec<Reading>> {
        Ok(self.lock()?.readings.clone())
    }

    /// Snapshot of every stored alert, in insertion order.
    pub fn alerts(&self) -> StoreResult<Vec<Alert>> {
        Ok(self.lock()?.alerts.clone())
    }

    /// Record an alert as if it had been raised at `created_at`.
    pub fn insert_alert_at(&self, alert: &NewAlert, created_at: DateTime<Utc>) -> StoreResult<()> {
        // ---
        self.lock()?.alerts.push(Alert {
            sensor_id: alert.sensor_id,
            alert_type: alert.alert_type,
            threshold_value: alert.threshold_value,
            current_value: alert.current_value,
            message: alert.message.clone(),
            created_at,
            resolved_at: None,
        });
        Ok(())
    }

    /// Mark all active alerts of a sensor resolved, returning how many changed.
    pub fn resolve_alerts(&self, sensor_id: SensorId) -> StoreResult<usize> {
        // ---
        let now = Utc::now();
        let mut tables = self.lock()?;
        let mut resolved = 0;
        for alert in tables
            .alerts
            .iter_mut()
            .filter(|a| a.sensor_id == sensor_id && a.is_active())
        {
            alert.resolved_at = Some(now);
            resolved += 1;
        }
        Ok(resolved)
    }
}

#[async_trait]
impl SensorRegistry for MemoryStore {
    async fn list_active_sensors(&self) -> StoreResult<Vec<SensorInfo>> {
        Ok(self.lock()?.sensors.clone())
    }

    async fn insert_sensor(&self, sensor: &NewSensor) -> StoreResult<SensorId> {
        // ---
        let mut tables = self.lock()?;
        let id = tables.sensors.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        tables.sensors.push(SensorInfo {
            id,
            name: sensor.name.clone(),
            sensor_type: sensor.sensor_type.as_str().to_string(),
            location: sensor.location.clone(),
        });
        Ok(id)
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn last_reading(&self, sensor_id: SensorId) -> StoreResult<Option<Reading>> {
        // ---
        let tables = self.lock()?;
        let last = tables
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id)
            .max_by_key(|r| r.timestamp)
            .cloned();
        Ok(last)
    }

    async fn insert_reading(
        &self,
        sensor_id: SensorId,
        value: f64,
        unit: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        // ---
        self.lock()?.readings.push(Reading {
            sensor_id,
            value,
            unit: unit.to_string(),
            timestamp: timestamp.unwrap_or_else(Utc::now),
        });
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn has_recent_unresolved_alert(
        &self,
        sensor_id: SensorId,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // ---
        let tables = self.lock()?;
        Ok(tables.alerts.iter().any(|a| {
            a.sensor_id == sensor_id && a.alert_type == alert_type && a.is_active() && a.created_at >= since
        }))
    }

    async fn insert_alert(&self, alert: &NewAlert) -> StoreResult<()> {
        self.insert_alert_at(alert, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::Duration;

    use crate::thresholds::SensorType;

    #[tokio::test]
    async fn test_insert_sensor_assigns_increasing_ids() {
        // ---
        let store = MemoryStore::new();
        let new = NewSensor {
            name: "Harbor noise".to_string(),
            sensor_type: SensorType::Noise,
            location: "Harbor".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        };
        let a = store.insert_sensor(&new).await.unwrap();
        let b = store.insert_sensor(&new).await.unwrap();
        assert_eq!((a, b), (1, 2));

        let listed = store.list_active_sensors().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].sensor_type, "noise");
    }

    #[tokio::test]
    async fn test_last_reading_is_latest_by_timestamp() {
        // ---
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_reading(1, 10.0, "dB", Some(now)).await.unwrap();
        store
            .insert_reading(1, 5.0, "dB", Some(now - Duration::hours(1)))
            .await
            .unwrap();
        store.insert_reading(2, 99.0, "dB", Some(now)).await.unwrap();

        let last = store.last_reading(1).await.unwrap().unwrap();
        assert_eq!(last.value, 10.0);
        assert!(store.last_reading(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_alert_lookup_ignores_resolved() {
        // ---
        let store = MemoryStore::new();
        let since = Utc::now() - Duration::hours(1);
        store
            .insert_alert(&NewAlert {
                sensor_id: 4,
                alert_type: AlertType::Critical,
                threshold_value: 30.0,
                current_value: 31.0,
                message: "hot".to_string(),
            })
            .await
            .unwrap();

        assert!(store.has_recent_unresolved_alert(4, AlertType::Critical, since).await.unwrap());
        assert!(!store.has_recent_unresolved_alert(4, AlertType::Warning, since).await.unwrap());

        assert_eq!(store.resolve_alerts(4).unwrap(), 1);
        assert!(!store.has_recent_unresolved_alert(4, AlertType::Critical, since).await.unwrap());
    }
}
