//! Demo sensor registration.

use std::collections::HashSet;

use crate::error::StoreResult;
use crate::models::NewSensor;
use crate::store::SensorRegistry;
use crate::thresholds::SensorType;

// ---

/// (name, type, location, latitude, longitude)
const TEST_SENSORS: [(&str, SensorType, &str, f64, f64); 6] = [
    ("Place Centrale Thermometer", SensorType::Temperature, "Centre-Ville", 48.8566, 2.3522),
    ("Boulevard Nord Air Monitor", SensorType::AirQuality, "Quartier Nord", 48.8738, 2.3470),
    ("Gare Routière Noise Meter", SensorType::Noise, "Gare", 48.8443, 2.3743),
    ("Parc Riverain Hygrometer", SensorType::Humidity, "Bords de Seine", 48.8530, 2.3499),
    ("Périphérique Est Counter", SensorType::Traffic, "Porte Est", 48.8490, 2.4010),
    ("Zone Industrielle Particulates", SensorType::Pollution, "Zone Industrielle", 48.8220, 2.3650),
];

/// The fixed demo sensor set, one per type.
pub fn test_sensors() -> Vec<NewSensor> {
    // ---
    TEST_SENSORS
        .iter()
        .map(|&(name, sensor_type, location, latitude, longitude)| NewSensor {
            name: name.to_string(),
            sensor_type,
            location: location.to_string(),
            latitude,
            longitude,
        })
        .collect()
}

/// Register the demo sensors, skipping any whose name is already active.
pub async fn seed_test_sensors<S>(registry: &S) -> StoreResult<usize>
where
    S: SensorRegistry + ?Sized,
{
    // ---
    let existing: HashSet<String> = registry
        .list_active_sensors()
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();

    let mut inserted = 0;
    for sensor in test_sensors() {
        if existing.contains(&sensor.name) {
            tracing::debug!(name = %sensor.name, "Test sensor already registered");
            continue;
        }
        let id = registry.insert_sensor(&sensor).await?;
        tracing::info!(sensor_id = id, name = %sensor.name, "Registered test sensor");
        inserted += 1;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_one_sensor_per_type() {
        // ---
        let sensors = test_sensors();
        for kind in SensorType::ALL {
            assert_eq!(sensors.iter().filter(|s| s.sensor_type == kind).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        // ---
        let store = MemoryStore::new();
        assert_eq!(seed_test_sensors(&store).await.unwrap(), 6);
        assert_eq!(seed_test_sensors(&store).await.unwrap(), 0);
        assert_eq!(store.list_active_sensors().await.unwrap().len(), 6);
    }
}
