//! Static threshold table keyed by sensor type.
//!
//! Each [`SensorType`] maps to exactly one [`ThresholdConfig`]: the nominal
//! physical range of the instrument plus its warning and critical levels.
//! The table is compiled in and never mutated.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// ---

/// Kinds of city sensors the simulator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    AirQuality,
    Noise,
    Humidity,
    Traffic,
    Pollution,
}

impl SensorType {
    /// Every supported type, in table order.
    pub const ALL: [SensorType; 6] = [
        SensorType::Temperature,
        SensorType::AirQuality,
        SensorType::Noise,
        SensorType::Humidity,
        SensorType::Traffic,
        SensorType::Pollution,
    ];

    /// Name as stored in the sensor registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::AirQuality => "air_quality",
            SensorType::Noise => "noise",
            SensorType::Humidity => "humidity",
            SensorType::Traffic => "traffic",
            SensorType::Pollution => "pollution",
        }
    }

    /// Threshold configuration for this type.
    pub fn thresholds(&self) -> &'static ThresholdConfig {
        match self {
            SensorType::Temperature => &TEMPERATURE,
            SensorType::AirQuality => &AIR_QUALITY,
            SensorType::Noise => &NOISE,
            SensorType::Humidity => &HUMIDITY,
            SensorType::Traffic => &TRAFFIC,
            SensorType::Pollution => &POLLUTION,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when the registry holds a type string with no table entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensor type '{0}'")]
pub struct UnknownSensorType(pub String);

impl FromStr for SensorType {
    type Err = UnknownSensorType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSensorType(s.to_string()))
    }
}

/// Value range and alert boundaries for one sensor type.
///
/// `min <= warning_level <= critical_level <= max` is assumed, not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdConfig {
    pub min: f64,
    pub max: f64,
    pub warning_level: f64,
    pub critical_level: f64,
    pub unit: &'static str,
}

impl ThresholdConfig {
    /// Width of the nominal range.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

const TEMPERATURE: ThresholdConfig = ThresholdConfig {
    min: 15.0,
    max: 35.0,
    warning_level: 25.0,
    critical_level: 30.0,
    unit: "°C",
};

const AIR_QUALITY: ThresholdConfig = ThresholdConfig {
    min: 0.0,
    max: 300.0,
    warning_level: 100.0,
    critical_level: 150.0,
    unit: "AQI",
};

const NOISE: ThresholdConfig = ThresholdConfig {
    min: 30.0,
    max: 120.0,
    warning_level: 70.0,
    critical_level: 85.0,
    unit: "dB",
};

const HUMIDITY: ThresholdConfig = ThresholdConfig {
    min: 20.0,
    max: 95.0,
    warning_level: 70.0,
    critical_level: 85.0,
    unit: "%",
};

const TRAFFIC: ThresholdConfig = ThresholdConfig {
    min: 0.0,
    max: 100.0,
    warning_level: 70.0,
    critical_level: 90.0,
    unit: "%",
};

const POLLUTION: ThresholdConfig = ThresholdConfig {
    min: 0.0,
    max: 200.0,
    warning_level: 50.0,
    critical_level: 100.0,
    unit: "µg/m³",
};

/// Resolve a registry type string to its type and thresholds.
///
/// A miss is returned as an error value, never a panic: sensor types come
/// from data and an unknown one only disqualifies that sensor.
pub fn lookup(
    sensor_type: &str,
) -> Result<(SensorType, &'static ThresholdConfig), UnknownSensorType> {
    // ---
    let kind: SensorType = sensor_type.parse()?;
    Ok((kind, kind.thresholds()))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_round_trip_names() {
        // ---
        for kind in SensorType::ALL {
            assert_eq!(kind.as_str().parse::<SensorType>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        // ---
        let err = lookup("radiation").unwrap_err();
        assert_eq!(err, UnknownSensorType("radiation".to_string()));
        assert!(lookup("Temperature").is_err(), "lookup is case sensitive");
    }

    #[test]
    fn test_table_ordering() {
        // ---
        for kind in SensorType::ALL {
            let cfg = kind.thresholds();
            assert!(cfg.min <= cfg.warning_level, "{kind}: min > warning");
            assert!(cfg.warning_level <= cfg.critical_level, "{kind}: warning > critical");
            assert!(cfg.critical_level <= cfg.max, "{kind}: critical > max");
            assert!(cfg.range() > 0.0);
        }
    }

    #[test]
    fn test_serde_uses_registry_names() {
        // ---
        let json = serde_json::to_string(&SensorType::AirQuality).unwrap();
        assert_eq!(json, "\"air_quality\"");
    }
}
