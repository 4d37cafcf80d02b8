//! Simple data models for the telemetry simulator.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thresholds::SensorType;

// ---

pub type SensorId = i32;

/// Registry snapshot of a sensor taken when the simulator starts.
///
/// `sensor_type` stays a raw string: the registry owns the value and it
/// may name a type this service has no thresholds for.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SensorInfo {
    // ---
    pub id: SensorId,
    pub name: String,
    pub sensor_type: String,
    pub location: String,
}

/// A sensor to be registered by the seeding routine.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensor {
    // ---
    pub name: String,
    pub sensor_type: SensorType,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One stored measurement. Readings are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub sensor_id: SensorId,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Warning,
    Critical,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Warning => "warning",
            AlertType::Critical => "critical",
        }
    }

    /// Upper-case label used at the head of alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::Warning => "WARNING",
            AlertType::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(AlertType::Warning),
            "critical" => Ok(AlertType::Critical),
            other => Err(format!("unknown alert type '{other}'")),
        }
    }
}

/// Alert about to be persisted. The store stamps `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    // ---
    pub sensor_id: SensorId,
    pub alert_type: AlertType,
    pub threshold_value: f64,
    pub current_value: f64,
    pub message: String,
}

/// Persisted alert. `resolved_at == None` means the alert is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    // ---
    pub sensor_id: SensorId,
    pub alert_type: AlertType,
    pub threshold_value: f64,
    pub current_value: f64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_alert_type_strings() {
        // ---
        assert_eq!("warning".parse::<AlertType>(), Ok(AlertType::Warning));
        assert_eq!("critical".parse::<AlertType>(), Ok(AlertType::Critical));
        assert!("info".parse::<AlertType>().is_err());

        assert_eq!(AlertType::Critical.to_string(), "critical");
        assert_eq!(AlertType::Warning.label(), "WARNING");
    }

    #[test]
    fn test_alert_activity() {
        // ---
        let mut alert = Alert {
            sensor_id: 1,
            alert_type: AlertType::Warning,
            threshold_value: 70.0,
            current_value: 72.5,
            message: "test".to_string(),
            created_at: Utc::now(),
            resolved_at: None,
        };
        assert!(alert.is_active());

        alert.resolved_at = Some(Utc::now());
        assert!(!alert.is_active());
    }
}
