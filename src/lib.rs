//! TechCity sensor telemetry simulator.
//!
//! Generates time-patterned synthetic readings for the city's sensors,
//! stores them, and raises deduplicated threshold alerts. Storage is reached
//! only through the traits in [`store`], so the engine runs the same over
//! Postgres or in memory.
//!
//! Layout:
//! - `thresholds` – per-type value ranges and alert levels
//! - `generator`  – random-walk value generation with diurnal patterns
//! - `alerts`     – threshold classification and alert deduplication
//! - `simulator`  – realtime per-sensor scheduling and lifecycle
//! - `backfill`   – historical series generation
//! - `seed`       – demo sensor registration
//! - `routes`     – HTTP control surface

pub mod alerts;
pub mod backfill;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod routes;
pub mod schema;
pub mod seed;
pub mod simulator;
pub mod store;
pub mod thresholds;

pub use config::Config;
pub use error::{SimulatorError, StoreError, StoreResult};
pub use models::{Alert, AlertType, NewAlert, NewSensor, Reading, SensorId, SensorInfo};
pub use simulator::{Simulator, SimulatorOptions, SimulatorStatus, StartOutcome};
pub use thresholds::{SensorType, ThresholdConfig};
