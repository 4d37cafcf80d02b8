//! Synthetic reading generation.
//!
//! A new value is a bounded random walk from the previous reading (or a
//! uniform draw when there is none), scaled by an hour-of-day factor and
//! clamped into the type's nominal range.

use std::f64::consts::PI;

use rand::Rng;

use crate::thresholds::{SensorType, ThresholdConfig};

// ---

/// Largest step of the random walk, as a fraction of the type's range.
const MAX_STEP_FRACTION: f64 = 0.1;

fn is_rush_hour(hour: u32) -> bool {
    (7..=9).contains(&hour) || (17..=19).contains(&hour)
}

fn is_night(hour: u32) -> bool {
    hour >= 22 || hour <= 6
}

/// Multiplicative diurnal factor for `kind` at `hour` (0-23).
pub fn time_pattern(kind: SensorType, hour: u32) -> f64 {
    // ---
    match kind {
        SensorType::Temperature => ((hour as f64 - 6.0) * PI / 12.0).sin() * 0.3 + 1.0,
        SensorType::Traffic if is_rush_hour(hour) => 1.5,
        SensorType::Traffic if is_night(hour) => 0.3,
        SensorType::Noise if is_night(hour) => 0.4,
        SensorType::AirQuality if is_rush_hour(hour) => 1.3,
        SensorType::Pollution if is_rush_hour(hour) => 1.4,
        _ => 1.0,
    }
}

/// Pre-pattern value: a walk step from `last`, or a uniform draw in `[min, max)`.
pub fn base_value<R: Rng>(cfg: &ThresholdConfig, last: Option<f64>, rng: &mut R) -> f64 {
    // ---
    match last {
        Some(prev) => prev + rng.gen_range(-0.5_f64..0.5) * cfg.range() * MAX_STEP_FRACTION,
        None => rng.gen_range(cfg.min..cfg.max),
    }
}

/// Apply the time pattern, clamp into `[min, max]` and round to 2 decimals.
pub fn shape(base: f64, pattern: f64, cfg: &ThresholdConfig) -> f64 {
    // ---
    let clamped = (base * pattern).clamp(cfg.min, cfg.max);
    (clamped * 100.0).round() / 100.0
}

/// Next reading value for a sensor of `kind`, given its previous value.
pub fn next_value<R: Rng>(kind: SensorType, last: Option<f64>, hour: u32, rng: &mut R) -> f64 {
    // ---
    let cfg = kind.thresholds();
    let base = base_value(cfg, last, rng);
    shape(base, time_pattern(kind, hour), cfg)
}
