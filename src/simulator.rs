//! Realtime simulation scheduler.
//!
//! [`Simulator`] owns the start/stop lifecycle. While running it keeps one
//! tokio task per active sensor plus a heartbeat task, all tied to a
//! [`CancellationToken`] created for that run. Each sensor task runs its
//! cycles strictly in sequence:
//! 1. fetch the sensor's last stored reading
//! 2. generate the next value
//! 3. persist the reading
//! 4. evaluate alerts for it
//!
//! A failing cycle is logged and the task waits for its next tick; sibling
//! sensors are unaffected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Timelike};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alerts::{self, Evaluation};
use crate::backfill::{self, BackfillOptions, BackfillReport};
use crate::error::{SimulatorError, StoreResult};
use crate::generator;
use crate::models::{SensorId, SensorInfo};
use crate::seed;
use crate::store::TelemetryStore;
use crate::thresholds::{self, SensorType};

// ---

/// Tuning knobs that do not change simulation semantics.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Delay added to each successive sensor's first tick.
    pub stagger: Duration,
    /// Period of the status heartbeat log.
    pub heartbeat: Duration,
    pub backfill: BackfillOptions,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            stagger: Duration::from_secs(1),
            heartbeat: Duration::from_secs(300),
            backfill: BackfillOptions::default(),
        }
    }
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulatorStatus {
    pub is_running: bool,
    /// Scheduled tasks, sensor timers plus the heartbeat.
    pub active_timer_count: usize,
}

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { sensors: usize },
    AlreadyRunning,
    NoActiveSensors,
}

/// Tasks belonging to one running period.
struct RunSet {
    cancel: CancellationToken,
    sensors: HashMap<SensorId, JoinHandle<()>>,
    heartbeat: JoinHandle<()>,
}

pub struct Simulator {
    store: Arc<dyn TelemetryStore>,
    options: SimulatorOptions,
    run: Mutex<Option<RunSet>>,
    running: AtomicBool,
    active_timers: AtomicUsize,
    cycles: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl Simulator {
    pub fn new(store: Arc<dyn TelemetryStore>, options: SimulatorOptions) -> Self {
        Self {
            store,
            options,
            run: Mutex::new(None),
            running: AtomicBool::new(false),
            active_timers: AtomicUsize::new(0),
            cycles: Arc::new(AtomicU64::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current status. Never waits on the lifecycle lock.
    pub fn status(&self) -> SimulatorStatus {
        SimulatorStatus {
            is_running: self.running.load(Ordering::Acquire),
            active_timer_count: self.active_timers.load(Ordering::Acquire),
        }
    }

    /// Total sensor cycles completed since construction.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Start simulating every active sensor once per `interval`.
    ///
    /// Sensors are read from the registry now and not re-read until the
    /// next start. Sensors with an unknown type are skipped.
    pub async fn start(&self, interval: Duration) -> Result<StartOutcome, SimulatorError> {
        // ---
        if interval.is_zero() {
            return Err(SimulatorError::ZeroInterval);
        }

        let mut run = self.run.lock().await;
        if run.is_some() {
            tracing::warn!("Simulator already running, start ignored");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let sensors = self.store.list_active_sensors().await?;
        let schedulable: Vec<(SensorInfo, SensorType)> = sensors
            .into_iter()
            .filter_map(|sensor| match thresholds::lookup(&sensor.sensor_type) {
                Ok((kind, _)) => Some((sensor, kind)),
                Err(e) => {
                    tracing::warn!(sensor_id = sensor.id, "Not simulating sensor: {}", e);
                    None
                }
            })
            .collect();

        if schedulable.is_empty() {
            tracing::warn!("No active sensors to simulate, simulator stays stopped");
            return Ok(StartOutcome::NoActiveSensors);
        }

        let cancel = self.shutdown.child_token();
        let now = Instant::now();
        let mut tasks = HashMap::with_capacity(schedulable.len());

        for (index, (sensor, kind)) in schedulable.into_iter().enumerate() {
            let first_tick = now + self.options.stagger * index as u32;
            let id = sensor.id;
            let handle = tokio::spawn(sensor_loop(
                self.store.clone(),
                sensor,
                kind,
                first_tick,
                interval,
                cancel.clone(),
                self.cycles.clone(),
            ));
            if let Some(previous) = tasks.insert(id, handle) {
                // Registry returned the same id twice; keep one loop per sensor.
                previous.abort();
            }
        }

        let sensor_count = tasks.len();
        let heartbeat = tokio::spawn(heartbeat_loop(
            self.options.heartbeat,
            sensor_count,
            self.cycles.clone(),
            cancel.clone(),
        ));

        *run = Some(RunSet {
            cancel,
            sensors: tasks,
            heartbeat,
        });
        self.active_timers.store(sensor_count + 1, Ordering::Release);
        self.running.store(true, Ordering::Release);

        tracing::info!(
            sensors = sensor_count,
            interval_secs = interval.as_secs_f64(),
            "Simulator started"
        );
        Ok(StartOutcome::Started {
            sensors: sensor_count,
        })
    }

    /// Cancel every timer of the current run. Returns `false` if not running.
    ///
    /// Cycles already in progress finish before their task exits.
    pub async fn stop(&self) -> bool {
        // ---
        let mut run = self.run.lock().await;
        let Some(set) = run.take() else {
            tracing::warn!("Simulator not running, stop ignored");
            return false;
        };

        set.cancel.cancel();
        self.running.store(false, Ordering::Release);
        self.active_timers.store(0, Ordering::Release);

        let count = set.sensors.len();
        for (sensor_id, handle) in set.sensors {
            if let Err(e) = handle.await {
                tracing::error!(sensor_id, "Sensor task ended abnormally: {}", e);
            }
        }
        if let Err(e) = set.heartbeat.await {
            tracing::error!("Heartbeat task ended abnormally: {}", e);
        }

        tracing::info!(sensors = count, "Simulator stopped");
        true
    }

    /// Fabricate `days` of history for all active sensors. No alerts are raised.
    pub async fn backfill(&self, days: u32) -> Result<BackfillReport, SimulatorError> {
        backfill::run(&*self.store, days, &self.options.backfill).await
    }

    /// Register one demo sensor per type. Returns how many were inserted.
    pub async fn seed_test_sensors(&self) -> StoreResult<usize> {
        seed::seed_test_sensors(&*self.store).await
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// One cycle for one sensor: read last value, generate, persist, evaluate.
///
/// Returns the persisted value and the alert decision.
pub async fn run_cycle<S, R>(
    store: &S,
    sensor: &SensorInfo,
    kind: SensorType,
    rng: &mut R,
) -> StoreResult<(f64, Evaluation)>
where
    S: TelemetryStore + ?Sized,
    R: Rng + Send,
{
    // ---
    let last = store.last_reading(sensor.id).await?.map(|r| r.value);
    let value = generator::next_value(kind, last, Local::now().hour(), rng);
    let unit = kind.thresholds().unit;

    store.insert_reading(sensor.id, value, unit, None).await?;
    let evaluation = alerts::evaluate(store, sensor, value).await?;

    tracing::info!(
        sensor_id = sensor.id,
        sensor = %sensor.name,
        value,
        unit,
        "Reading recorded"
    );
    Ok((value, evaluation))
}

async fn sensor_loop(
    store: Arc<dyn TelemetryStore>,
    sensor: SensorInfo,
    kind: SensorType,
    first_tick: Instant,
    period: Duration,
    cancel: CancellationToken,
    cycles: Arc<AtomicU64>,
) {
    // ---
    let mut ticker = tokio::time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match run_cycle(&*store, &sensor, kind, &mut rng).await {
            Ok(_) => {
                cycles.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!(sensor_id = sensor.id, "Simulation cycle failed: {}", e);
            }
        }
    }

    tracing::debug!(sensor_id = sensor.id, "Sensor loop stopped");
}

async fn heartbeat_loop(
    period: Duration,
    sensors: usize,
    cycles: Arc<AtomicU64>,
    cancel: CancellationToken,
) {
    // ---
    let period = period.max(Duration::from_secs(1));
    let started = Instant::now();
    let mut ticker = tokio::time::interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tracing::info!(
                    sensors,
                    cycles = cycles.load(Ordering::Relaxed),
                    uptime_secs = started.elapsed().as_secs(),
                    "Simulator heartbeat"
                );
            }
        }
    }
}
