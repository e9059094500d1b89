//! Simulation Store
//!
//! Owns the simulated fleet: devices, per-device telemetry (current sample
//! plus bounded history), the alert list and the dashboard digest. The store
//! is an ordinary value; sharing it between request handlers is the API
//! layer's job.
//!
//! ## Update step
//!
//! ```text
//! advance()
//!   ├─ devices    status flip (p), clamped walks, fresh lastActivity
//!   ├─ telemetry  new current sample, appended to history (FIFO cap)
//!   ├─ alerts     maybe raise one (p), prepend, truncate; maybe resolve each (p)
//!   ├─ dashboard  recomputed from the mutated devices/alerts
//!   └─ lastUpdate strictly increasing
//! ```

use crate::aggregator::compute_dashboard_stats;
use crate::config::SimulationConfig;
use crate::core::{
    Alert, DashboardStats, Device, DeviceStatus, SimulationSnapshot, TelemetryMap,
    TelemetrySeries,
};
use crate::factories::{
    devices::minutes_ago, generate_alerts, generate_devices, generate_telemetry, raise_alert,
    synthetic_history,
};
use crate::generator::{
    bounds, chance, clamped_walk, clamped_walk_int, random_choice, random_float,
    relative_time_label,
};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

/// Elapsed-minutes window resampled for each device on every step.
const STEP_ACTIVITY_WINDOW_MIN: f64 = 120.0;

/// Engine running state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Stopped,
    Running,
}

/// Engine statistics
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub poll_count: u64,
    pub initializations: u64,
    pub alerts_raised: u64,
    pub alerts_resolved: u64,
}

pub struct SimulationStore {
    config: SimulationConfig,
    rng: StdRng,
    devices: Vec<Device>,
    telemetry: TelemetryMap,
    /// Newest first
    alerts: Vec<Alert>,
    dashboard: DashboardStats,
    /// Epoch milliseconds, strictly increasing across updates
    last_update: i64,
    state: EngineState,
    next_alert_id: u32,
    stats: EngineStats,
}

impl SimulationStore {
    /// Empty, stopped store. Seeded from `config.seed` when set.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            devices: Vec::new(),
            telemetry: TelemetryMap::new(),
            alerts: Vec::new(),
            dashboard: DashboardStats::default(),
            last_update: 0,
            state: EngineState::Stopped,
            next_alert_id: 1,
            stats: EngineStats::default(),
        }
    }

    /// Replace the whole dataset with a freshly generated one.
    pub fn initialize(&mut self) {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let cfg = &self.config;

        let devices = generate_devices(&mut self.rng, cfg.device_count, now_ms);

        let mut telemetry = TelemetryMap::new();
        for device in &devices {
            let history = synthetic_history(
                &mut self.rng,
                device.id,
                device.kind,
                now_ms,
                cfg.history_points.min(cfg.history_capacity),
                cfg.history_window_hours,
            );
            let current = generate_telemetry(&mut self.rng, device.id, device.kind, now_ms);
            telemetry.insert(device.id, TelemetrySeries::new(current, history));
        }

        let alerts = generate_alerts(&mut self.rng, &devices, cfg.initial_alerts, 1, now);
        self.next_alert_id = alerts.iter().map(|a| a.id).max().unwrap_or(0) + 1;

        self.dashboard = compute_dashboard_stats(&devices, &alerts, &mut self.rng);
        self.devices = devices;
        self.telemetry = telemetry;
        self.alerts = alerts;
        self.touch(now_ms);
        self.stats.initializations += 1;

        info!(
            devices = self.devices.len(),
            alerts = self.alerts.len(),
            "simulation initialized"
        );
    }

    /// One simulated step. Order matters: the dashboard reads the already
    /// mutated devices and alerts.
    pub fn advance(&mut self) {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        self.step_devices(now_ms);
        self.step_telemetry(now_ms);
        self.step_alerts(now);
        self.dashboard = compute_dashboard_stats(&self.devices, &self.alerts, &mut self.rng);
        self.touch(now_ms);
        self.stats.poll_count += 1;
    }

    fn step_devices(&mut self, now_ms: i64) {
        let p_status = self.config.status_change_probability;
        for device in &mut self.devices {
            if chance(&mut self.rng, p_status) {
                if let Some(status) = random_choice(&mut self.rng, &DeviceStatus::ALL) {
                    device.status = *status;
                }
            }
            device.cpu = clamped_walk(&mut self.rng, device.cpu, 5.0, bounds::CPU);
            device.memory = clamped_walk(&mut self.rng, device.memory, 5.0, bounds::MEMORY);
            device.temperature =
                clamped_walk(&mut self.rng, device.temperature, 2.0, bounds::TEMPERATURE);
            device.signal_strength =
                clamped_walk_int(&mut self.rng, device.signal_strength, 5, bounds::SIGNAL);

            let minutes = random_float(&mut self.rng, 0.0, STEP_ACTIVITY_WINDOW_MIN, 2);
            device.last_activity = relative_time_label(minutes);
            device.last_activity_raw = minutes_ago(now_ms, minutes);
        }
    }

    fn step_telemetry(&mut self, now_ms: i64) {
        let capacity = self.config.history_capacity;
        for device in &self.devices {
            let Some(series) = self.telemetry.get_mut(&device.id) else {
                continue;
            };
            let ts = series
                .latest_timestamp()
                .map_or(now_ms, |last| now_ms.max(last + 1));
            let sample = generate_telemetry(&mut self.rng, device.id, device.kind, ts);
            series.record(sample, capacity);
        }
    }

    fn step_alerts(&mut self, now: DateTime<Utc>) {
        if chance(&mut self.rng, self.config.new_alert_probability) {
            let stamp = self
                .alerts
                .first()
                .map_or(now, |head| now.max(head.timestamp));
            if let Some(alert) = raise_alert(&mut self.rng, &self.devices, self.next_alert_id, stamp) {
                info!(
                    id = alert.id,
                    severity = alert.severity.label(),
                    device = %alert.device,
                    title = %alert.title,
                    "alert raised"
                );
                self.next_alert_id += 1;
                self.stats.alerts_raised += 1;
                self.alerts.insert(0, alert);
                self.alerts.truncate(self.config.alert_capacity);
            }
        }

        let p_resolve = self.config.alert_resolve_probability;
        let mut resolved = 0;
        for alert in self.alerts.iter_mut().filter(|a| !a.resolved) {
            if chance(&mut self.rng, p_resolve) {
                alert.resolved = true;
                resolved += 1;
            }
        }
        if resolved > 0 {
            self.stats.alerts_resolved += resolved;
            debug!(resolved, "alerts resolved");
        }
    }

    fn touch(&mut self, now_ms: i64) {
        self.last_update = now_ms.max(self.last_update + 1);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initialize when stopped or empty, then mark running. Returns whether
    /// a fresh dataset was generated.
    pub fn ensure_initialized(&mut self) -> bool {
        if self.state == EngineState::Running && !self.devices.is_empty() {
            return false;
        }
        self.initialize();
        self.state = EngineState::Running;
        true
    }

    /// What every inbound poll does: lazy initialization, then one step.
    pub fn poll(&mut self) {
        self.ensure_initialized();
        self.advance();
    }

    /// Initialize unless already running. Returns whether it initialized.
    pub fn start(&mut self) -> bool {
        if self.state == EngineState::Running {
            return false;
        }
        self.initialize();
        self.state = EngineState::Running;
        true
    }

    /// Mark stopped; data is kept.
    pub fn stop(&mut self) {
        self.state = EngineState::Stopped;
    }

    /// Re-initialize regardless of state and mark running.
    pub fn reset(&mut self) {
        self.initialize();
        self.state = EngineState::Running;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn telemetry(&self) -> &TelemetryMap {
        &self.telemetry
    }

    pub fn telemetry_for(&self, device_id: u32) -> Option<&TelemetrySeries> {
        self.telemetry.get(&device_id)
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn dashboard(&self) -> &DashboardStats {
        &self.dashboard
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            devices: self.devices.clone(),
            telemetry: self.telemetry.clone(),
            alerts: self.alerts.clone(),
            dashboard: self.dashboard.clone(),
        }
    }
}
