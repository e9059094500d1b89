//! Polling & Control API
//!
//! Framework-agnostic handlers behind the HTTP surface:
//! - `GET /api/simulate?module=..&deviceId=..` polls (initialize if needed,
//!   advance once, return a projection)
//! - `POST /api/simulate {"action": ..}` starts, stops or resets the store
//! - `GET /api/configuration` serves the static dashboard configuration
//! - `GET /api/devices` lists the registered devices
//! - `GET /health` reports engine state

use crate::config::{AppConfig, NetworkSettings, RegisteredDevice, Threshold};
use crate::core::{Alert, DashboardStats, Device, SimulationSnapshot, TelemetryMap, TelemetrySeries};
use crate::engine::{EngineState, EngineStats, SimulationStore};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Number of alerts echoed alongside the dashboard projection.
pub const RECENT_ALERTS: usize = 5;

/// Shared state for the simulation API
pub struct SimulationState {
    pub store: SimulationStore,
    pub config: AppConfig,
}

impl SimulationState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: SimulationStore::new(config.simulation.clone()),
            config,
        }
    }
}

/// Thread-safe handle to simulation state
pub type SharedState = Arc<Mutex<SimulationState>>;

pub fn create_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(SimulationState::new(config)))
}

/// A handler that panicked mid-update leaves the store usable; keep serving.
fn lock(state: &SharedState) -> MutexGuard<'_, SimulationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Device not found")]
    DeviceNotFound(String),
    #[error("Invalid action")]
    InvalidAction(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::DeviceNotFound(_) => 404,
            ApiError::InvalidAction(_) => 400,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

// ============================================================================
// Polling
// ============================================================================

/// Projection selector. Anything unrecognized selects everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Module {
    Devices,
    Telemetry,
    Alerts,
    Dashboard,
    #[default]
    All,
}

impl Module {
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("devices") => Module::Devices,
            Some("telemetry") => Module::Telemetry,
            Some("alerts") => Module::Alerts,
            Some("dashboard") => Module::Dashboard,
            _ => Module::All,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationQuery {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModuleData {
    Devices(Vec<Device>),
    Telemetry(TelemetryMap),
    DeviceTelemetry(TelemetrySeries),
    Alerts(Vec<Alert>),
    Dashboard(DashboardStats),
    All(SimulationSnapshot),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub success: bool,
    pub data: ModuleData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<Device>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_alerts: Option<Vec<Alert>>,
    pub last_update: i64,
}

impl PollResponse {
    fn new(data: ModuleData, last_update: i64) -> Self {
        Self {
            success: true,
            data,
            devices: None,
            recent_alerts: None,
            last_update,
        }
    }
}

/// Handle GET /api/simulate
pub fn handle_poll(state: &SharedState, query: &SimulationQuery) -> Result<PollResponse, ApiError> {
    let module = Module::from_param(query.module.as_deref());
    let mut guard = lock(state);
    let store = &mut guard.store;

    store.poll();
    let last_update = store.last_update();

    let response = match module {
        Module::Devices => PollResponse::new(ModuleData::Devices(store.devices().to_vec()), last_update),
        Module::Telemetry => {
            let requested = query.device_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
            match requested {
                Some(raw) => {
                    let series = raw
                        .parse::<u32>()
                        .ok()
                        // ids are matched as canonical strings: "03" and "+3" are unknown
                        .filter(|id| id.to_string() == raw)
                        .and_then(|id| store.telemetry_for(id))
                        .ok_or_else(|| ApiError::DeviceNotFound(raw.to_string()))?;
                    PollResponse::new(ModuleData::DeviceTelemetry(series.clone()), last_update)
                }
                None => PollResponse::new(ModuleData::Telemetry(store.telemetry().clone()), last_update),
            }
        }
        Module::Alerts => PollResponse::new(ModuleData::Alerts(store.alerts().to_vec()), last_update),
        Module::Dashboard => PollResponse {
            devices: Some(store.devices().to_vec()),
            recent_alerts: Some(store.alerts().iter().take(RECENT_ALERTS).cloned().collect()),
            ..PollResponse::new(ModuleData::Dashboard(store.dashboard().clone()), last_update)
        },
        Module::All => PollResponse::new(ModuleData::All(store.snapshot()), last_update),
    };
    Ok(response)
}

// ============================================================================
// Control
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Reset,
}

impl FromStr for ControlAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ControlAction::Start),
            "stop" => Ok(ControlAction::Stop),
            "reset" => Ok(ControlAction::Reset),
            other => Err(ApiError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

/// Handle POST /api/simulate
pub fn handle_control(state: &SharedState, request: &ControlRequest) -> Result<ControlResponse, ApiError> {
    let action: ControlAction = request.action.as_deref().unwrap_or_default().parse()?;
    let mut guard = lock(state);

    let message = match action {
        ControlAction::Start => {
            let initialized = guard.store.start();
            info!(initialized, "simulation start requested");
            "Simulation started"
        }
        ControlAction::Stop => {
            guard.store.stop();
            info!("simulation stopped");
            "Simulation stopped"
        }
        ControlAction::Reset => {
            guard.store.reset();
            info!("simulation reset");
            "Simulation reset"
        }
    };

    Ok(ControlResponse {
        success: true,
        message: message.to_string(),
    })
}

// ============================================================================
// Configuration & health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettingsView {
    pub network_range: String,
    pub gateway_ip: String,
    pub dns_server: String,
    pub dhcp_enabled: bool,
    pub max_devices: u32,
}

impl From<&NetworkSettings> for NetworkSettingsView {
    fn from(n: &NetworkSettings) -> Self {
        Self {
            network_range: n.network_range.clone(),
            gateway_ip: n.gateway_ip.clone(),
            dns_server: n.dns_server.clone(),
            dhcp_enabled: n.dhcp_enabled,
            max_devices: n.max_devices,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDocument {
    pub network_settings: NetworkSettingsView,
    pub devices: Vec<RegisteredDevice>,
    pub thresholds: Vec<Threshold>,
}

/// Handle GET /api/configuration
pub fn handle_get_configuration(state: &SharedState) -> ConfigurationDocument {
    let guard = lock(state);
    ConfigurationDocument {
        network_settings: NetworkSettingsView::from(&guard.config.network),
        devices: guard.config.devices.clone(),
        thresholds: guard.config.thresholds.clone(),
    }
}

/// Handle GET /api/devices: the registered device list from the config file.
pub fn handle_list_devices(state: &SharedState) -> Vec<RegisteredDevice> {
    lock(state).config.devices.clone()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub state: EngineState,
    pub devices: usize,
    pub alerts: usize,
    pub last_update: i64,
    pub stats: EngineStats,
}

/// Handle GET /health. Read-only: does not initialize or advance.
pub fn handle_health(state: &SharedState) -> HealthResponse {
    let guard = lock(state);
    let store = &guard.store;
    HealthResponse {
        status: "ok",
        state: store.state(),
        devices: store.devices().len(),
        alerts: store.alerts().len(),
        last_update: store.last_update(),
        stats: store.stats().clone(),
    }
}

// ============================================================================
// API Documentation
// ============================================================================

pub fn get_api_routes() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("GET", "/api/simulate", "Poll: ?module=devices|telemetry|alerts|dashboard|all"),
        ("POST", "/api/simulate", "Control: {\"action\": start|stop|reset}"),
        ("GET", "/api/configuration", "Static dashboard configuration"),
        ("GET", "/api/devices", "Registered devices"),
        ("GET", "/health", "Engine state and counters"),
    ]
}

pub fn print_api_docs(config: &AppConfig) {
    println!("\n╔══════════════════════════════════════════════════════════════════════╗");
    println!("║                 IoT Dashboard Simulation API                         ║");
    println!("╠══════════════════════════════════════════════════════════════════════╣");
    println!("║ Base URL: http://{:<52}║", config.server.bind_addr());
    println!("╠──────────────────────────────────────────────────────────────────────╣");
    for (method, path, desc) in get_api_routes() {
        println!("║ {:5} {:18} {:45}║", method, path, desc);
    }
    println!("╚══════════════════════════════════════════════════════════════════════╝\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use serde_json::Value;

    fn state() -> SharedState {
        create_shared_state(AppConfig {
            simulation: SimulationConfig {
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn query(module: &str, device_id: Option<&str>) -> SimulationQuery {
        SimulationQuery {
            module: Some(module.to_string()),
            device_id: device_id.map(str::to_string),
        }
    }

    fn control(action: &str) -> ControlRequest {
        ControlRequest {
            action: Some(action.to_string()),
        }
    }

    #[test]
    fn test_module_parsing() {
        assert_eq!(Module::from_param(Some("devices")), Module::Devices);
        assert_eq!(Module::from_param(Some("dashboard")), Module::Dashboard);
        assert_eq!(Module::from_param(Some("bogus")), Module::All);
        assert_eq!(Module::from_param(None), Module::All);
    }

    #[test]
    fn test_first_poll_initializes() {
        let state = state();
        let response = handle_poll(&state, &query("devices", None)).unwrap();
        assert!(response.success);
        match response.data {
            ModuleData::Devices(devices) => assert_eq!(devices.len(), 15),
            other => panic!("unexpected projection: {other:?}"),
        }
        let health = handle_health(&state);
        assert_eq!(health.state, EngineState::Running);
        assert_eq!(health.stats.poll_count, 1);
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let state = state();
        for id in ["999999", "abc", "03", "+3"] {
            let err = handle_poll(&state, &query("telemetry", Some(id))).unwrap_err();
            assert!(matches!(err, ApiError::DeviceNotFound(_)));
            assert_eq!(err.status_code(), 404);
            let body = serde_json::to_value(err.body()).unwrap();
            assert_eq!(body["success"], Value::Bool(false));
            assert_eq!(body["error"], "Device not found");
        }
    }

    #[test]
    fn test_single_device_telemetry() {
        let state = state();
        let response = handle_poll(&state, &query("telemetry", Some("3"))).unwrap();
        match response.data {
            ModuleData::DeviceTelemetry(series) => {
                assert_eq!(series.current.device_id, 3);
                assert_eq!(series.history.len(), 51);
            }
            other => panic!("unexpected projection: {other:?}"),
        }

        let all = handle_poll(&state, &query("telemetry", Some(""))).unwrap();
        assert!(matches!(all.data, ModuleData::Telemetry(ref map) if map.len() == 15));
    }

    #[test]
    fn test_dashboard_extras() {
        let state = state();
        let response = handle_poll(&state, &query("dashboard", None)).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["totalDevices"], 15);
        assert_eq!(json["devices"].as_array().unwrap().len(), 15);
        assert!(json["recentAlerts"].as_array().unwrap().len() <= RECENT_ALERTS);
        assert!(json["lastUpdate"].as_i64().unwrap() > 0);

        let devices = handle_poll(&state, &query("devices", None)).unwrap();
        let json = serde_json::to_value(&devices).unwrap();
        assert!(json.get("recentAlerts").is_none());
    }

    #[test]
    fn test_control_actions() {
        let state = state();
        let started = handle_control(&state, &control("start")).unwrap();
        assert_eq!(started.message, "Simulation started");

        let before = handle_poll(&state, &query("all", None)).unwrap().last_update;
        let reset = handle_control(&state, &control("reset")).unwrap();
        assert_eq!(reset.message, "Simulation reset");
        let health = handle_health(&state);
        assert_eq!(health.devices, 15);
        assert!(health.last_update > before);

        let stopped = handle_control(&state, &control("stop")).unwrap();
        assert_eq!(stopped.message, "Simulation stopped");
        assert_eq!(handle_health(&state).state, EngineState::Stopped);
        assert_eq!(handle_health(&state).devices, 15);
    }

    #[test]
    fn test_invalid_action_rejected() {
        let state = state();
        let err = handle_control(&state, &control("explode")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.body().error, "Invalid action");
        let err = handle_control(&state, &ControlRequest::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidAction(_)));
    }

    #[test]
    fn test_configuration_document() {
        let state = state();
        let doc = handle_get_configuration(&state);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["networkSettings"]["networkRange"], "192.168.1.0/24");
        assert_eq!(json["networkSettings"]["maxDevices"], 50);
        assert_eq!(json["devices"][0]["protocol"], "MQTT");
        assert_eq!(json["thresholds"].as_array().unwrap().len(), 5);
        assert_eq!(json["thresholds"][4]["enabled"], false);
    }

    #[test]
    fn test_registered_device_list() {
        let state = state();
        let devices = handle_list_devices(&state);
        assert_eq!(devices.len(), 4);
        assert_eq!(devices[2].protocol, crate::core::Protocol::Modbus);
        assert!(!devices[2].enabled);
        assert!(lock(&state).store.devices().is_empty());
    }

    #[test]
    fn test_poisoned_lock_keeps_serving() {
        let state = state();
        let poisoner = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(state.is_poisoned());
        assert!(handle_poll(&state, &query("alerts", None)).is_ok());
    }
}
