//! TOML configuration.
//!
//! One `iotdash.toml` drives the HTTP server, the simulation store, the
//! ThingsBoard client and the static dashboard configuration document.
//! Every section is optional; missing keys take their defaults.

use crate::core::Protocol;
use iotdash_thingsboard::ThingsBoardConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Simulation store sizing and per-poll probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Devices created on every (re)initialization
    pub device_count: usize,
    /// Alerts created on every (re)initialization
    pub initial_alerts: usize,
    /// Synthetic history points per device at initialization
    pub history_points: usize,
    /// Time window the synthetic history spans
    pub history_window_hours: u32,
    /// Max history entries kept per device
    pub history_capacity: usize,
    /// Max alerts retained after an insertion
    pub alert_capacity: usize,
    pub status_change_probability: f64,
    pub new_alert_probability: f64,
    pub alert_resolve_probability: f64,
    /// Fixed RNG seed (unset = OS entropy)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: 15,
            initial_alerts: 12,
            history_points: 50,
            history_window_hours: 24,
            history_capacity: 100,
            alert_capacity: 20,
            status_change_probability: 0.1,
            new_alert_probability: 0.05,
            alert_resolve_probability: 0.02,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkSettings {
    pub network_range: String,
    pub gateway_ip: String,
    pub dns_server: String,
    pub dhcp_enabled: bool,
    pub max_devices: u32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            network_range: "192.168.1.0/24".into(),
            gateway_ip: "192.168.1.1".into(),
            dns_server: "8.8.8.8".into(),
            dhcp_enabled: true,
            max_devices: 50,
        }
    }
}

/// Alerting threshold shown on the configuration page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Threshold {
    pub id: String,
    pub name: String,
    pub metric: String,
    pub threshold: f64,
    pub unit: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// Device registered by hand on the configuration page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredDevice {
    pub id: u32,
    pub name: String,
    pub ip: String,
    pub mac: String,
    pub protocol: Protocol,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

fn threshold(id: &str, name: &str, metric: &str, value: f64, unit: &str, enabled: bool) -> Threshold {
    Threshold {
        id: id.into(),
        name: name.into(),
        metric: metric.into(),
        threshold: value,
        unit: unit.into(),
        enabled,
    }
}

fn registered(id: u32, name: &str, ip: &str, mac: &str, protocol: Protocol, enabled: bool) -> RegisteredDevice {
    RegisteredDevice {
        id,
        name: name.into(),
        ip: ip.into(),
        mac: mac.into(),
        protocol,
        enabled,
    }
}

pub fn default_thresholds() -> Vec<Threshold> {
    vec![
        threshold("traffic", "Tráfico de red elevado", "tráfico total", 1000.0, "Mbps", true),
        threshold("latency", "Latencia alta", "latencia promedio", 500.0, "ms", true),
        threshold("packet_loss", "Pérdida de paquetes", "pérdida de paquetes", 10.0, "%", true),
        threshold(
            "failed_auth",
            "Intentos de autenticación fallidos",
            "intentos fallidos",
            5.0,
            "intentos/min",
            true,
        ),
        threshold(
            "device_offline",
            "Dispositivos desconectados",
            "dispositivos offline",
            3.0,
            "dispositivos",
            false,
        ),
    ]
}

pub fn default_registered_devices() -> Vec<RegisteredDevice> {
    vec![
        registered(1, "Sensor MQTT Principal", "192.168.1.45", "00:1B:44:11:3A:B7", Protocol::Mqtt, true),
        registered(2, "Actuador CoAP Sala 1", "192.168.1.46", "00:1B:44:11:3A:B8", Protocol::Coap, true),
        registered(3, "PLC Modbus Industrial", "192.168.1.47", "00:1B:44:11:3A:B9", Protocol::Modbus, false),
        registered(4, "Gateway HTTP Principal", "192.168.1.48", "00:1B:44:11:3A:C0", Protocol::Http, true),
    ]
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub thingsboard: ThingsBoardConfig,
    pub network: NetworkSettings,
    pub thresholds: Vec<Threshold>,
    pub devices: Vec<RegisteredDevice>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            thingsboard: ThingsBoardConfig::default(),
            network: NetworkSettings::default(),
            thresholds: default_thresholds(),
            devices: default_registered_devices(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults (with a warning) when the
    /// file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return AppConfig::default();
        }
        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(error = %e, "using default configuration");
                AppConfig::default()
            }
        }
    }

    /// Strict variant of [`AppConfig::load`].
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("iotdash.toml")
    }

    /// Human-readable problems; empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let sim = &self.simulation;

        if self.server.port == 0 {
            errors.push("server.port must not be 0".into());
        }
        if sim.device_count == 0 {
            errors.push("simulation.device_count must be at least 1".into());
        }
        if sim.history_capacity == 0 {
            errors.push("simulation.history_capacity must be at least 1".into());
        }
        if sim.alert_capacity == 0 {
            errors.push("simulation.alert_capacity must be at least 1".into());
        }
        if sim.history_points > sim.history_capacity {
            errors.push(format!(
                "simulation.history_points ({}) exceeds history_capacity ({})",
                sim.history_points, sim.history_capacity
            ));
        }
        for (name, p) in [
            ("status_change_probability", sim.status_change_probability),
            ("new_alert_probability", sim.new_alert_probability),
            ("alert_resolve_probability", sim.alert_resolve_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("simulation.{name} out of range: {p} (0.0-1.0)"));
            }
        }
        if self.thingsboard.timeout_ms == 0 {
            errors.push("thingsboard.timeout_ms must not be 0".into());
        }

        errors
    }
}
