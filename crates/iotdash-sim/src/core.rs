//! Core Types for iotdash-sim
//!
//! Devices, telemetry samples, alerts and dashboard statistics. Types are
//! co-located here as the single source of truth; the wire format is the
//! camelCase JSON the dashboard front-end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

// ============================================================================
// Closed vocabularies
// ============================================================================

/// Additive field groups a device kind contributes to its telemetry samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorGroup {
    /// temperature + humidity
    Climate,
    /// humidity (wider range) + dewPoint
    Hygrometer,
    /// pressure + altitude
    Barometer,
    /// luminosity + lightLevel
    Light,
    /// voltage, current, power, energy, powerFactor
    Energy,
    /// co2, co, gasLevel
    Gas,
    /// motion + motionCount
    Motion,
}

/// Device category. Serialized as its human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceKind {
    #[serde(rename = "Sensor de Temperatura")]
    TemperatureSensor,
    #[serde(rename = "Sensor de Humedad")]
    HumiditySensor,
    #[serde(rename = "Sensor de Presión")]
    PressureSensor,
    #[serde(rename = "Actuador LED")]
    LedActuator,
    #[serde(rename = "Controlador HVAC")]
    HvacController,
    #[serde(rename = "Gateway IoT")]
    Gateway,
    #[serde(rename = "Sensor de Movimiento")]
    MotionSensor,
    #[serde(rename = "Sensor de Luz")]
    LightSensor,
    #[serde(rename = "Monitor de Energía")]
    EnergyMonitor,
    #[serde(rename = "Cámara IP")]
    IpCamera,
    #[serde(rename = "Sensor de Gas")]
    GasSensor,
    #[serde(rename = "Controlador de Acceso")]
    AccessController,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 12] = [
        DeviceKind::TemperatureSensor,
        DeviceKind::HumiditySensor,
        DeviceKind::PressureSensor,
        DeviceKind::LedActuator,
        DeviceKind::HvacController,
        DeviceKind::Gateway,
        DeviceKind::MotionSensor,
        DeviceKind::LightSensor,
        DeviceKind::EnergyMonitor,
        DeviceKind::IpCamera,
        DeviceKind::GasSensor,
        DeviceKind::AccessController,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::TemperatureSensor => "Sensor de Temperatura",
            DeviceKind::HumiditySensor => "Sensor de Humedad",
            DeviceKind::PressureSensor => "Sensor de Presión",
            DeviceKind::LedActuator => "Actuador LED",
            DeviceKind::HvacController => "Controlador HVAC",
            DeviceKind::Gateway => "Gateway IoT",
            DeviceKind::MotionSensor => "Sensor de Movimiento",
            DeviceKind::LightSensor => "Sensor de Luz",
            DeviceKind::EnergyMonitor => "Monitor de Energía",
            DeviceKind::IpCamera => "Cámara IP",
            DeviceKind::GasSensor => "Sensor de Gas",
            DeviceKind::AccessController => "Controlador de Acceso",
        }
    }

    /// Field groups carried by every sample of this kind. Groups stack:
    /// every sensor reports climate data on top of its own readings.
    pub fn sensor_groups(&self) -> &'static [SensorGroup] {
        use SensorGroup::*;
        match self {
            DeviceKind::TemperatureSensor => &[Climate],
            DeviceKind::HumiditySensor => &[Climate, Hygrometer],
            DeviceKind::PressureSensor => &[Climate, Barometer],
            DeviceKind::MotionSensor => &[Climate, Motion],
            DeviceKind::LightSensor => &[Climate, Light],
            DeviceKind::GasSensor => &[Climate, Gas],
            DeviceKind::EnergyMonitor => &[Energy],
            DeviceKind::LedActuator
            | DeviceKind::HvacController
            | DeviceKind::Gateway
            | DeviceKind::IpCamera
            | DeviceKind::AccessController => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "MQTT")]
    Mqtt,
    #[serde(rename = "CoAP")]
    Coap,
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "Modbus")]
    Modbus,
    #[serde(rename = "LoRaWAN")]
    LoRaWan,
    #[serde(rename = "Zigbee")]
    Zigbee,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::Mqtt,
        Protocol::Coap,
        Protocol::Http,
        Protocol::Modbus,
        Protocol::LoRaWan,
        Protocol::Zigbee,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Mqtt => "MQTT",
            Protocol::Coap => "CoAP",
            Protocol::Http => "HTTP",
            Protocol::Modbus => "Modbus",
            Protocol::LoRaWan => "LoRaWAN",
            Protocol::Zigbee => "Zigbee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Suspicious,
    Blocked,
    Maintenance,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 5] = [
        DeviceStatus::Active,
        DeviceStatus::Inactive,
        DeviceStatus::Suspicious,
        DeviceStatus::Blocked,
        DeviceStatus::Maintenance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Security,
    Device,
    Network,
    System,
    Performance,
}

/// Alert severity. Opaque display labels; no ordering is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Crítico")]
    Critical,
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Bajo")]
    Low,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Crítico",
            Severity::High => "Alto",
            Severity::Medium => "Medio",
            Severity::Low => "Bajo",
        }
    }
}

// ============================================================================
// Devices
// ============================================================================

/// Simulated device. Metrics stay inside the bounds in [`crate::generator::bounds`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: u32,
    pub mac: String,
    pub ip: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    /// Relative label ("5 min", "2 horas", ...)
    pub last_activity: String,
    /// Absolute last activity, epoch milliseconds
    pub last_activity_raw: i64,
    pub protocol: Protocol,
    pub cpu: f64,
    pub memory: f64,
    /// Hours
    pub uptime: u32,
    pub temperature: f64,
    /// dBm
    pub signal_strength: i32,
}

// ============================================================================
// Telemetry
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatteryReading {
    pub battery: f64,
    pub battery_voltage: f64,
}

/// One timestamped set of readings for a device.
///
/// Only the common block is always present. Group fields appear when the
/// device kind declares the group, and the battery block appears on roughly
/// half of all samples, so consecutive samples can differ in shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Local wall clock label, HH:MM
    pub time: String,
    pub device_id: u32,

    // Common metrics
    pub cpu: f64,
    pub memory: f64,
    pub uptime: u32,
    pub signal_strength: i32,
    pub bytes_received: u32,
    pub bytes_sent: u32,
    pub packets_received: u32,
    pub packets_sent: u32,
    pub latency: f64,

    // Climate / Hygrometer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,

    // Barometer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    // Light
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luminosity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_level: Option<u32>,

    // Energy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,

    // Gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_level: Option<u32>,

    // Motion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_count: Option<u32>,

    #[serde(flatten)]
    pub battery: Option<BatteryReading>,
}

/// Current sample plus a bounded, oldest-first history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TelemetrySeries {
    pub current: TelemetrySample,
    pub history: VecDeque<TelemetrySample>,
}

impl TelemetrySeries {
    pub fn new(current: TelemetrySample, history: VecDeque<TelemetrySample>) -> Self {
        Self { current, history }
    }

    /// Make `sample` current and append it to the history, evicting the
    /// oldest entries once `capacity` is exceeded.
    pub fn record(&mut self, sample: TelemetrySample, capacity: usize) {
        self.history.push_back(sample.clone());
        while self.history.len() > capacity {
            self.history.pop_front();
        }
        self.current = sample;
    }

    /// Timestamp of the newest entry in the history, if any.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.history.back().map(|s| s.timestamp)
    }
}

/// Telemetry keyed by device id.
pub type TelemetryMap = BTreeMap<u32, TelemetrySeries>;

// ============================================================================
// Alerts
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// IP of the device the alert was raised against (copied, not a link)
    pub device: String,
    pub protocol: Protocol,
    /// Once true, never reset
    pub resolved: bool,
    pub details: String,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Dashboard digest, recomputed on every poll.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_devices: usize,
    pub active_devices: usize,
    pub inactive_devices: usize,
    /// Number of distinct device kinds present
    pub device_types: usize,
    pub active_alerts: usize,
    pub critical_alerts: usize,
    pub avg_temperature: f64,
    pub avg_cpu: f64,
    pub avg_memory: f64,
    pub total_traffic: u64,
    pub network_latency: f64,
    pub uptime: f64,
}

/// Full store projection returned by `module=all`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SimulationSnapshot {
    pub devices: Vec<Device>,
    pub telemetry: TelemetryMap,
    pub alerts: Vec<Alert>,
    pub dashboard: DashboardStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> TelemetrySample {
        TelemetrySample {
            timestamp: ts,
            ..Default::default()
        }
    }

    #[test]
    fn test_series_record_evicts_oldest() {
        let mut series = TelemetrySeries::default();
        for ts in 0..5 {
            series.record(sample(ts), 3);
        }
        assert_eq!(series.history.len(), 3);
        assert_eq!(series.history.front().map(|s| s.timestamp), Some(2));
        assert_eq!(series.latest_timestamp(), Some(4));
        assert_eq!(series.current.timestamp, 4);
    }

    #[test]
    fn test_device_kind_wire_labels() {
        for kind in DeviceKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.label().to_string()));
        }
        assert_eq!(
            serde_json::to_value(Severity::Critical).unwrap(),
            serde_json::json!("Crítico")
        );
        assert_eq!(
            serde_json::to_value(Protocol::LoRaWan).unwrap(),
            serde_json::json!("LoRaWAN")
        );
    }

    #[test]
    fn test_sensor_groups_stack() {
        let groups = DeviceKind::GasSensor.sensor_groups();
        assert!(groups.contains(&SensorGroup::Climate));
        assert!(groups.contains(&SensorGroup::Gas));
        assert!(DeviceKind::Gateway.sensor_groups().is_empty());
        assert_eq!(DeviceKind::EnergyMonitor.sensor_groups(), &[SensorGroup::Energy]);
    }

    #[test]
    fn test_sample_omits_absent_groups() {
        let mut s = sample(1);
        s.battery = Some(BatteryReading {
            battery: 50.0,
            battery_voltage: 3.7,
        });
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("voltage").is_none());
        assert!(json.get("humidity").is_none());
        assert_eq!(json["battery"], serde_json::json!(50.0));
        assert_eq!(json["batteryVoltage"], serde_json::json!(3.7));
        assert_eq!(json["deviceId"], serde_json::json!(0));
    }
}
