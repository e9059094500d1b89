//! Entity Factories
//!
//! Build devices, telemetry samples and alerts from the value generators and
//! the fixed vocabularies:
//! - **devices**: device batches with randomized identity and metrics
//! - **telemetry**: per-kind samples and synthetic back-filled history
//! - **alerts**: templated alerts raised against random devices

pub mod alerts;
pub mod devices;
pub mod telemetry;

pub use alerts::{ALERT_TEMPLATES, AlertTemplate, generate_alerts, raise_alert};
pub use devices::generate_devices;
pub use telemetry::{generate_telemetry, synthetic_history};

use crate::core::{DeviceKind, Protocol};

/// List all device kinds with their field groups
pub fn list_device_kinds() -> Vec<(&'static str, String)> {
    DeviceKind::ALL
        .iter()
        .map(|kind| {
            let groups: Vec<String> = kind
                .sensor_groups()
                .iter()
                .map(|g| format!("{:?}", g).to_lowercase())
                .collect();
            let groups = if groups.is_empty() {
                "common metrics only".to_string()
            } else {
                groups.join(" + ")
            };
            (kind.label(), groups)
        })
        .collect()
}

/// List all protocol labels
pub fn list_protocols() -> Vec<&'static str> {
    Protocol::ALL.iter().map(|p| p.label()).collect()
}

/// List all alert templates as (type, severity, title)
pub fn list_alert_templates() -> Vec<(String, &'static str, &'static str)> {
    ALERT_TEMPLATES
        .iter()
        .map(|t| (format!("{:?}", t.kind).to_lowercase(), t.severity.label(), t.title))
        .collect()
}
