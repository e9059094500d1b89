use crate::core::{Alert, AlertKind, Device, Severity};
use crate::generator::{random_float, random_int, random_ip};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore};

/// Probability that a freshly generated alert is already resolved.
pub const RESOLVED_AT_CREATION: f64 = 0.4;

/// Fixed alert template. The message builder receives the target device and
/// may draw secondary random values (packet rates, CVE numbers, ...).
pub struct AlertTemplate {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: &'static str,
    pub message: fn(&Device, &mut dyn RngCore) -> String,
}

pub static ALERT_TEMPLATES: [AlertTemplate; 12] = [
    AlertTemplate {
        kind: AlertKind::Security,
        severity: Severity::Critical,
        title: "Ataque DDoS detectado",
        message: ddos_message,
    },
    AlertTemplate {
        kind: AlertKind::Security,
        severity: Severity::Critical,
        title: "Man-in-the-Middle detectado",
        message: mitm_message,
    },
    AlertTemplate {
        kind: AlertKind::Security,
        severity: Severity::High,
        title: "Acceso no autorizado",
        message: unauthorized_access_message,
    },
    AlertTemplate {
        kind: AlertKind::Device,
        severity: Severity::Low,
        title: "Nuevo dispositivo conectado",
        message: new_device_message,
    },
    AlertTemplate {
        kind: AlertKind::Network,
        severity: Severity::Medium,
        title: "Latencia elevada detectada",
        message: high_latency_message,
    },
    AlertTemplate {
        kind: AlertKind::System,
        severity: Severity::Low,
        title: "Actualización de firmware disponible",
        message: firmware_message,
    },
    AlertTemplate {
        kind: AlertKind::Security,
        severity: Severity::Critical,
        title: "Vulnerabilidad crítica detectada",
        message: cve_message,
    },
    AlertTemplate {
        kind: AlertKind::Network,
        severity: Severity::Medium,
        title: "Pérdida de paquetes detectada",
        message: packet_loss_message,
    },
    AlertTemplate {
        kind: AlertKind::Performance,
        severity: Severity::High,
        title: "Uso elevado de CPU",
        message: high_cpu_message,
    },
    AlertTemplate {
        kind: AlertKind::Performance,
        severity: Severity::Medium,
        title: "Memoria crítica",
        message: memory_message,
    },
    AlertTemplate {
        kind: AlertKind::Device,
        severity: Severity::High,
        title: "Dispositivo sin respuesta",
        message: unresponsive_message,
    },
    AlertTemplate {
        kind: AlertKind::Network,
        severity: Severity::Low,
        title: "Reconexión exitosa",
        message: reconnect_message,
    },
];

fn ddos_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Flood detectado en dispositivo {} - Tráfico anómalo de {}+ paquetes/seg",
        device.ip,
        random_int(rng, 500, 1000)
    )
}

fn mitm_message(device: &Device, _rng: &mut dyn RngCore) -> String {
    format!(
        "Posible ataque MITM en comunicación {} entre {} y gateway",
        device.protocol.label(),
        device.ip
    )
}

fn unauthorized_access_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Intento de acceso no autorizado desde {} al dispositivo {}",
        random_ip(rng),
        device.kind.label()
    )
}

fn new_device_message(device: &Device, _rng: &mut dyn RngCore) -> String {
    format!(
        "Dispositivo IoT desconocido conectado a la red - MAC: {}",
        device.mac
    )
}

fn high_latency_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Latencia anormalmente alta en comunicaciones {} (>{}ms)",
        device.protocol.label(),
        random_int(rng, 500, 1000)
    )
}

fn firmware_message(device: &Device, _rng: &mut dyn RngCore) -> String {
    format!(
        "Nueva versión de firmware disponible para dispositivos {}",
        device.protocol.label()
    )
}

fn cve_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "CVE-2024-{} detectada en dispositivo {} - Requiere acción inmediata",
        random_int(rng, 1000, 9999),
        device.kind.label()
    )
}

fn packet_loss_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Pérdida de paquetes del {}% en comunicaciones {}",
        random_int(rng, 10, 30),
        device.protocol.label()
    )
}

fn high_cpu_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "CPU al {}% en dispositivo {}",
        random_int(rng, 85, 99),
        device.ip
    )
}

fn memory_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Uso de memoria al {}% en {}",
        random_int(rng, 85, 99),
        device.kind.label()
    )
}

fn unresponsive_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Dispositivo {} no responde desde hace {} minutos",
        device.ip,
        random_int(rng, 10, 60)
    )
}

fn reconnect_message(device: &Device, rng: &mut dyn RngCore) -> String {
    format!(
        "Dispositivo {} reconectado después de {} minutos offline",
        device.ip,
        random_int(rng, 5, 30)
    )
}

/// Build one alert against a random device, stamped at `timestamp`.
///
/// Returns `None` only when `devices` is empty.
pub fn raise_alert<R: RngCore>(
    rng: &mut R,
    devices: &[Device],
    id: u32,
    timestamp: DateTime<Utc>,
) -> Option<Alert> {
    if devices.is_empty() {
        return None;
    }
    let device = &devices[rng.random_range(0..devices.len())];
    let template = &ALERT_TEMPLATES[rng.random_range(0..ALERT_TEMPLATES.len())];

    let message = (template.message)(device, &mut *rng);
    let follow_up = if rng.random_bool(0.5) {
        "Acción automática tomada."
    } else {
        "Requiere intervención manual."
    };

    Some(Alert {
        id,
        kind: template.kind,
        severity: template.severity,
        title: template.title.to_string(),
        message,
        timestamp,
        device: device.ip.clone(),
        protocol: device.protocol,
        resolved: rng.random_bool(RESOLVED_AT_CREATION),
        details: format!(
            "Detectado en dispositivo {} ({}). {}",
            device.kind.label(),
            device.mac,
            follow_up
        ),
    })
}

/// Build `count` alerts with ids starting at `first_id`, each backdated by a
/// random 1-360 minutes from `now`. Result is sorted newest first.
pub fn generate_alerts<R: RngCore>(
    rng: &mut R,
    devices: &[Device],
    count: usize,
    first_id: u32,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = (0..count as u32)
        .filter_map(|offset| {
            let minutes_ago = random_float(rng, 1.0, 360.0, 2);
            let timestamp = now - Duration::milliseconds((minutes_ago * 60_000.0) as i64);
            raise_alert(rng, devices, first_id + offset, timestamp)
        })
        .collect();

    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::generate_devices;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_alerts_sorted_newest_first() {
        let mut rng = StdRng::seed_from_u64(21);
        let now = Utc::now();
        let devices = generate_devices(&mut rng, 15, now.timestamp_millis());
        let alerts = generate_alerts(&mut rng, &devices, 12, 1, now);

        assert_eq!(alerts.len(), 12);
        for pair in alerts.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        for alert in &alerts {
            assert!(alert.timestamp < now);
            assert!(alert.timestamp >= now - Duration::minutes(361));
            assert!(devices.iter().any(|d| d.ip == alert.device));
        }

        let mut ids: Vec<u32> = alerts.iter().map(|a| a.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_alert_message_references_device() {
        let mut rng = StdRng::seed_from_u64(22);
        let devices = generate_devices(&mut rng, 1, 0);
        let device = &devices[0];
        for _ in 0..50 {
            let alert = raise_alert(&mut rng, &devices, 1, Utc::now()).unwrap();
            let mentions_device = alert.message.contains(&device.ip)
                || alert.message.contains(&device.mac)
                || alert.message.contains(device.kind.label())
                || alert.message.contains(device.protocol.label());
            assert!(mentions_device, "{}", alert.message);
            assert!(alert.details.contains(&device.mac));
            assert_eq!(alert.protocol, device.protocol);
        }
    }

    #[test]
    fn test_resolved_share_at_creation() {
        let mut rng = StdRng::seed_from_u64(24);
        let now = Utc::now();
        let devices = generate_devices(&mut rng, 15, now.timestamp_millis());
        let mut total = 0usize;
        let mut resolved = 0usize;
        for _ in 0..400 {
            let alerts = generate_alerts(&mut rng, &devices, 10, 1, now);
            total += alerts.len();
            resolved += alerts.iter().filter(|a| a.resolved).count();
        }
        let share = resolved as f64 / total as f64;
        assert!((share - RESOLVED_AT_CREATION).abs() < 0.05, "resolved share {share}");
    }

    #[test]
    fn test_no_devices_no_alerts() {
        let mut rng = StdRng::seed_from_u64(23);
        assert!(raise_alert(&mut rng, &[], 1, Utc::now()).is_none());
        assert!(generate_alerts(&mut rng, &[], 5, 1, Utc::now()).is_empty());
    }
}
