//! Dashboard Aggregator
//!
//! Derives the dashboard digest from the current devices and alerts. Count
//! fields are a pure function of the two collections; the averaged display
//! figures are resampled within plausible bounds on every call.

use crate::core::{Alert, DashboardStats, Device, DeviceStatus, Severity};
use crate::generator::{random_float, random_int};
use rand::Rng;
use std::collections::HashSet;

/// Display ranges for the resampled dashboard figures.
pub mod display {
    pub const AVG_TEMPERATURE: (f64, f64) = (20.0, 28.0);
    pub const AVG_CPU: (f64, f64) = (30.0, 70.0);
    pub const AVG_MEMORY: (f64, f64) = (40.0, 75.0);
    pub const TOTAL_TRAFFIC: (i64, i64) = (50_000, 500_000);
    pub const NETWORK_LATENCY: (f64, f64) = (5.0, 50.0);
    pub const UPTIME: (f64, f64) = (95.0, 99.9);
}

pub fn compute_dashboard_stats<R: Rng + ?Sized>(
    devices: &[Device],
    alerts: &[Alert],
    rng: &mut R,
) -> DashboardStats {
    let active_devices = devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Active)
        .count();
    let device_types: HashSet<_> = devices.iter().map(|d| d.kind).collect();

    let open: Vec<&Alert> = alerts.iter().filter(|a| !a.resolved).collect();
    let critical_alerts = open
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count();

    DashboardStats {
        total_devices: devices.len(),
        active_devices,
        inactive_devices: devices.len() - active_devices,
        device_types: device_types.len(),
        active_alerts: open.len(),
        critical_alerts,
        avg_temperature: random_float(rng, display::AVG_TEMPERATURE.0, display::AVG_TEMPERATURE.1, 1),
        avg_cpu: random_float(rng, display::AVG_CPU.0, display::AVG_CPU.1, 1),
        avg_memory: random_float(rng, display::AVG_MEMORY.0, display::AVG_MEMORY.1, 1),
        total_traffic: random_int(rng, display::TOTAL_TRAFFIC.0, display::TOTAL_TRAFFIC.1) as u64,
        network_latency: random_float(rng, display::NETWORK_LATENCY.0, display::NETWORK_LATENCY.1, 2),
        uptime: random_float(rng, display::UPTIME.0, display::UPTIME.1, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::{generate_alerts, generate_devices};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_counts_are_pure() {
        let mut rng = StdRng::seed_from_u64(30);
        let now = Utc::now();
        let mut devices = generate_devices(&mut rng, 8, now.timestamp_millis());
        for (i, d) in devices.iter_mut().enumerate() {
            d.status = if i < 5 {
                DeviceStatus::Active
            } else {
                DeviceStatus::Inactive
            };
        }

        let mut alerts = generate_alerts(&mut rng, &devices, 3, 1, now);
        for (i, a) in alerts.iter_mut().enumerate() {
            a.severity = Severity::Critical;
            a.resolved = i == 2;
        }

        let first = compute_dashboard_stats(&devices, &alerts, &mut rng);
        let second = compute_dashboard_stats(&devices, &alerts, &mut rng);
        for stats in [&first, &second] {
            assert_eq!(stats.total_devices, 8);
            assert_eq!(stats.active_devices, 5);
            assert_eq!(stats.inactive_devices, 3);
            assert_eq!(stats.active_alerts, 2);
            assert_eq!(stats.critical_alerts, 2);
        }
        assert_eq!(first.device_types, second.device_types);
    }

    #[test]
    fn test_non_active_statuses_count_as_inactive() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut devices = generate_devices(&mut rng, 4, 0);
        devices[0].status = DeviceStatus::Active;
        devices[1].status = DeviceStatus::Blocked;
        devices[2].status = DeviceStatus::Maintenance;
        devices[3].status = DeviceStatus::Suspicious;

        let stats = compute_dashboard_stats(&devices, &[], &mut rng);
        assert_eq!(stats.active_devices, 1);
        assert_eq!(stats.inactive_devices, 3);
        assert_eq!(stats.active_alerts, 0);
    }

    #[test]
    fn test_display_figures_in_range() {
        let mut rng = StdRng::seed_from_u64(32);
        let mut latency_uses_hundredths = false;
        for _ in 0..200 {
            let stats = compute_dashboard_stats(&[], &[], &mut rng);
            let hundredths = stats.network_latency * 100.0;
            assert!((hundredths.round() - hundredths).abs() < 1e-6);
            latency_uses_hundredths |= ((hundredths.round() as i64) % 10) != 0;
            assert_eq!(stats.total_devices, 0);
            assert_eq!(stats.device_types, 0);
            assert!((20.0..=28.0).contains(&stats.avg_temperature));
            assert!((30.0..=70.0).contains(&stats.avg_cpu));
            assert!((40.0..=75.0).contains(&stats.avg_memory));
            assert!((50_000..=500_000).contains(&stats.total_traffic));
            assert!((5.0..=50.0).contains(&stats.network_latency));
            assert!((95.0..=99.9).contains(&stats.uptime));
        }
        assert!(latency_uses_hundredths);
    }
}
