use crate::core::{Device, DeviceKind, DeviceStatus, Protocol};
use crate::generator::{
    bounds, random_float, random_int, random_ip, random_mac, relative_time_label,
};
use rand::Rng;

/// Elapsed-minutes window sampled for a fresh device's last activity.
pub const CREATION_ACTIVITY_WINDOW_MIN: f64 = 240.0;

/// Build `count` devices with ids `1..=count`.
///
/// Each device samples kind, protocol, status and metrics independently.
/// MAC and IP collisions are possible and not prevented.
pub fn generate_devices<R: Rng + ?Sized>(rng: &mut R, count: usize, now_ms: i64) -> Vec<Device> {
    (1..=count as u32)
        .map(|id| generate_device(rng, id, now_ms))
        .collect()
}

fn generate_device<R: Rng + ?Sized>(rng: &mut R, id: u32, now_ms: i64) -> Device {
    let minutes = random_float(rng, 0.0, CREATION_ACTIVITY_WINDOW_MIN, 2);

    Device {
        id,
        mac: random_mac(rng),
        ip: random_ip(rng),
        kind: DeviceKind::ALL[rng.random_range(0..DeviceKind::ALL.len())],
        status: DeviceStatus::ALL[rng.random_range(0..DeviceStatus::ALL.len())],
        last_activity: relative_time_label(minutes),
        last_activity_raw: minutes_ago(now_ms, minutes),
        protocol: Protocol::ALL[rng.random_range(0..Protocol::ALL.len())],
        cpu: random_float(rng, bounds::CPU.0, bounds::CPU.1, 1),
        memory: random_float(rng, bounds::MEMORY.0, bounds::MEMORY.1, 1),
        uptime: random_int(
            rng,
            bounds::UPTIME_HOURS.0 as i64,
            bounds::UPTIME_HOURS.1 as i64,
        ) as u32,
        temperature: random_float(rng, bounds::TEMPERATURE.0, bounds::TEMPERATURE.1, 1),
        signal_strength: random_int(rng, bounds::SIGNAL.0 as i64, bounds::SIGNAL.1 as i64) as i32,
    }
}

pub(crate) fn minutes_ago(now_ms: i64, minutes: f64) -> i64 {
    now_ms - (minutes * 60_000.0) as i64
}
