use crate::core::{BatteryReading, DeviceKind, SensorGroup, TelemetrySample};
use crate::generator::{bounds, random_float, random_int};
use chrono::{Local, TimeZone};
use rand::Rng;
use std::collections::VecDeque;

/// Build one sample for a device of `kind` stamped at `timestamp_ms`.
///
/// Common metrics are always present; each declared [`SensorGroup`] adds
/// its fields on top, and the battery block is included with probability 0.5.
pub fn generate_telemetry<R: Rng + ?Sized>(
    rng: &mut R,
    device_id: u32,
    kind: DeviceKind,
    timestamp_ms: i64,
) -> TelemetrySample {
    let mut sample = TelemetrySample {
        timestamp: timestamp_ms,
        time: clock_label(timestamp_ms),
        device_id,
        cpu: random_float(rng, bounds::CPU.0, bounds::CPU.1, 1),
        memory: random_float(rng, bounds::MEMORY.0, bounds::MEMORY.1, 1),
        uptime: random_int(
            rng,
            bounds::UPTIME_HOURS.0 as i64,
            bounds::UPTIME_HOURS.1 as i64,
        ) as u32,
        signal_strength: random_int(rng, bounds::SIGNAL.0 as i64, bounds::SIGNAL.1 as i64) as i32,
        ..Default::default()
    };

    for group in kind.sensor_groups() {
        apply_group(rng, &mut sample, *group);
    }

    sample.bytes_received = random_int(rng, 1_000, 100_000) as u32;
    sample.bytes_sent = random_int(rng, 1_000, 100_000) as u32;
    sample.packets_received = random_int(rng, 100, 10_000) as u32;
    sample.packets_sent = random_int(rng, 100, 10_000) as u32;
    sample.latency = random_float(rng, 1.0, 150.0, 2);

    if rng.random_bool(0.5) {
        sample.battery = Some(BatteryReading {
            battery: random_float(rng, 10.0, 100.0, 1),
            battery_voltage: random_float(rng, 3.0, 4.2, 2),
        });
    }

    sample
}

fn apply_group<R: Rng + ?Sized>(rng: &mut R, sample: &mut TelemetrySample, group: SensorGroup) {
    match group {
        SensorGroup::Climate => {
            sample.temperature = Some(random_float(rng, 18.0, 32.0, 2));
            sample.humidity = Some(random_float(rng, 30.0, 80.0, 1));
        }
        SensorGroup::Hygrometer => {
            sample.humidity = Some(random_float(rng, 30.0, 90.0, 1));
            sample.dew_point = Some(random_float(rng, 10.0, 25.0, 2));
        }
        SensorGroup::Barometer => {
            sample.pressure = Some(random_float(rng, 980.0, 1030.0, 2));
            sample.altitude = Some(random_float(rng, 0.0, 500.0, 1));
        }
        SensorGroup::Light => {
            sample.luminosity = Some(random_float(rng, 0.0, 2000.0, 1));
            sample.light_level = Some(random_int(rng, 0, 100) as u32);
        }
        SensorGroup::Energy => {
            sample.voltage = Some(random_float(rng, 110.0, 240.0, 1));
            sample.current = Some(random_float(rng, 0.5, 15.0, 2));
            sample.power = Some(random_float(rng, 50.0, 3000.0, 1));
            sample.energy = Some(random_float(rng, 0.0, 100.0, 2));
            sample.power_factor = Some(random_float(rng, 0.85, 0.99, 3));
        }
        SensorGroup::Gas => {
            sample.co2 = Some(random_float(rng, 400.0, 1500.0, 0));
            sample.co = Some(random_float(rng, 0.0, 50.0, 1));
            sample.gas_level = Some(random_int(rng, 0, 100) as u32);
        }
        SensorGroup::Motion => {
            sample.motion = Some(rng.random_bool(0.3));
            sample.motion_count = Some(random_int(rng, 0, 50) as u32);
        }
    }
}

/// Back-filled history of `points` samples evenly spaced over the
/// `window_hours` before `now_ms`, oldest first. Every timestamp is strictly
/// earlier than `now_ms`.
pub fn synthetic_history<R: Rng + ?Sized>(
    rng: &mut R,
    device_id: u32,
    kind: DeviceKind,
    now_ms: i64,
    points: usize,
    window_hours: u32,
) -> VecDeque<TelemetrySample> {
    if points == 0 {
        return VecDeque::new();
    }
    let window_ms = window_hours as i64 * 3_600_000;
    let interval = (window_ms / points as i64).max(1);

    (0..points)
        .map(|i| {
            let ts = now_ms - (points - i) as i64 * interval;
            generate_telemetry(rng, device_id, kind, ts)
        })
        .collect()
}

fn clock_label(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}
