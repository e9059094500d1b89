//! Pure helpers over ThingsBoard telemetry and device listings.

use crate::models::{DeviceInfo, DeviceStats, LatestTelemetry, TelemetryData, TsValue};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryStats {
    pub current: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
    pub count: usize,
}

impl Default for TelemetryStats {
    fn default() -> Self {
        Self {
            current: 0.0,
            avg: 0.0,
            min: 0.0,
            max: 0.0,
            trend: Trend::Stable,
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Avg,
    Min,
    Max,
    Sum,
}

/// One chart row: every key's value at `ts`, when the key has one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ts: i64,
    pub timestamp: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

/// Numeric reading of a point. Strings are parsed; anything else is skipped.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn numeric_values(data: &[TsValue]) -> Vec<f64> {
    data.iter().filter_map(|p| numeric(&p.value)).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summary over an oldest-first series.
///
/// Trend compares the mean of the last quarter with the first quarter:
/// more than 5% above is `Up`, more than 5% below is `Down`.
pub fn calculate_telemetry_stats(data: &[TsValue]) -> TelemetryStats {
    let values = numeric_values(data);
    let Some(&current) = values.last() else {
        return TelemetryStats::default();
    };

    let quarter = (values.len() / 4).max(1);
    let first = mean(&values[..quarter]);
    let last = mean(&values[values.len() - quarter..]);
    let trend = if last > first * 1.05 {
        Trend::Up
    } else if last < first * 0.95 {
        Trend::Down
    } else {
        Trend::Stable
    };

    TelemetryStats {
        current: round2(current),
        avg: round2(mean(&values)),
        min: round2(values.iter().copied().fold(f64::INFINITY, f64::min)),
        max: round2(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        trend,
        count: values.len(),
    }
}

/// Reduce the numeric points of a series; 0 when nothing is numeric.
pub fn aggregate_telemetry(data: &[TsValue], kind: AggregateKind) -> f64 {
    let values = numeric_values(data);
    if values.is_empty() {
        return 0.0;
    }
    match kind {
        AggregateKind::Avg => mean(&values),
        AggregateKind::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateKind::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregateKind::Sum => values.iter().sum(),
    }
}

/// Align every key on the union of timestamps, ascending. Numeric strings
/// become numbers; other values pass through unchanged.
pub fn transform_for_chart(data: &TelemetryData) -> Vec<ChartPoint> {
    let timestamps: BTreeSet<i64> = data.values().flatten().map(|p| p.ts).collect();

    timestamps
        .into_iter()
        .map(|ts| {
            let values = data
                .iter()
                .filter_map(|(key, series)| {
                    let point = series.iter().find(|p| p.ts == ts)?;
                    let value = numeric(&point.value)
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| point.value.clone());
                    Some((key.clone(), value))
                })
                .collect();
            ChartPoint {
                ts,
                timestamp: format_timestamp(ts),
                values,
            }
        })
        .collect()
}

/// Newest point per key from a timeseries response (the platform returns
/// each key newest first). Keys without points are dropped.
pub fn latest_from_series(data: TelemetryData) -> LatestTelemetry {
    data.into_iter()
        .filter_map(|(key, series)| series.into_iter().next().map(|p| (key, p)))
        .collect()
}

/// "hace N día(s) / hora(s) / minuto(s) / segundo(s)" relative to `now_ms`.
pub fn relative_age(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = (now_ms - timestamp_ms).max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let (n, unit) = if days > 0 {
        (days, "día")
    } else if hours > 0 {
        (hours, "hora")
    } else if minutes > 0 {
        (minutes, "minuto")
    } else {
        (seconds, "segundo")
    };
    format!("hace {} {}{}", n, unit, if n > 1 { "s" } else { "" })
}

/// Local date-time label, e.g. "05 mar 2024 14:07".
pub fn format_timestamp(ts: i64) -> String {
    Local
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_default()
}

/// Count devices by type; a device counts as active when it was created
/// less than 24 hours before `now_ms`.
pub fn device_stats(devices: &[DeviceInfo], now_ms: i64) -> DeviceStats {
    let mut stats = DeviceStats {
        total: devices.len(),
        ..Default::default()
    };
    for info in devices {
        if now_ms - info.device.created_time < DAY_MS {
            stats.active += 1;
        } else {
            stats.inactive += 1;
        }
        *stats
            .by_type
            .entry(info.device.device_type.clone())
            .or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Device, EntityId};
    use serde_json::json;

    fn series(values: &[Value]) -> Vec<TsValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TsValue {
                ts: i as i64 * 1000,
                value: v.clone(),
            })
            .collect()
    }

    #[test]
    fn test_stats_empty_series() {
        assert_eq!(calculate_telemetry_stats(&[]), TelemetryStats::default());
        let junk = series(&[json!("n/a"), json!(null)]);
        assert_eq!(calculate_telemetry_stats(&junk).count, 0);
    }

    #[test]
    fn test_stats_rising_series() {
        let data = series(&[json!("10"), json!(10.0), json!("12.5"), json!(20), json!("not a number")]);
        let stats = calculate_telemetry_stats(&data);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.current, 20.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 20.0);
        assert_eq!(stats.avg, 13.13);
        assert_eq!(stats.trend, Trend::Up);
    }

    #[test]
    fn test_stats_trend_band() {
        let flat = series(&[json!(100), json!(101), json!(99), json!(104)]);
        assert_eq!(calculate_telemetry_stats(&flat).trend, Trend::Stable);
        let falling = series(&[json!(100), json!(90), json!(80), json!(70)]);
        assert_eq!(calculate_telemetry_stats(&falling).trend, Trend::Down);
    }

    #[test]
    fn test_aggregate() {
        let data = series(&[json!("1"), json!(2), json!("3.5")]);
        assert_eq!(aggregate_telemetry(&data, AggregateKind::Sum), 6.5);
        assert_eq!(aggregate_telemetry(&data, AggregateKind::Min), 1.0);
        assert_eq!(aggregate_telemetry(&data, AggregateKind::Max), 3.5);
        assert!((aggregate_telemetry(&data, AggregateKind::Avg) - 6.5 / 3.0).abs() < 1e-9);
        assert_eq!(aggregate_telemetry(&[], AggregateKind::Avg), 0.0);
    }

    #[test]
    fn test_chart_alignment() {
        let mut data = TelemetryData::new();
        data.insert(
            "temperature".into(),
            vec![
                TsValue { ts: 2000, value: json!("21.5") },
                TsValue { ts: 1000, value: json!("20") },
            ],
        );
        data.insert(
            "state".into(),
            vec![TsValue { ts: 2000, value: json!("on") }],
        );

        let rows = transform_for_chart(&data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ts, 1000);
        assert_eq!(rows[0].values.get("temperature"), Some(&json!(20.0)));
        assert!(rows[0].values.get("state").is_none());
        assert_eq!(rows[1].values.get("temperature"), Some(&json!(21.5)));
        assert_eq!(rows[1].values.get("state"), Some(&json!("on")));

        let row = serde_json::to_value(&rows[1]).unwrap();
        assert_eq!(row["ts"], json!(2000));
        assert_eq!(row["state"], json!("on"));
    }

    #[test]
    fn test_latest_takes_first_point() {
        let mut data = TelemetryData::new();
        data.insert(
            "cpu".into(),
            vec![
                TsValue { ts: 5, value: json!("50") },
                TsValue { ts: 4, value: json!("40") },
            ],
        );
        data.insert("empty".into(), vec![]);
        let latest = latest_from_series(data);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["cpu"].ts, 5);
    }

    #[test]
    fn test_relative_age_labels() {
        let now = 10 * DAY_MS;
        assert_eq!(relative_age(now - 1_000, now), "hace 1 segundo");
        assert_eq!(relative_age(now - 30_000, now), "hace 30 segundos");
        assert_eq!(relative_age(now - 60_000, now), "hace 1 minuto");
        assert_eq!(relative_age(now - 3 * 3_600_000, now), "hace 3 horas");
        assert_eq!(relative_age(now - DAY_MS, now), "hace 1 día");
        assert_eq!(relative_age(now - 2 * DAY_MS, now), "hace 2 días");
    }

    #[test]
    fn test_device_stats_by_creation_age() {
        let now = 100 * DAY_MS;
        let make = |created: i64, ty: &str| DeviceInfo {
            device: Device {
                id: EntityId::device("x"),
                created_time: created,
                tenant_id: None,
                customer_id: None,
                name: "d".into(),
                device_type: ty.into(),
                label: None,
                additional_info: None,
            },
            customer_title: None,
            customer_is_public: None,
            device_profile_name: None,
        };
        let devices = vec![
            make(now - 3_600_000, "sensor"),
            make(now - 2 * DAY_MS, "sensor"),
            make(now - DAY_MS, "gateway"),
        ];
        let stats = device_stats(&devices, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 2);
        assert_eq!(stats.by_type["sensor"], 2);
        assert_eq!(stats.by_type["gateway"], 1);
    }
}
