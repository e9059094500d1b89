//! ThingsBoard wire types.
//!
//! Field names follow the platform's camelCase JSON. Free-form payloads
//! (additional info, alarm details, RPC params, attribute values) stay as
//! `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl EntityId {
    pub fn device(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: Some("DEVICE".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: EntityId,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<EntityId>,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Value>,
}

/// Device as listed by the tenant endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(flatten)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_profile_name: Option<String>,
}

/// Body for `POST /device` when creating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialsType {
    #[serde(rename = "ACCESS_TOKEN")]
    AccessToken,
    #[serde(rename = "X509_CERTIFICATE")]
    X509Certificate,
    #[serde(rename = "MQTT_BASIC")]
    MqttBasic,
    #[serde(rename = "LWM2M_CREDENTIALS")]
    Lwm2mCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    pub id: EntityId,
    #[serde(default)]
    pub created_time: i64,
    pub device_id: EntityId,
    pub credentials_type: CredentialsType,
    pub credentials_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_value: Option<String>,
}

// ============================================================================
// Telemetry & attributes
// ============================================================================

/// One timeseries point. Values arrive as strings unless strict data types
/// were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsValue {
    pub ts: i64,
    pub value: Value,
}

/// Timeseries per key.
pub type TelemetryData = BTreeMap<String, Vec<TsValue>>;

/// Single newest point per key.
pub type LatestTelemetry = BTreeMap<String, TsValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_ts: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeScope {
    Server,
    Shared,
    Client,
}

impl AttributeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeScope::Server => "SERVER_SCOPE",
            AttributeScope::Shared => "SHARED_SCOPE",
            AttributeScope::Client => "CLIENT_SCOPE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    Min,
    Max,
    Avg,
    Sum,
    Count,
    #[default]
    None,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Avg => "AVG",
            Aggregation::Sum => "SUM",
            Aggregation::Count => "COUNT",
            Aggregation::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Asc,
    Desc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// Parameters of a historical timeseries query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub keys: Vec<String>,
    pub start_ts: i64,
    pub end_ts: i64,
    pub interval: Option<i64>,
    pub limit: u32,
    pub agg: Aggregation,
    pub order_by: Option<OrderBy>,
    pub use_strict_data_types: Option<bool>,
}

impl HistoryQuery {
    /// Raw points, at most 100, no aggregation.
    pub fn new(keys: Vec<String>, start_ts: i64, end_ts: i64) -> Self {
        Self {
            keys,
            start_ts,
            end_ts,
            interval: None,
            limit: 100,
            agg: Aggregation::None,
            order_by: None,
            use_strict_data_types: None,
        }
    }

    /// Chart-oriented query: interval sized for ~100 buckets, up to 1000
    /// points, ascending, typed values.
    pub fn for_chart(keys: Vec<String>, start_ts: i64, end_ts: i64) -> Self {
        let span = (end_ts - start_ts).max(0);
        Self {
            interval: Some((span + 99) / 100),
            limit: 1000,
            order_by: Some(OrderBy::Asc),
            use_strict_data_types: Some(true),
            ..Self::new(keys, start_ts, end_ts)
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_agg(mut self, agg: Aggregation, interval: i64) -> Self {
        self.agg = agg;
        self.interval = Some(interval);
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("keys", self.keys.join(",")),
            ("startTs", self.start_ts.to_string()),
            ("endTs", self.end_ts.to_string()),
            ("limit", self.limit.to_string()),
            ("agg", self.agg.as_str().to_string()),
        ];
        if let Some(interval) = self.interval {
            pairs.push(("interval", interval.to_string()));
        }
        if let Some(order) = self.order_by {
            pairs.push(("orderBy", order.as_str().to_string()));
        }
        if let Some(strict) = self.use_strict_data_types {
            pairs.push(("useStrictDataTypes", strict.to_string()));
        }
        pairs
    }
}

// ============================================================================
// RPC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Alarms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSeverity {
    Critical,
    Major,
    Minor,
    Warning,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    ActiveUnack,
    ActiveAck,
    ClearedUnack,
    ClearedAck,
}

impl AlarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::ActiveUnack => "ACTIVE_UNACK",
            AlarmStatus::ActiveAck => "ACTIVE_ACK",
            AlarmStatus::ClearedUnack => "CLEARED_UNACK",
            AlarmStatus::ClearedAck => "CLEARED_ACK",
        }
    }
}

/// Coarse alarm filter for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSearchStatus {
    Any,
    Active,
    Cleared,
    Ack,
    Unack,
}

impl AlarmSearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmSearchStatus::Any => "ANY",
            AlarmSearchStatus::Active => "ACTIVE",
            AlarmSearchStatus::Cleared => "CLEARED",
            AlarmSearchStatus::Ack => "ACK",
            AlarmSearchStatus::Unack => "UNACK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: EntityId,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub originator: EntityId,
    pub severity: AlarmSeverity,
    pub status: AlarmStatus,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub cleared: bool,
    #[serde(default)]
    pub start_ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default)]
    pub propagate: bool,
}

/// Body for `POST /alarm`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlarm {
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub originator: EntityId,
    pub severity: AlarmSeverity,
    pub status: AlarmStatus,
    pub propagate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl NewAlarm {
    /// Active, unacknowledged, propagated alarm.
    pub fn new(alarm_type: impl Into<String>, originator: EntityId, severity: AlarmSeverity) -> Self {
        Self {
            alarm_type: alarm_type.into(),
            originator,
            severity,
            status: AlarmStatus::ActiveUnack,
            propagate: true,
            details: None,
        }
    }
}

// ============================================================================
// Paging & stats
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub has_next: bool,
}

/// Tenant device summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub total: usize,
    /// Created within the last 24 hours
    pub active: usize,
    pub inactive: usize,
    pub by_type: BTreeMap<String, usize>,
}
