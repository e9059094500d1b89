//! Async REST client.
//!
//! Every tenant-scoped call carries `X-Authorization: Bearer <token>`.
//! Device-side uploads (`/v1/{accessToken}/telemetry`) authenticate through
//! the path and send no header.

use crate::analytics;
use crate::config::ThingsBoardConfig;
use crate::error::{Result, ThingsBoardError};
use crate::models::{
    Alarm, AlarmSearchStatus, AlarmStatus, Attribute, AttributeScope, Device, DeviceCredentials,
    DeviceInfo, DeviceStats, HistoryQuery, LatestTelemetry, NewAlarm, NewDevice, PageData,
    RpcRequest, TelemetryData,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const AUTH_HEADER: &str = "X-Authorization";

#[derive(Clone)]
pub struct ThingsBoardClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ThingsBoardClient {
    pub fn new(config: &ThingsBoardConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        if self.token.is_empty() {
            return Err(ThingsBoardError::MissingToken);
        }
        Ok(self
            .http
            .request(method, self.url(path))
            .header(AUTH_HEADER, format!("Bearer {}", self.token)))
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(operation, status = status.as_u16(), "ThingsBoard request ok");
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(operation, status = status.as_u16(), "ThingsBoard request failed");
        Err(ThingsBoardError::Status {
            operation,
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let bytes = self.send(operation, request).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ThingsBoardError::Decode { operation, source })
    }

    // ========================================================================
    // Devices
    // ========================================================================

    pub async fn get_devices(&self, page_size: u32, page: u32) -> Result<PageData<DeviceInfo>> {
        let request = self
            .authed(Method::GET, "/tenant/devices")?
            .query(&[("pageSize", page_size), ("page", page)]);
        self.fetch("get devices", request).await
    }

    pub async fn get_device(&self, device_id: &str) -> Result<Device> {
        let request = self.authed(Method::GET, &format!("/device/{device_id}"))?;
        self.fetch("get device", request).await
    }

    pub async fn create_device(
        &self,
        name: &str,
        device_type: &str,
        label: Option<&str>,
        additional_info: Option<Value>,
    ) -> Result<Device> {
        let body = NewDevice {
            name: name.to_string(),
            device_type: device_type.to_string(),
            label: label.map(str::to_string),
            additional_info,
        };
        let request = self.authed(Method::POST, "/device")?.json(&body);
        self.fetch("create device", request).await
    }

    pub async fn update_device(&self, device: &Device) -> Result<Device> {
        let request = self.authed(Method::POST, "/device")?.json(device);
        self.fetch("update device", request).await
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<()> {
        let request = self.authed(Method::DELETE, &format!("/device/{device_id}"))?;
        self.send("delete device", request).await?;
        Ok(())
    }

    pub async fn get_device_credentials(&self, device_id: &str) -> Result<DeviceCredentials> {
        let request = self.authed(Method::GET, &format!("/device/{device_id}/credentials"))?;
        self.fetch("get credentials", request).await
    }

    pub async fn update_device_credentials(
        &self,
        credentials: &DeviceCredentials,
    ) -> Result<DeviceCredentials> {
        let request = self
            .authed(Method::POST, "/device/credentials")?
            .json(credentials);
        self.fetch("update credentials", request).await
    }

    // ========================================================================
    // Telemetry
    // ========================================================================

    fn telemetry_path(device_id: &str, suffix: &str) -> String {
        format!("/plugins/telemetry/DEVICE/{device_id}/{suffix}")
    }

    pub async fn get_telemetry_keys(&self, device_id: &str) -> Result<Vec<String>> {
        let request = self.authed(
            Method::GET,
            &Self::telemetry_path(device_id, "keys/timeseries"),
        )?;
        self.fetch("get telemetry keys", request).await
    }

    /// Newest value per key. An empty `keys` asks for every key.
    pub async fn get_latest_telemetry(
        &self,
        device_id: &str,
        keys: &[String],
    ) -> Result<LatestTelemetry> {
        let mut request = self.authed(
            Method::GET,
            &Self::telemetry_path(device_id, "values/timeseries"),
        )?;
        if !keys.is_empty() {
            request = request.query(&[("keys", keys.join(","))]);
        }
        let series: TelemetryData = self.fetch("get latest telemetry", request).await?;
        Ok(analytics::latest_from_series(series))
    }

    pub async fn get_historical_telemetry(
        &self,
        device_id: &str,
        query: &HistoryQuery,
    ) -> Result<TelemetryData> {
        let request = self
            .authed(
                Method::GET,
                &Self::telemetry_path(device_id, "values/timeseries"),
            )?
            .query(&query.query_pairs());
        self.fetch("get historical telemetry", request).await
    }

    /// Upload as a device. With `ts` the body is `{ts, values}`, otherwise
    /// the values are sent bare and the server stamps them.
    pub async fn send_telemetry(
        &self,
        access_token: &str,
        values: &Value,
        ts: Option<i64>,
    ) -> Result<()> {
        let body = match ts {
            Some(ts) => json!({ "ts": ts, "values": values }),
            None => values.clone(),
        };
        let request = self
            .http
            .post(self.url(&format!("/v1/{access_token}/telemetry")))
            .json(&body);
        self.send("send telemetry", request).await?;
        Ok(())
    }

    pub async fn delete_telemetry(
        &self,
        device_id: &str,
        keys: &[String],
        start_ts: i64,
        end_ts: i64,
    ) -> Result<()> {
        let request = self
            .authed(
                Method::DELETE,
                &Self::telemetry_path(device_id, "timeseries/delete"),
            )?
            .query(&[
                ("keys", keys.join(",")),
                ("startTs", start_ts.to_string()),
                ("endTs", end_ts.to_string()),
            ]);
        self.send("delete telemetry", request).await?;
        Ok(())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub async fn get_device_attributes(
        &self,
        device_id: &str,
        client_keys: &[String],
        shared_keys: &[String],
        server_keys: &[String],
    ) -> Result<Vec<Attribute>> {
        let params: Vec<(&str, String)> = [
            ("clientKeys", client_keys),
            ("sharedKeys", shared_keys),
            ("serverKeys", server_keys),
        ]
        .into_iter()
        .filter(|(_, keys)| !keys.is_empty())
        .map(|(name, keys)| (name, keys.join(",")))
        .collect();

        let request = self
            .authed(
                Method::GET,
                &Self::telemetry_path(device_id, "values/attributes"),
            )?
            .query(&params);
        self.fetch("get attributes", request).await
    }

    async fn post_attributes(
        &self,
        operation: &'static str,
        device_id: &str,
        scope: AttributeScope,
        attributes: &Value,
    ) -> Result<()> {
        let request = self
            .authed(Method::POST, &Self::telemetry_path(device_id, scope.as_str()))?
            .json(attributes);
        self.send(operation, request).await?;
        Ok(())
    }

    pub async fn update_shared_attributes(&self, device_id: &str, attributes: &Value) -> Result<()> {
        self.post_attributes("update shared attributes", device_id, AttributeScope::Shared, attributes)
            .await
    }

    pub async fn update_server_attributes(&self, device_id: &str, attributes: &Value) -> Result<()> {
        self.post_attributes("update server attributes", device_id, AttributeScope::Server, attributes)
            .await
    }

    pub async fn delete_device_attributes(
        &self,
        device_id: &str,
        scope: AttributeScope,
        keys: &[String],
    ) -> Result<()> {
        let request = self
            .authed(Method::DELETE, &Self::telemetry_path(device_id, scope.as_str()))?
            .query(&[("keys", keys.join(","))]);
        self.send("delete attributes", request).await?;
        Ok(())
    }

    // ========================================================================
    // RPC
    // ========================================================================

    pub async fn send_one_way_rpc(&self, device_id: &str, rpc: &RpcRequest) -> Result<()> {
        let request = self
            .authed(Method::POST, &format!("/plugins/rpc/oneway/{device_id}"))?
            .json(rpc);
        self.send("one-way rpc", request).await?;
        Ok(())
    }

    /// Waits up to `timeout_ms` on the platform side for the device reply.
    pub async fn send_two_way_rpc(
        &self,
        device_id: &str,
        rpc: &RpcRequest,
        timeout_ms: u64,
    ) -> Result<Value> {
        let request = self
            .authed(Method::POST, &format!("/plugins/rpc/twoway/{device_id}"))?
            .query(&[("timeout", timeout_ms)])
            .json(rpc);
        self.fetch("two-way rpc", request).await
    }

    // ========================================================================
    // Alarms
    // ========================================================================

    pub async fn get_alarms(
        &self,
        page_size: u32,
        page: u32,
        search_status: Option<AlarmSearchStatus>,
        status: Option<AlarmStatus>,
    ) -> Result<PageData<Alarm>> {
        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(search) = search_status {
            params.push(("searchStatus", search.as_str().to_string()));
        }
        if let Some(status) = status {
            params.push(("status", status.as_str().to_string()));
        }
        let request = self
            .authed(Method::GET, "/alarm/ALARM/query/alarms")?
            .query(&params);
        self.fetch("get alarms", request).await
    }

    pub async fn create_alarm(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let request = self.authed(Method::POST, "/alarm")?.json(alarm);
        self.fetch("create alarm", request).await
    }

    pub async fn acknowledge_alarm(&self, alarm_id: &str) -> Result<()> {
        let request = self.authed(Method::POST, &format!("/alarm/{alarm_id}/ack"))?;
        self.send("acknowledge alarm", request).await?;
        Ok(())
    }

    pub async fn clear_alarm(&self, alarm_id: &str) -> Result<()> {
        let request = self.authed(Method::POST, &format!("/alarm/{alarm_id}/clear"))?;
        self.send("clear alarm", request).await?;
        Ok(())
    }

    pub async fn delete_alarm(&self, alarm_id: &str) -> Result<()> {
        let request = self.authed(Method::DELETE, &format!("/alarm/{alarm_id}"))?;
        self.send("delete alarm", request).await?;
        Ok(())
    }

    // ========================================================================
    // Analytics
    // ========================================================================

    /// Summary over the first 1000 tenant devices.
    pub async fn get_device_stats(&self) -> Result<DeviceStats> {
        let page = self.get_devices(1000, 0).await?;
        let now = chrono::Utc::now().timestamp_millis();
        Ok(analytics::device_stats(&page.data, now))
    }
}
