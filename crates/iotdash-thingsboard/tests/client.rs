use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use iotdash_thingsboard::models::{
    AlarmSearchStatus, AlarmSeverity, AlarmStatus, EntityId, HistoryQuery, NewAlarm, RpcRequest,
};
use iotdash_thingsboard::{ThingsBoardClient, ThingsBoardConfig, ThingsBoardError};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const TOKEN: &str = "test-jwt";

#[derive(Clone, Default)]
struct Recorded {
    uploads: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn device_json(id: &str, created: i64, ty: &str) -> Value {
    json!({
        "id": {"id": id, "entityType": "DEVICE"},
        "createdTime": created,
        "tenantId": {"id": "tenant", "entityType": "TENANT"},
        "name": format!("dev-{id}"),
        "type": ty,
    })
}

async fn tenant_devices(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no auth"})));
    }
    let now = chrono::Utc::now().timestamp_millis();
    let page_size = params.get("pageSize").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "data": [
                device_json("a", now - 1_000, "sensor"),
                device_json("b", now - 3 * 86_400_000, "sensor"),
                device_json("c", now - 5 * 86_400_000, "gateway"),
            ],
            "totalPages": 1,
            "totalElements": 3,
            "hasNext": false,
            "echoPageSize": page_size,
        })),
    )
}

async fn get_device(Path(id): Path<String>) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Device with id [{id}] not found"))
}

async fn timeseries(
    State(recorded): State<Recorded>,
    Path(_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.queries.lock().unwrap().push(params);
    Json(json!({
        "temperature": [
            {"ts": 3000, "value": "22.5"},
            {"ts": 2000, "value": "22.0"}
        ],
        "humidity": [
            {"ts": 3000, "value": "41"}
        ]
    }))
}

async fn upload(
    State(recorded): State<Recorded>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("x-authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    recorded.uploads.lock().unwrap().push((auth, json!({"token": token, "body": body})));
    StatusCode::OK
}

async fn alarms(
    State(recorded): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.queries.lock().unwrap().push(params);
    Json(json!({"data": [], "totalPages": 0, "totalElements": 0, "hasNext": false}))
}

async fn create_alarm(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": {"id": "alarm-1", "entityType": "ALARM"},
            "createdTime": 1,
            "type": body["type"],
            "originator": body["originator"],
            "severity": body["severity"],
            "status": body["status"],
            "propagate": body["propagate"],
            "startTs": 1
        })),
    )
}

async fn two_way(
    Path(_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(json!({"method": body["method"], "timeout": params.get("timeout")}))
}

async fn spawn_mock() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/tenant/devices", get(tenant_devices))
        .route("/api/device/{id}", get(get_device))
        .route(
            "/api/plugins/telemetry/DEVICE/{id}/values/timeseries",
            get(timeseries),
        )
        .route("/api/v1/{token}/telemetry", post(upload))
        .route("/api/alarm/ALARM/query/alarms", get(alarms))
        .route("/api/alarm", post(create_alarm))
        .route("/api/plugins/rpc/twoway/{id}", post(two_way))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), recorded)
}

fn client(base_url: &str, token: &str) -> ThingsBoardClient {
    ThingsBoardClient::new(&ThingsBoardConfig {
        base_url: base_url.to_string(),
        token: token.to_string(),
        timeout_ms: 5_000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_devices_page_and_stats() {
    let (base, _) = spawn_mock().await;
    let tb = client(&base, TOKEN);

    let page = tb.get_devices(50, 0).await.unwrap();
    assert_eq!(page.data.len(), 3);
    assert_eq!(page.total_elements, 3);
    assert!(!page.has_next);
    assert_eq!(page.data[0].device.device_type, "sensor");

    let stats = tb.get_device_stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.inactive, 2);
    assert_eq!(stats.by_type["sensor"], 2);
}

#[tokio::test]
async fn test_missing_token_never_sends() {
    let (base, _) = spawn_mock().await;
    let tb = client(&base, "");
    let err = tb.get_devices(10, 0).await.unwrap_err();
    assert!(matches!(err, ThingsBoardError::MissingToken));
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let (base, _) = spawn_mock().await;
    let tb = client(&base, TOKEN);
    let err = tb.get_device("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ThingsBoardError::Status { operation, body, .. } => {
            assert_eq!(operation, "get device");
            assert!(body.contains("missing"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let bad_token = client(&base, "wrong");
    let err = bad_token.get_devices(10, 0).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_latest_and_historical_telemetry() {
    let (base, recorded) = spawn_mock().await;
    let tb = client(&base, TOKEN);

    let latest = tb
        .get_latest_telemetry("dev-1", &["temperature".into(), "humidity".into()])
        .await
        .unwrap();
    assert_eq!(latest["temperature"].ts, 3000);
    assert_eq!(latest["humidity"].value, json!("41"));

    let query = HistoryQuery::for_chart(vec!["temperature".into()], 0, 10_000);
    let history = tb.get_historical_telemetry("dev-1", &query).await.unwrap();
    assert_eq!(history["temperature"].len(), 2);

    let queries = recorded.queries.lock().unwrap();
    assert_eq!(queries[0]["keys"], "temperature,humidity");
    assert_eq!(queries[1]["interval"], "100");
    assert_eq!(queries[1]["orderBy"], "ASC");
    assert_eq!(queries[1]["useStrictDataTypes"], "true");
    assert_eq!(queries[1]["agg"], "NONE");
}

#[tokio::test]
async fn test_device_upload_uses_path_token() {
    let (base, recorded) = spawn_mock().await;
    let tb = client(&base, TOKEN);

    tb.send_telemetry("device-token", &json!({"temperature": 21.0}), Some(1234))
        .await
        .unwrap();
    tb.send_telemetry("device-token", &json!({"humidity": 40}), None)
        .await
        .unwrap();

    let uploads = recorded.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 2);
    let (auth, first) = &uploads[0];
    assert!(auth.is_none());
    assert_eq!(first["token"], json!("device-token"));
    assert_eq!(first["body"]["ts"], json!(1234));
    assert_eq!(first["body"]["values"]["temperature"], json!(21.0));
    assert_eq!(uploads[1].1["body"], json!({"humidity": 40}));
}

#[tokio::test]
async fn test_alarm_query_and_create() {
    let (base, recorded) = spawn_mock().await;
    let tb = client(&base, TOKEN);

    let page = tb
        .get_alarms(20, 1, Some(AlarmSearchStatus::Active), None)
        .await
        .unwrap();
    assert!(page.data.is_empty());
    {
        let queries = recorded.queries.lock().unwrap();
        assert_eq!(queries[0]["pageSize"], "20");
        assert_eq!(queries[0]["page"], "1");
        assert_eq!(queries[0]["searchStatus"], "ACTIVE");
        assert!(!queries[0].contains_key("status"));
    }

    let alarm = tb
        .create_alarm(&NewAlarm::new(
            "Temperatura alta",
            EntityId::device("dev-1"),
            AlarmSeverity::Major,
        ))
        .await
        .unwrap();
    assert_eq!(alarm.alarm_type, "Temperatura alta");
    assert_eq!(alarm.status, AlarmStatus::ActiveUnack);
    assert_eq!(alarm.severity, AlarmSeverity::Major);
    assert!(alarm.propagate);
}

#[tokio::test]
async fn test_two_way_rpc_timeout_param() {
    let (base, _) = spawn_mock().await;
    let tb = client(&base, TOKEN);
    let reply = tb
        .send_two_way_rpc("dev-1", &RpcRequest::new("getState", None), 5_000)
        .await
        .unwrap();
    assert_eq!(reply["method"], json!("getState"));
    assert_eq!(reply["timeout"], json!("5000"));
}
