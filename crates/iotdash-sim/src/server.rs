//! HTTP surface over the [`crate::api`] handlers.

use crate::api::{
    self, ApiError, ConfigurationDocument, ControlRequest, HealthResponse, SharedState,
    SimulationQuery,
};
use crate::config::RegisteredDevice;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, info};

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, Json(self.body())).into_response()
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/simulate", get(poll_handler).post(control_handler))
        .route("/api/configuration", get(configuration_handler))
        .route("/api/devices", get(devices_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn poll_handler(
    State(state): State<SharedState>,
    Query(query): Query<SimulationQuery>,
) -> Result<Response, ApiError> {
    debug!(module = ?query.module, device_id = ?query.device_id, "poll");
    let response = api::handle_poll(&state, &query)?;
    Ok(Json(response).into_response())
}

/// The body is parsed leniently: anything that is not `{"action": ...}`
/// becomes an invalid action rather than an extractor rejection.
async fn control_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ControlRequest = serde_json::from_slice(&body).unwrap_or_default();
    let response = api::handle_control(&state, &request)?;
    Ok(Json(response).into_response())
}

async fn configuration_handler(State(state): State<SharedState>) -> Json<ConfigurationDocument> {
    Json(api::handle_get_configuration(&state))
}

async fn devices_handler(State(state): State<SharedState>) -> Json<Vec<RegisteredDevice>> {
    Json(api::handle_list_devices(&state))
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(api::handle_health(&state))
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "iotdash listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
