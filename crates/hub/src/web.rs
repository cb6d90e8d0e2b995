use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use crate::device::DeviceState;
use crate::service::{IngestPayload, Service};
use crate::store::{Reading, StoreError};

const DASHBOARD_HTML: &str = include_str!("ui/dashboard.html");

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Wire-level error body. A store failure becomes a 500, a bad `{state}`
/// path segment a 400; either way the error is logged, returned, and never
/// retried, and the next request starts clean.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/data", post(ingest))
        .route("/get_data", get(get_data))
        .route("/clear_data", post(clear_data))
        .route("/led/{state}", post(led_set))
        .route("/led_status", get(led_status))
        .route("/get_led_status", get(led_status))
        .route("/toggle_led", get(toggle_led).post(toggle_led))
        .route("/motion/{state}", post(motion_set))
        .route("/motion_status", get(motion_status))
        .route("/dashboard", get(dashboard))
        .with_state(service)
}

async fn home() -> Html<&'static str> {
    Html("<h3>Telemetry hub running</h3><a href=\"/dashboard\">Dashboard</a>")
}

async fn ingest(
    State(service): State<Arc<Service>>,
    Json(payload): Json<IngestPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.ingest(payload).await?;
    Ok(Json(json!({ "message": "Data saved successfully" })))
}

async fn get_data(State(service): State<Arc<Service>>) -> Result<Json<Vec<Reading>>, ApiError> {
    Ok(Json(service.history().await?))
}

async fn clear_data(
    State(service): State<Arc<Service>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.clear_history().await?;
    Ok(Json(json!({ "message": "All readings cleared" })))
}

/// Parse the `{state}` path segment of the switch endpoints.
fn parse_switch(state: &str) -> Result<bool, ApiError> {
    match state.to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "unknown state '{other}' (use on/off)"
        ))),
    }
}

async fn led_set(
    State(service): State<Arc<Service>>,
    Path(state): Path<String>,
) -> Result<Json<DeviceState>, ApiError> {
    let on = parse_switch(&state)?;
    Ok(Json(service.set_led(on).await?))
}

async fn led_status(
    State(service): State<Arc<Service>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = service.device_state().await?;
    Ok(Json(json!({ "status": state.led_on })))
}

async fn toggle_led(
    State(service): State<Arc<Service>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = service.toggle_led().await?;
    Ok(Json(json!({ "led": state.led_on })))
}

async fn motion_set(
    State(service): State<Arc<Service>>,
    Path(state): Path<String>,
) -> Result<Json<DeviceState>, ApiError> {
    let on = parse_switch(&state)?;
    Ok(Json(service.set_motion_monitoring(on).await?))
}

async fn motion_status(
    State(service): State<Arc<Service>>,
) -> Result<Json<DeviceState>, ApiError> {
    Ok(Json(service.device_state().await?))
}

async fn dashboard() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        DASHBOARD_HTML,
    )
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(service: Arc<Service>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on http://{addr}");

    axum::serve(listener, router(service))
        .await
        .context("web server error")?;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
