//! System endpoints: health check.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::hub::Transport;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    /// Name of the served rotator.
    rotator: String,
    /// Connected raw TCP clients.
    tcp_clients: usize,
    /// Connected WebSocket clients.
    ws_clients: usize,
}

/// `GET /health`: service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, the served rotator and connected client counts.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let hub = &state.hub;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            rotator: hub.rotator().name(),
            tcp_clients: hub.client_count(Transport::Tcp).await,
            ws_clients: hub.client_count(Transport::Ws).await,
        }),
    )
}
