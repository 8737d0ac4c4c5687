//! HTTP API layer: info and health endpoints plus their OpenAPI document.

pub mod handlers;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::domain::{Info, Status};
use handlers::system::HealthResponse;

/// OpenAPI description of the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(handlers::info::info_handler, handlers::system::health_handler),
    components(schemas(Info, Status, HealthResponse)),
    tags(
        (name = "Rotator", description = "Rotator state"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the router with all HTTP endpoints except the WebSocket upgrade.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/info", get(handlers::info::info_handler))
        .route("/health", get(handlers::system::health_handler))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}
