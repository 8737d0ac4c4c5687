//! Rotator info endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::app_state::AppState;
use crate::domain::Info;

/// `GET /info`: describe the served rotator.
///
/// Always an array so that multi-rotator servers keep the same shape.
#[utoipa::path(
    get,
    path = "/info",
    tag = "Rotator",
    summary = "Rotator info",
    description = "Returns the capabilities and current heading of every rotator served by this hub.",
    responses(
        (status = 200, description = "Rotator descriptors", body = Vec<Info>),
    )
)]
pub async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(vec![state.hub.rotator().info()]))
}
