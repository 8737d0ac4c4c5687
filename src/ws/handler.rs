//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::WsClient;
use crate::app_state::AppState;
use crate::hub::{Client, Transport};

/// `GET /ws`: upgrade HTTP connection to WebSocket and register the
/// client with the hub.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sink, inbound) = WsClient::split(socket, addr);
        state
            .hub
            .add_client(Transport::Ws, Client::new(Arc::new(sink)), inbound)
            .await;
    })
}
