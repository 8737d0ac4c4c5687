//! HTTP listener serving the WebSocket endpoint and the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::Hub;
use crate::api;
use crate::app_state::AppState;
use crate::error::HubError;
use crate::ws::handler::ws_handler;

/// Builds the complete HTTP application for `hub`.
pub fn build_app(hub: Arc<Hub>) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { hub })
}

impl Hub {
    /// Binds `host:port` and serves `/ws`, `/info` and the system
    /// endpoints.
    ///
    /// A bind or server failure is sent once on `fatal`.
    pub async fn listen_ws(
        self: Arc<Self>,
        host: String,
        port: u16,
        fatal: oneshot::Sender<HubError>,
    ) {
        let listener = match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => listener,
            Err(source) => {
                let err = HubError::Bind {
                    addr: format!("{host}:{port}"),
                    source,
                };
                tracing::error!(error = %err, "http listener failed");
                let _ = fatal.send(err);
                return;
            }
        };
        tracing::info!(%host, port, "listening for http and websocket connections");
        if let Err(err) = self.serve_http(listener).await {
            tracing::error!(error = %err, "http server stopped");
            let _ = fatal.send(err);
        }
    }

    /// Serves the HTTP application on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serve`] if the server stops with an I/O error.
    pub async fn serve_http(self: Arc<Self>, listener: TcpListener) -> Result<(), HubError> {
        let app = build_app(self);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(HubError::Serve)
    }
}
