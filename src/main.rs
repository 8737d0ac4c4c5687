//! rotator-hub server entry point.
//!
//! Builds the configured rotator, then serves it over TCP and
//! HTTP/WebSocket until a listener fails, the proxied hub goes away, or
//! the process is interrupted.

use std::future::pending;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use rotator_hub::config::{Backend, HubConfig};
use rotator_hub::domain::{EventBus, Rotator};
use rotator_hub::error::HubError;
use rotator_hub::hub::Hub;
use rotator_hub::rotator::{DummyRotator, RotatorProxy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config =
        HubConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Build rotator
    let event_bus = EventBus::new(config.event_bus_capacity);
    let mut proxy_done = None;
    let rotator: Arc<dyn Rotator> = match &config.backend {
        Backend::Dummy(dummy) => Arc::new(DummyRotator::spawn(
            dummy.clone(),
            Some(event_bus.clone()),
        )),
        Backend::Proxy(proxy) => {
            let (done_tx, done_rx) = oneshot::channel();
            proxy_done = Some(done_rx);
            let proxy = RotatorProxy::connect(proxy, Some(event_bus.clone()), done_tx)
                .await
                .with_context(|| {
                    format!("connecting to remote hub {}:{}", proxy.host, proxy.port)
                })?;
            Arc::new(proxy)
        }
    };
    tracing::info!(name = %rotator.name(), "rotator ready");

    // Build hub
    let hub = Arc::new(Hub::new(rotator));
    tokio::spawn(Arc::clone(&hub).run_broadcast_pump(event_bus.subscribe()));

    // Start listeners
    let tcp_fatal = config.tcp_enabled.then(|| {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(Arc::clone(&hub).listen_tcp(
            config.tcp_host.clone(),
            config.tcp_port,
            tx,
        ));
        rx
    });
    let http_fatal = config.http_enabled.then(|| {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(Arc::clone(&hub).listen_ws(
            config.http_host.clone(),
            config.http_port,
            tx,
        ));
        rx
    });

    tokio::select! {
        err = fatal(tcp_fatal) => Err(listener_error("tcp", err)),
        err = fatal(http_fatal) => Err(listener_error("http", err)),
        () = closed(proxy_done) => {
            tracing::error!("connection to remote hub lost");
            anyhow::bail!("connection to remote hub lost")
        }
        res = tokio::signal::ctrl_c() => {
            res.context("waiting for ctrl-c")?;
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

/// Resolves when a listener reports failure; never resolves for a
/// disabled listener.
async fn fatal(rx: Option<oneshot::Receiver<HubError>>) -> Option<HubError> {
    match rx {
        Some(rx) => rx.await.ok(),
        None => pending().await,
    }
}

/// Resolves when the proxy's event stream ends.
async fn closed(rx: Option<oneshot::Receiver<()>>) {
    match rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => pending().await,
    }
}

fn listener_error(listener: &str, err: Option<HubError>) -> anyhow::Error {
    match err {
        Some(err) => anyhow::Error::new(err).context(format!("{listener} listener failed")),
        None => anyhow::anyhow!("{listener} listener stopped"),
    }
}
