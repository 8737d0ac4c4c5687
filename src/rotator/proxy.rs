//! Rotator backed by a remote hub.
//!
//! [`RotatorProxy`] fetches the remote rotator's [`Info`] once over HTTP,
//! then keeps a local mirror up to date from the remote WebSocket event
//! stream and forwards commands as JSON requests over the same socket.
//! Hubs can be chained this way: a proxy is served by a local hub exactly
//! like a hardware driver.
//!
//! # Failure behaviour
//!
//! Construction fails fast and never retries. Once connected, a broken
//! stream leaves the proxy as a stale, read-only mirror and fires the
//! completion signal handed to [`RotatorProxy::connect`]; the caller is
//! expected to rebuild the proxy.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::domain::{
    Axis, Event, EventBus, EventKind, Info, Request, Rotator, RotatorEvent, Status,
};
use crate::error::{ProxyError, RotatorError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Location of the remote hub.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Host name or IP address of the remote hub.
    pub host: String,
    /// HTTP/WebSocket port of the remote hub.
    pub port: u16,
    /// Timeout of the bootstrap info request.
    pub timeout: Duration,
}

impl ProxyConfig {
    /// Creates a config with the default 3 second info timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(3),
        }
    }

    fn info_url(&self) -> String {
        format!("http://{}:{}/info", self.host, self.port)
    }

    fn ws_url(&self) -> String {
        format!("ws://{}:{}/ws", self.host, self.port)
    }
}

/// Local mirror of the remote rotator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ProxyCache {
    info: Info,
}

impl ProxyCache {
    /// Copies changed heading fields from `status`, returning the axes
    /// that changed.
    fn apply_heading(&mut self, status: &Status) -> Vec<Axis> {
        let info = &mut self.info;
        let mut changed = Vec::with_capacity(2);

        let mut azimuth_changed = false;
        if info.azimuth != status.azimuth {
            info.azimuth = status.azimuth;
            azimuth_changed = true;
        }
        if info.az_preset != status.az_preset {
            info.az_preset = status.az_preset;
            azimuth_changed = true;
        }
        if azimuth_changed {
            changed.push(Axis::Azimuth);
        }

        let mut elevation_changed = false;
        if info.elevation != status.elevation {
            info.elevation = status.elevation;
            elevation_changed = true;
        }
        if info.el_preset != status.el_preset {
            info.el_preset = status.el_preset;
            elevation_changed = true;
        }
        if elevation_changed {
            changed.push(Axis::Elevation);
        }

        changed
    }
}

/// A [`Rotator`] mirroring a rotator served by a remote hub.
#[derive(Debug)]
pub struct RotatorProxy {
    cache: Arc<RwLock<ProxyCache>>,
    writer: Mutex<SplitSink<WsStream, Message>>,
}

impl RotatorProxy {
    /// Connects to the hub described by `config`.
    ///
    /// Fetches the remote info, seeds the cache, opens the event stream
    /// and spawns its receive loop. Change notifications are published on
    /// `events` when given. `done` fires once the event stream ends.
    ///
    /// # Errors
    ///
    /// - [`ProxyError::Http`] if the info request fails or times out.
    /// - [`ProxyError::UnexpectedRotatorCount`] unless the remote hub
    ///   describes exactly one rotator. No WebSocket is dialed then.
    /// - [`ProxyError::Connect`] if the event stream cannot be opened.
    pub async fn connect(
        config: &ProxyConfig,
        events: Option<EventBus>,
        done: oneshot::Sender<()>,
    ) -> Result<Self, ProxyError> {
        let info = fetch_info(config).await?;
        tracing::info!(
            remote = %config.info_url(),
            name = %info.name,
            "fetched remote rotator info"
        );
        let cache = Arc::new(RwLock::new(ProxyCache { info }));

        let (stream, _response) = tokio_tungstenite::connect_async(config.ws_url()).await?;
        tracing::info!(remote = %config.ws_url(), "connected to remote event stream");
        let (writer, reader) = stream.split();

        tokio::spawn(receive_loop(reader, Arc::clone(&cache), events, done));

        Ok(Self {
            cache,
            writer: Mutex::new(writer),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ProxyCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn write(&self, request: Request) -> Result<(), RotatorError> {
        let json = serde_json::to_string(&request)?;
        self.writer
            .lock()
            .await
            .send(Message::text(json))
            .await
            .map_err(|e| RotatorError::Transport(e.to_string()))
    }
}

async fn fetch_info(config: &ProxyConfig) -> Result<Info, ProxyError> {
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    let infos: Vec<Info> = client
        .get(config.info_url())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    single_info(infos)
}

/// Accepts a descriptor list only if it holds exactly one rotator.
fn single_info(infos: Vec<Info>) -> Result<Info, ProxyError> {
    let count = infos.len();
    let mut iter = infos.into_iter();
    match (iter.next(), iter.next()) {
        (Some(info), None) => Ok(info),
        _ => Err(ProxyError::UnexpectedRotatorCount(count)),
    }
}

async fn receive_loop(
    mut reader: SplitStream<WsStream>,
    cache: Arc<RwLock<ProxyCache>>,
    events: Option<EventBus>,
    done: oneshot::Sender<()>,
) {
    while let Some(message) = reader.next().await {
        let decoded = match message {
            Ok(Message::Text(text)) => serde_json::from_str::<Event>(text.as_str()),
            Ok(Message::Binary(data)) => serde_json::from_slice::<Event>(&data),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                if !is_clean_close(&e) {
                    tracing::warn!(error = %e, "remote event stream failed");
                }
                break;
            }
        };
        match decoded {
            Ok(event) => apply_event(&cache, events.as_ref(), event),
            Err(e) => tracing::warn!(error = %e, "dropping undecodable remote event"),
        }
    }
    tracing::info!("remote event stream closed");
    let _ = done.send(());
}

fn is_clean_close(error: &tungstenite::Error) -> bool {
    match error {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}

/// Applies one remote event to the cache and publishes a notification per
/// changed axis. Never blocks on subscribers.
fn apply_event(cache: &RwLock<ProxyCache>, events: Option<&EventBus>, event: Event) {
    match event.name {
        EventKind::Add | EventKind::Remove => {}
        EventKind::Heading => {
            let (changed, status) = {
                let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
                let changed = cache.apply_heading(&event.status);
                (changed, cache.info.status())
            };
            if let Some(bus) = events {
                for axis in changed {
                    bus.publish(RotatorEvent {
                        axis,
                        status: status.clone(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Rotator for RotatorProxy {
    fn name(&self) -> String {
        self.read().info.name.clone()
    }

    fn has_azimuth(&self) -> bool {
        self.read().info.has_azimuth
    }

    fn has_elevation(&self) -> bool {
        self.read().info.has_elevation
    }

    fn azimuth(&self) -> i32 {
        self.read().info.azimuth
    }

    fn az_preset(&self) -> i32 {
        self.read().info.az_preset
    }

    fn elevation(&self) -> i32 {
        self.read().info.elevation
    }

    fn el_preset(&self) -> i32 {
        self.read().info.el_preset
    }

    fn status(&self) -> Status {
        self.read().info.status()
    }

    fn info(&self) -> Info {
        self.read().info.clone()
    }

    async fn set_azimuth(&self, azimuth: i32) -> Result<(), RotatorError> {
        self.write(Request::SetAzimuth(azimuth)).await
    }

    async fn set_elevation(&self, elevation: i32) -> Result<(), RotatorError> {
        self.write(Request::SetElevation(elevation)).await
    }

    async fn stop_azimuth(&self) -> Result<(), RotatorError> {
        self.write(Request::StopAzimuth).await
    }

    async fn stop_elevation(&self) -> Result<(), RotatorError> {
        self.write(Request::StopElevation).await
    }

    async fn stop(&self) -> Result<(), RotatorError> {
        self.write(Request::Stop).await
    }

    async fn execute_request(&self, request: Request) -> Result<(), RotatorError> {
        self.write(request).await
    }
}
