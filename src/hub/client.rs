//! Client handles registered in the hub.
//!
//! A [`Client`] pairs a [`ClientId`] with the write side of a connection
//! ([`ClientSink`]). The read side is handed to the hub separately as a
//! [`CommandStream`] and drained by the client's inbound task.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::ClientId;
use crate::error::ClientError;

/// Stream of raw inbound command payloads from one client.
///
/// Each item is one message (a WebSocket frame or a TCP line). The stream
/// ends when the peer disconnects.
pub type CommandStream = BoxStream<'static, Result<Vec<u8>, ClientError>>;

/// Transport a client is connected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Raw TCP, line-oriented pushes.
    Tcp,
    /// WebSocket, JSON event pushes.
    Ws,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Ws => f.write_str("websocket"),
        }
    }
}

/// Write side of a client connection.
///
/// Implementations frame `payload` the way their transport expects.
#[async_trait]
pub trait ClientSink: fmt::Debug + Send + Sync {
    /// Address of the connected peer.
    fn remote_addr(&self) -> SocketAddr;

    /// Writes one push message to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the write fails.
    async fn send(&self, payload: &[u8]) -> Result<(), ClientError>;

    /// Closes the connection. Closing twice is harmless.
    async fn close(&self);
}

/// Connection handle owned by the hub.
///
/// Cloning yields a handle with the same [`ClientId`], so re-adding a
/// clone replaces the original registration.
#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    sink: Arc<dyn ClientSink>,
}

impl Client {
    /// Wraps a sink in a new handle with a fresh id.
    #[must_use]
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        Self {
            id: ClientId::new(),
            sink,
        }
    }

    /// Returns the handle's id.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the peer address.
    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.sink.remote_addr()
    }

    pub(crate) async fn send(&self, payload: &[u8]) -> Result<(), ClientError> {
        self.sink.send(payload).await
    }

    pub(crate) async fn close(&self) {
        self.sink.close().await;
    }
}
