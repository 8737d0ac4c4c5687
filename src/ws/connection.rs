//! A single WebSocket client connection.
//!
//! [`WsClient::split`] separates an upgraded socket into the hub-owned
//! sink and the inbound command stream drained by the hub.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{self, SplitSink};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use crate::error::ClientError;
use crate::hub::{ClientSink, CommandStream};

/// Write half of a WebSocket client connection.
#[derive(Debug)]
pub struct WsClient {
    addr: SocketAddr,
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsClient {
    /// Splits an upgraded socket into a sink and a command stream.
    ///
    /// Text and binary frames are yielded as command payloads; control
    /// frames are skipped and a close frame ends the stream.
    pub fn split(socket: WebSocket, addr: SocketAddr) -> (Self, CommandStream) {
        let (sink, rx) = socket.split();
        let inbound = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.next().await? {
                    Ok(Message::Text(text)) => {
                        return Some((Ok(text.as_str().as_bytes().to_vec()), rx));
                    }
                    Ok(Message::Binary(data)) => return Some((Ok(data.to_vec()), rx)),
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => {}
                    Err(e) => return Some((Err(ClientError::WebSocket(e.to_string())), rx)),
                }
            }
        })
        .boxed();
        (
            Self {
                addr,
                sink: Mutex::new(sink),
            },
            inbound,
        )
    }
}

#[async_trait]
impl ClientSink for WsClient {
    fn remote_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn send(&self, payload: &[u8]) -> Result<(), ClientError> {
        self.sink
            .lock()
            .await
            .send(Message::binary(payload.to_vec()))
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))
    }

    async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
    }
}
