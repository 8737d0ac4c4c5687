//! Raw TCP transport.
//!
//! Pushes are `+0AAA+0EEE\r\n` lines; inbound commands are
//! newline-delimited JSON requests.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, oneshot};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

use super::{Client, ClientSink, CommandStream, Hub, Transport};
use crate::error::{ClientError, HubError};

/// Longest accepted inbound command line in bytes, excluding the newline.
///
/// A peer that exceeds it is disconnected.
pub const MAX_COMMAND_LEN: usize = 4096;

/// Write half of a TCP client connection.
#[derive(Debug)]
pub struct TcpClient {
    addr: SocketAddr,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpClient {
    /// Splits an accepted stream into a sink and a line-based command
    /// stream.
    ///
    /// Lines are yielded as raw bytes, so a line that is not valid UTF-8
    /// reaches the request decoder like any other malformed command. A
    /// line longer than [`MAX_COMMAND_LEN`] ends the stream with
    /// [`ClientError::LineTooLong`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the peer address is unavailable.
    pub fn split(stream: TcpStream) -> Result<(Self, CommandStream), ClientError> {
        let addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let codec =
            AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_COMMAND_LEN);
        let inbound = FramedRead::new(reader, codec)
            .map(|line| line.map(|bytes| bytes.to_vec()).map_err(line_error))
            .boxed();
        Ok((
            Self {
                addr,
                writer: Mutex::new(writer),
            },
            inbound,
        ))
    }
}

fn line_error(err: AnyDelimiterCodecError) -> ClientError {
    match err {
        AnyDelimiterCodecError::MaxChunkLengthExceeded => ClientError::LineTooLong {
            max: MAX_COMMAND_LEN,
        },
        AnyDelimiterCodecError::Io(e) => ClientError::Io(e),
    }
}

#[async_trait]
impl ClientSink for TcpClient {
    fn remote_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn send(&self, payload: &[u8]) -> Result<(), ClientError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload).await?;
        Ok(())
    }

    async fn close(&self) {
        let _ = self.writer.lock().await.shutdown().await;
    }
}

impl Hub {
    /// Binds `host:port` and accepts TCP clients until the process exits.
    ///
    /// A bind failure is sent once on `fatal` and the listener gives up.
    pub async fn listen_tcp(
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
                tracing::error!(error = %err, "tcp listener failed");
                let _ = fatal.send(err);
                return;
            }
        };
        tracing::info!(%host, port, "listening for tcp connections");
        self.serve_tcp(listener).await;
    }

    /// Accepts TCP clients from an already bound listener.
    pub async fn serve_tcp(self: Arc<Self>, listener: TcpListener) {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "tcp accept failed");
                    continue;
                }
            };
            match TcpClient::split(stream) {
                Ok((sink, inbound)) => {
                    self.add_client(Transport::Tcp, Client::new(Arc::new(sink)), inbound)
                        .await;
                }
                Err(e) => tracing::warn!(error = %e, "dropping tcp connection"),
            }
        }
    }
}
