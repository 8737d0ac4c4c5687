//! Error types for the hub, its clients, rotators and the proxy.
//!
//! Each layer has its own enum so that callers can tell a fatal listener
//! failure ([`HubError`]) from a per-connection one ([`ClientError`]) or a
//! rejected command ([`RotatorError`]).

use std::io;

use crate::domain::Axis;

/// Fatal hub errors.
///
/// Listener failures are reported once through the listener's fatal
/// channel and are not retried.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener tried to bind.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("http server error: {0}")]
    Serve(#[source] io::Error),

    /// A status could not be serialized for broadcast.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors on a single client connection.
///
/// Any of these causes the client to be removed from the hub; other
/// clients are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Socket read or write failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket protocol or transport failure.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// An inbound command line exceeded the length limit.
    #[error("command line longer than {max} bytes")]
    LineTooLong {
        /// Maximum accepted line length.
        max: usize,
    },
}

/// Errors returned by [`crate::domain::Rotator`] commands.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    /// The requested heading lies outside the axis range.
    #[error("{axis} {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Axis the command targeted.
        axis: Axis,
        /// Requested heading.
        value: i32,
        /// Lowest allowed heading.
        min: i32,
        /// Highest allowed heading.
        max: i32,
    },

    /// The rotator does not have the targeted axis.
    #[error("rotator has no {0} axis")]
    AxisUnavailable(Axis),

    /// The command could not be delivered to the device or remote hub.
    #[error("transport error: {0}")]
    Transport(String),

    /// The command could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors constructing a [`crate::rotator::RotatorProxy`].
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The info request failed or returned an undecodable body.
    #[error("info request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote hub did not describe exactly one rotator.
    #[error("expected information of 1 rotator, but got {0}")]
    UnexpectedRotatorCount(usize),

    /// The event stream could not be opened.
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}
