//! WebSocket transport: upgrade handler and client connections.
//!
//! The endpoint at `/ws` pushes `heading` events as binary JSON frames
//! and accepts JSON requests in text or binary frames.

pub mod connection;
pub mod handler;
