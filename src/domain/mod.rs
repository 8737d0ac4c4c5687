//! Domain layer: rotator state, commands, events and the rotator contract.
//!
//! This module holds the types shared by the hub, the transports and the
//! rotator implementations: status snapshots, the command union, the
//! WebSocket event envelope, the in-process event bus and the
//! [`Rotator`] trait.

pub mod client_id;
pub mod event;
pub mod event_bus;
pub mod request;
pub mod rotator;
pub mod status;

pub use client_id::ClientId;
pub use event::{Axis, Event, EventKind, RotatorEvent};
pub use event_bus::EventBus;
pub use request::Request;
pub use rotator::Rotator;
pub use status::{Info, Status};
