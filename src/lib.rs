//! # rotator-hub
//!
//! Network front-end for antenna rotators.
//!
//! A [`hub::Hub`] makes one rotator available to many clients at once:
//! every heading change is pushed to all of them, and any of them may
//! send commands. A [`rotator::RotatorProxy`] does the opposite: it turns
//! a remote hub back into a local rotator, so hubs can be chained.
//!
//! ## Architecture
//!
//! ```text
//! Clients (TCP, WebSocket, HTTP)
//!     │
//!     ├── TCP listener (hub::tcp)
//!     ├── WS Handler (ws/) + Info endpoint (api/)
//!     │
//!     ├── Hub (hub/) ◄── broadcast pump ◄── EventBus (domain/)
//!     │                                        ▲
//!     └── Rotator (domain/) ───────────────────┘
//!           ├── DummyRotator (rotator/)
//!           └── RotatorProxy (rotator/) ──► remote Hub
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod rotator;
pub mod ws;
