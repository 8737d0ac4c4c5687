//! Rotator implementations.
//!
//! - [`DummyRotator`]: simulated positioner for running without hardware.
//! - [`RotatorProxy`]: mirror of a rotator served by a remote hub.

pub mod dummy;
pub mod proxy;

pub use dummy::{DummyConfig, DummyRotator};
pub use proxy::{ProxyConfig, RotatorProxy};
