//! The rotator contract shared by local drivers and remote proxies.

use std::fmt;

use async_trait::async_trait;

use super::{Info, Request, Status};
use crate::error::RotatorError;

/// An antenna positioner.
///
/// Accessors return cached state and never block on I/O. Commands are
/// asynchronous and report only whether the command was accepted; the
/// resulting movement is observed through the rotator's
/// [`super::EventBus`].
#[async_trait]
pub trait Rotator: fmt::Debug + Send + Sync {
    /// Rotator name.
    fn name(&self) -> String;

    /// Whether the rotator has an azimuth axis.
    fn has_azimuth(&self) -> bool;

    /// Whether the rotator has an elevation axis.
    fn has_elevation(&self) -> bool;

    /// Current azimuth.
    fn azimuth(&self) -> i32;

    /// Commanded azimuth.
    fn az_preset(&self) -> i32;

    /// Current elevation.
    fn elevation(&self) -> i32;

    /// Commanded elevation.
    fn el_preset(&self) -> i32;

    /// Snapshot of the current heading and presets.
    fn status(&self) -> Status;

    /// Static capabilities plus current heading.
    fn info(&self) -> Info;

    /// Turns the azimuth axis to `azimuth`.
    ///
    /// # Errors
    ///
    /// Returns [`RotatorError`] if the command cannot be delivered or is
    /// rejected.
    async fn set_azimuth(&self, azimuth: i32) -> Result<(), RotatorError>;

    /// Turns the elevation axis to `elevation`.
    ///
    /// # Errors
    ///
    /// Returns [`RotatorError`] if the command cannot be delivered or is
    /// rejected.
    async fn set_elevation(&self, elevation: i32) -> Result<(), RotatorError>;

    /// Halts the azimuth axis.
    ///
    /// # Errors
    ///
    /// Returns [`RotatorError`] if the command cannot be delivered.
    async fn stop_azimuth(&self) -> Result<(), RotatorError>;

    /// Halts the elevation axis.
    ///
    /// # Errors
    ///
    /// Returns [`RotatorError`] if the command cannot be delivered.
    async fn stop_elevation(&self) -> Result<(), RotatorError>;

    /// Halts all axes.
    ///
    /// # Errors
    ///
    /// Returns [`RotatorError`] if the command cannot be delivered.
    async fn stop(&self) -> Result<(), RotatorError>;

    /// Executes a decoded client [`Request`].
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying command.
    async fn execute_request(&self, request: Request) -> Result<(), RotatorError> {
        match request {
            Request::SetAzimuth(az) => self.set_azimuth(az).await,
            Request::SetElevation(el) => self.set_elevation(el).await,
            Request::StopAzimuth => self.stop_azimuth().await,
            Request::StopElevation => self.stop_elevation().await,
            Request::Stop => self.stop().await,
        }
    }
}
