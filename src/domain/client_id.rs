//! Type-safe client identifier.
//!
//! [`ClientId`] wraps a [`uuid::Uuid`] (v4) so that a connection handle can
//! be registered, replaced and removed without comparing socket addresses.

use std::fmt;

/// Unique identifier of a connected client.
///
/// Generated once when the client handle is created and used as the key
/// of the per-transport client sets in [`crate::hub::Hub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    /// Creates a new random `ClientId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
