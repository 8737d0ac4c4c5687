//! Events: the WebSocket wire envelope and in-process change notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Status;

/// Discriminator of a wire [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A rotator was added to the server.
    Add,
    /// A rotator was removed from the server.
    Remove,
    /// The heading or presets of a rotator changed.
    Heading,
}

/// Event pushed to WebSocket clients.
///
/// ```json
/// {"name": "heading", "status": {"name": "yaesu", "azimuth": 120, ...}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event discriminator.
    pub name: EventKind,
    /// Rotator status at the time of the event.
    pub status: Status,
}

impl Event {
    /// Builds a `heading` event.
    #[must_use]
    pub fn heading(status: Status) -> Self {
        Self {
            name: EventKind::Heading,
            status,
        }
    }
}

/// Rotator axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal axis.
    Azimuth,
    /// Vertical axis.
    Elevation,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Azimuth => f.write_str("azimuth"),
            Self::Elevation => f.write_str("elevation"),
        }
    }
}

/// Change notification published by a rotator on its [`super::EventBus`].
///
/// One notification is emitted per axis whose heading or preset changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorEvent {
    /// Axis that changed.
    pub axis: Axis,
    /// Status after the change.
    pub status: Status,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn heading_event_wire_shape() {
        let event = Event::heading(Status {
            name: "yaesu".to_string(),
            azimuth: 90,
            ..Status::default()
        });
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value["name"], "heading");
        assert_eq!(value["status"]["name"], "yaesu");
        assert_eq!(value["status"]["azimuth"], 90);
    }

    #[test]
    fn decodes_add_and_remove() {
        let json = r#"{"name":"add","status":{"name":"a","azimuth":0,"azPreset":0,"azimuthOverlap":false,"elevation":0,"elPreset":0}}"#;
        let Ok(event) = serde_json::from_str::<Event>(json) else {
            panic!("decode failed");
        };
        assert_eq!(event.name, EventKind::Add);

        let json = json.replace("\"add\"", "\"remove\"");
        let Ok(event) = serde_json::from_str::<Event>(&json) else {
            panic!("decode failed");
        };
        assert_eq!(event.name, EventKind::Remove);
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let json = r#"{"name":"rename","status":{"name":"a","azimuth":0,"azPreset":0,"azimuthOverlap":false,"elevation":0,"elPreset":0}}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }

    #[test]
    fn axis_display() {
        assert_eq!(Axis::Azimuth.to_string(), "azimuth");
        assert_eq!(Axis::Elevation.to_string(), "elevation");
    }
}
