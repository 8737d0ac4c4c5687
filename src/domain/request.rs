//! Rotator commands received from clients.
//!
//! On the wire a command is a presence-based object where only populated
//! fields act. Internally it is the tagged [`Request`] enum; the
//! [`RequestWire`] adapter converts between the two.

use serde::{Deserialize, Serialize};

/// A single rotator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestWire", into = "RequestWire")]
pub enum Request {
    /// Turn the azimuth axis to the given heading.
    SetAzimuth(i32),
    /// Turn the elevation axis to the given heading.
    SetElevation(i32),
    /// Halt the azimuth axis.
    StopAzimuth,
    /// Halt the elevation axis.
    StopElevation,
    /// Halt all axes.
    Stop,
}

/// Wire representation of a [`Request`].
///
/// ```json
/// {"azimuth": 120}
/// {"stopElevation": true}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWire {
    /// Target azimuth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<i32>,
    /// Target elevation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i32>,
    /// Stop the azimuth axis.
    #[serde(default, skip_serializing_if = "is_false")]
    pub stop_azimuth: bool,
    /// Stop the elevation axis.
    #[serde(default, skip_serializing_if = "is_false")]
    pub stop_elevation: bool,
    /// Stop everything.
    #[serde(default, skip_serializing_if = "is_false")]
    pub stop: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// Returned when a wire request carries no actionable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request contains no command")]
pub struct EmptyRequest;

impl TryFrom<RequestWire> for Request {
    type Error = EmptyRequest;

    /// Picks the single command to act on. Stops win over moves.
    fn try_from(wire: RequestWire) -> Result<Self, Self::Error> {
        if wire.stop {
            Ok(Self::Stop)
        } else if wire.stop_azimuth {
            Ok(Self::StopAzimuth)
        } else if wire.stop_elevation {
            Ok(Self::StopElevation)
        } else if let Some(az) = wire.azimuth {
            Ok(Self::SetAzimuth(az))
        } else if let Some(el) = wire.elevation {
            Ok(Self::SetElevation(el))
        } else {
            Err(EmptyRequest)
        }
    }
}

impl From<Request> for RequestWire {
    fn from(req: Request) -> Self {
        let mut wire = Self::default();
        match req {
            Request::SetAzimuth(az) => wire.azimuth = Some(az),
            Request::SetElevation(el) => wire.elevation = Some(el),
            Request::StopAzimuth => wire.stop_azimuth = true,
            Request::StopElevation => wire.stop_elevation = true,
            Request::Stop => wire.stop = true,
        }
        wire
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<Request, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn decodes_each_command() {
        assert_eq!(decode(r#"{"azimuth":120}"#).ok(), Some(Request::SetAzimuth(120)));
        assert_eq!(decode(r#"{"elevation":45}"#).ok(), Some(Request::SetElevation(45)));
        assert_eq!(decode(r#"{"stopAzimuth":true}"#).ok(), Some(Request::StopAzimuth));
        assert_eq!(decode(r#"{"stopElevation":true}"#).ok(), Some(Request::StopElevation));
        assert_eq!(decode(r#"{"stop":true}"#).ok(), Some(Request::Stop));
    }

    #[test]
    fn empty_object_is_rejected() {
        assert!(decode("{}").is_err());
    }

    #[test]
    fn false_flags_are_no_ops() {
        assert!(decode(r#"{"stop":false,"stopAzimuth":false}"#).is_err());
        assert_eq!(
            decode(r#"{"stop":false,"azimuth":10}"#).ok(),
            Some(Request::SetAzimuth(10))
        );
    }

    #[test]
    fn stop_takes_precedence_over_moves() {
        assert_eq!(
            decode(r#"{"azimuth":10,"elevation":20,"stop":true}"#).ok(),
            Some(Request::Stop)
        );
        assert_eq!(
            decode(r#"{"azimuth":10,"elevation":20}"#).ok(),
            Some(Request::SetAzimuth(10))
        );
    }

    #[test]
    fn encodes_only_populated_field() {
        let json = serde_json::to_string(&Request::SetElevation(30)).unwrap_or_default();
        assert_eq!(json, r#"{"elevation":30}"#);
        let json = serde_json::to_string(&Request::StopAzimuth).unwrap_or_default();
        assert_eq!(json, r#"{"stopAzimuth":true}"#);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        assert_eq!(
            decode(r#"{"azimuth":90,"speed":3}"#).ok(),
            Some(Request::SetAzimuth(90))
        );
    }
}
