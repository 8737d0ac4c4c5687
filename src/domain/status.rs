//! Rotator state snapshots: [`Status`] and [`Info`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immutable snapshot of a rotator's current heading and presets.
///
/// Pushed to every client whenever the rotator reports a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Rotator name.
    pub name: String,
    /// Current azimuth in degrees.
    pub azimuth: i32,
    /// Commanded azimuth in degrees.
    pub az_preset: i32,
    /// Whether the azimuth axis can travel past 360°.
    pub azimuth_overlap: bool,
    /// Current elevation in degrees.
    pub elevation: i32,
    /// Commanded elevation in degrees.
    pub el_preset: i32,
}

impl Status {
    /// Encodes the heading as a TCP push line: `+0AAA+0EEE\r\n`.
    ///
    /// Some logging programs only understand the combined form, so both
    /// axes are always sent even when a rotator has no elevation. A
    /// negative heading keeps three digits after its sign (`+0-005`).
    #[must_use]
    pub fn to_tcp_line(&self) -> String {
        format!(
            "+0{}+0{}\r\n",
            three_digits(self.azimuth),
            three_digits(self.elevation)
        )
    }
}

fn three_digits(value: i32) -> String {
    if value < 0 {
        format!("-{:03}", value.unsigned_abs())
    } else {
        format!("{value:03}")
    }
}

/// Static capabilities plus current heading of a rotator.
///
/// Served as a single-element array by `GET /info` and used by the proxy
/// to seed its cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// Rotator name.
    pub name: String,
    /// Whether the rotator has an azimuth axis.
    pub has_azimuth: bool,
    /// Whether the rotator has an elevation axis.
    pub has_elevation: bool,
    /// Lowest reachable azimuth.
    pub azimuth_min: i32,
    /// Highest reachable azimuth.
    pub azimuth_max: i32,
    /// Mechanical stop position of the azimuth axis.
    pub azimuth_stop: i32,
    /// Whether the azimuth axis can travel past 360°.
    pub azimuth_overlap: bool,
    /// Lowest reachable elevation.
    pub elevation_min: i32,
    /// Highest reachable elevation.
    pub elevation_max: i32,
    /// Mechanical stop position of the elevation axis.
    pub elevation_stop: i32,
    /// Current azimuth in degrees.
    pub azimuth: i32,
    /// Commanded azimuth in degrees.
    pub az_preset: i32,
    /// Current elevation in degrees.
    pub elevation: i32,
    /// Commanded elevation in degrees.
    pub el_preset: i32,
}

impl Info {
    /// Returns the current-heading part of this descriptor.
    #[must_use]
    pub fn status(&self) -> Status {
        Status {
            name: self.name.clone(),
            azimuth: self.azimuth,
            az_preset: self.az_preset,
            azimuth_overlap: self.azimuth_overlap,
            elevation: self.elevation,
            el_preset: self.el_preset,
        }
    }
}
