//! Broadcast message: the complete PPI image plus contacts, sent to every
//! subscriber of a radar once per rotation.

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// One rotation's worth of radar output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Radar id.
    pub id: u32,
    /// Unix seconds at export time.
    pub timestamp: i64,
    /// Maximum range of the radar (meters).
    pub range: f64,
    /// PPI image, `rows = 360 / resolution`, `cols = range bins`.
    #[serde(rename = "PPI")]
    pub ppi: Vec<Vec<u32>>,
    /// Contacts seen by the beam during the rotation.
    pub ships: Vec<ShipView>,
    #[serde(rename = "radarLocation")]
    pub radar_location: Position,
}

/// A contact as reported to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    #[serde(rename = "Id")]
    pub id: u32,
    /// World position at export time.
    #[serde(rename = "Position")]
    pub position: Position,
    /// Beam azimuth (degrees) when the contact was last seen.
    #[serde(rename = "Azimuth")]
    pub azimuth: f64,
    /// Range (meters) when the contact was last seen.
    #[serde(rename = "Distance")]
    pub distance: f64,
    /// Detector training label `"{class} {distance} {azimuth} {width} {height}"`.
    #[serde(rename = "Bounds")]
    pub bounds: String,
}

/// Logical broadcast path of a radar (`/radar<id>`).
pub fn radar_path(radar_id: u32) -> String {
    format!("{}{}", crate::constants::RADAR_PATH_PREFIX, radar_id)
}
