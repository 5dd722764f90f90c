//! Events emitted by the simulation to the owning controller.

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Radar lifecycle and scan events, drained from the engine after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RadarEvent {
    /// A radar was created and registered on its broadcast path.
    RadarSpawned { radar_id: u32, position: Position },
    /// A radar was unloaded; any in-flight export for it is cancelled.
    RadarUnloaded { radar_id: u32 },
    /// The radar completed a full rotation; an export was queued.
    RotationComplete { radar_id: u32, rotation: u64 },
    /// The render target was not ready; no row was written this tick.
    CaptureSkipped { radar_id: u32, azimuth: f64 },
    /// Signal scoring failed. The radar stops scanning; others continue.
    ScorerFailed { radar_id: u32, reason: String },
    /// A controller command could not be applied.
    CommandRejected { reason: String },
}
