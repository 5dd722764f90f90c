//! Controller commands sent to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::config::RadarConfig;
use crate::enums::Weather;
use crate::types::{Position, Velocity};

/// All possible operator / scenario actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerCommand {
    // --- Radar management ---
    /// Spawn a radar. Without a position it is placed on the placement grid.
    SpawnRadar {
        config: RadarConfig,
        position: Option<Position>,
    },
    /// Unload one radar, cancelling its in-flight export.
    UnloadRadar { radar_id: u32 },
    /// Unload every radar and reset the id counter.
    UnloadAll,

    // --- Environment ---
    /// Change the weather seen by every radar.
    SetWeather { weather: Weather, foggy: bool },

    // --- Scenario contacts ---
    /// Add a ship to the scene.
    AddContact {
        position: Position,
        velocity: Velocity,
        /// Radius of the reflecting hull approximation (meters).
        radius: f64,
        reflectivity: f64,
    },
    /// Remove a ship from the scene.
    RemoveContact { contact_id: u32 },
}
