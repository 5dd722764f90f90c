//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Precipitation tier affecting attenuation and rain clutter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    LightRain,
    HeavyRain,
}

/// Weather as seen by the radar: precipitation tier plus fog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherState {
    pub weather: Weather,
    /// Fog only matters in heavy rain, where it worsens both clutter and attenuation.
    pub foggy: bool,
}

impl WeatherState {
    pub fn new(weather: Weather, foggy: bool) -> Self {
        Self { weather, foggy }
    }

    /// Two-way specific attenuation (dB/km) for this weather.
    pub fn attenuation_db_per_km(&self) -> f64 {
        match (self.weather, self.foggy) {
            (Weather::Clear, _) => 0.0,
            (Weather::LightRain, _) => LIGHT_RAIN_ATTENUATION_DB_PER_KM,
            (Weather::HeavyRain, false) => HEAVY_RAIN_ATTENUATION_DB_PER_KM,
            (Weather::HeavyRain, true) => HEAVY_RAIN_FOG_ATTENUATION_DB_PER_KM,
        }
    }

    /// Rain drop probability range `[low, high)` and drops per row, if raining.
    pub fn rain_profile(&self) -> Option<(f64, f64, u32)> {
        match (self.weather, self.foggy) {
            (Weather::Clear, _) => None,
            (Weather::LightRain, _) => Some((0.01, 0.07, LIGHT_RAIN_DROPS)),
            (Weather::HeavyRain, false) => Some((0.1, 0.2, HEAVY_RAIN_DROPS)),
            (Weather::HeavyRain, true) => Some((0.3, 0.4, HEAVY_RAIN_FOG_DROPS)),
        }
    }
}

/// Direction in which the automatic placement grid grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementDirection {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

/// Lifecycle status of a radar unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadarStatus {
    /// Rotating and writing one PPI row per tick.
    #[default]
    Scanning,
    /// Signal scoring failed; the radar no longer scans. Other radars are unaffected.
    Failed,
}

/// Which signal scorer implementation a radar uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScorerKind {
    /// Sequential batch scorer on the tick thread.
    #[default]
    CpuBatch,
    /// Data-parallel scorer on a worker pool.
    Parallel,
}
