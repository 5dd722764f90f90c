//! Radar registry: id allocation, placement and path lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use searadar_core::config::RadarConfig;
use searadar_core::enums::{PlacementDirection, ScorerKind, WeatherState};
use searadar_core::error::RegistryError;
use searadar_core::types::Position;

use crate::radar::{RadarPose, RadarUnit};
use crate::scorer::build_scorer;

/// Something that owns broadcast paths, e.g. the subscriber transport.
pub trait ChannelDirectory: Send + Sync {
    /// Make `path` available to subscribers.
    fn register_path(&self, path: &str);
    /// Drop `path` and disconnect its subscribers.
    fn remove_path(&self, path: &str);
}

/// Automatic placement grid.
#[derive(Debug, Clone)]
pub struct PlacementGrid {
    origin: Position,
    direction: PlacementDirection,
    row_counts: Vec<u32>,
}

impl PlacementGrid {
    pub fn new(origin: Position, rows: u32, direction: PlacementDirection) -> Self {
        Self {
            origin,
            direction,
            row_counts: vec![0; rows.max(1) as usize],
        }
    }

    /// Next free slot for a radar of the given range. Fills the emptiest row first.
    pub fn place(&mut self, max_range: f64) -> Position {
        let row = self
            .row_counts
            .iter()
            .enumerate()
            .min_by_key(|(_, count)| **count)
            .map_or(0, |(row, _)| row);

        let spacing = 2.0 * max_range;
        let along = self.row_counts[row] as f64 * spacing;
        let across = row as f64 * spacing;
        self.row_counts[row] += 1;

        let (dx, dy) = match self.direction {
            PlacementDirection::Right => (along, across),
            PlacementDirection::Left => (-along, across),
            PlacementDirection::Up => (across, along),
            PlacementDirection::Down => (across, -along),
        };
        self.origin.offset(dx, dy, 0.0)
    }

    pub fn reset(&mut self) {
        self.row_counts.fill(0);
    }
}

/// All live radars, keyed by id.
pub struct RadarRegistry {
    radars: BTreeMap<u32, RadarUnit>,
    next_id: u32,
    grid: PlacementGrid,
    seed: u64,
    scorer_kind: ScorerKind,
    directory: Option<Arc<dyn ChannelDirectory>>,
}

impl RadarRegistry {
    pub fn new(seed: u64, scorer_kind: ScorerKind, grid: PlacementGrid) -> Self {
        Self {
            radars: BTreeMap::new(),
            next_id: 0,
            grid,
            seed,
            scorer_kind,
            directory: None,
        }
    }

    /// Attach the directory that receives path register/remove calls.
    pub fn set_directory(&mut self, directory: Arc<dyn ChannelDirectory>) {
        for radar in self.radars.values() {
            directory.register_path(radar.path());
        }
        self.directory = Some(directory);
    }

    /// Per-radar RNG seed, stable for a given engine seed and id.
    fn radar_seed(&self, id: u32) -> u64 {
        self.seed ^ (id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Spawn a radar on the placement grid.
    pub fn spawn(
        &mut self,
        config: RadarConfig,
        weather: WeatherState,
    ) -> Result<u32, RegistryError> {
        config.validate()?;
        let position = self.grid.place(config.max_range);
        self.spawn_at(config, RadarPose { position, heading_deg: 0.0 }, weather)
    }

    /// Spawn a radar at an explicit pose.
    pub fn spawn_at(
        &mut self,
        config: RadarConfig,
        pose: RadarPose,
        weather: WeatherState,
    ) -> Result<u32, RegistryError> {
        let id = self.next_id;
        let scorer = build_scorer(self.scorer_kind)?;
        let radar = RadarUnit::new(id, config, pose, weather, scorer, self.radar_seed(id))?;
        self.next_id += 1;

        if let Some(directory) = &self.directory {
            directory.register_path(radar.path());
        }
        info!(radar_id = id, path = radar.path(), x = pose.position.x, y = pose.position.y, "radar spawned");
        self.radars.insert(id, radar);
        Ok(id)
    }

    /// Unload one radar, cancelling its exports and removing its path.
    pub fn unload(&mut self, id: u32) -> Result<(), RegistryError> {
        let radar = self.radars.remove(&id).ok_or(RegistryError::UnknownRadar(id))?;
        radar.shutdown();
        if let Some(directory) = &self.directory {
            directory.remove_path(radar.path());
        }
        info!(radar_id = id, "radar unloaded");
        Ok(())
    }

    /// Unload everything and reset id allocation and placement.
    pub fn unload_all(&mut self) -> Vec<u32> {
        let ids = self.ids();
        for id in &ids {
            if let Err(e) = self.unload(*id) {
                warn!(radar_id = id, error = %e, "unload failed");
            }
        }
        self.next_id = 0;
        self.grid.reset();
        ids
    }

    pub fn get(&self, id: u32) -> Option<&RadarUnit> {
        self.radars.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut RadarUnit> {
        self.radars.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.radars.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.radars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radars.is_empty()
    }

    /// Radars in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RadarUnit> {
        self.radars.values_mut()
    }

    pub fn set_weather(&mut self, weather: WeatherState) {
        for radar in self.radars.values_mut() {
            radar.set_weather(weather);
        }
    }
}
