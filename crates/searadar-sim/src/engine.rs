//! Radar engine: the tick-thread owner of the scene and every radar.
//!
//! `RadarEngine` processes controller commands at tick boundaries, scans one
//! azimuth step per radar per tick, hands finished rotations to the exporter,
//! and answers the exporter's scene queries at the end of the tick. Completely
//! headless, enabling deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use searadar_core::commands::ControllerCommand;
use searadar_core::constants::{DEFAULT_PLACEMENT_ROWS, SCENE_QUERY_TIMEOUT_MS};
use searadar_core::enums::{PlacementDirection, ScorerKind, WeatherState};
use searadar_core::events::RadarEvent;
use searadar_core::types::{Position, SimTime};

use crate::export::{scene_query_channel, ExportJob, SceneQuery, SceneQueryClient, SceneReply};
use crate::radar::RadarPose;
use crate::registry::{ChannelDirectory, PlacementGrid, RadarRegistry};
use crate::scene::{Reflector, Scene};

/// Configuration for starting a new engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RNG seed for determinism. Same seed = same PPI images.
    pub seed: u64,
    /// Rows of the automatic placement grid.
    pub placement_rows: u32,
    pub placement_direction: PlacementDirection,
    /// First slot of the placement grid.
    pub origin: Position,
    pub scorer_kind: ScorerKind,
    pub weather: WeatherState,
    /// How long the exporter waits for a scene reply.
    pub scene_query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            placement_rows: DEFAULT_PLACEMENT_ROWS,
            placement_direction: PlacementDirection::default(),
            origin: Position::default(),
            scorer_kind: ScorerKind::default(),
            weather: WeatherState::default(),
            scene_query_timeout: Duration::from_millis(SCENE_QUERY_TIMEOUT_MS),
        }
    }
}

pub struct RadarEngine {
    scene: Scene,
    registry: RadarRegistry,
    time: SimTime,
    weather: WeatherState,
    command_queue: VecDeque<ControllerCommand>,
    events: Vec<RadarEvent>,
    exporter: Option<Sender<ExportJob>>,
    /// Latest job per radar produced while no exporter is attached.
    pending_exports: Vec<ExportJob>,
    query_client: SceneQueryClient,
    queries: Receiver<SceneQuery>,
}

impl RadarEngine {
    pub fn new(config: EngineConfig) -> Self {
        let grid = PlacementGrid::new(
            config.origin,
            config.placement_rows,
            config.placement_direction,
        );
        let (query_client, queries) = scene_query_channel(config.scene_query_timeout);
        Self {
            scene: Scene::new(),
            registry: RadarRegistry::new(config.seed, config.scorer_kind, grid),
            time: SimTime::default(),
            weather: config.weather,
            command_queue: VecDeque::new(),
            events: Vec::new(),
            exporter: None,
            pending_exports: Vec::new(),
            query_client,
            queries,
        }
    }

    /// Route radar path registration to `directory`.
    pub fn with_directory(mut self, directory: Arc<dyn ChannelDirectory>) -> Self {
        self.registry.set_directory(directory);
        self
    }

    /// Send finished rotations to `exporter` instead of keeping them.
    pub fn attach_exporter(&mut self, exporter: Sender<ExportJob>) {
        self.exporter = Some(exporter);
    }

    /// Drop the exporter channel so the exporter can drain and stop.
    pub fn detach_exporter(&mut self) {
        self.exporter = None;
    }

    /// Handle for the exporter to query scene state.
    pub fn scene_query_client(&self) -> SceneQueryClient {
        self.query_client.clone()
    }

    /// Queue a controller command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: ControllerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = ControllerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance one tick and return the events it produced.
    pub fn tick(&mut self) -> Vec<RadarEvent> {
        self.process_commands();

        for radar in self.registry.iter_mut() {
            let outcome = radar.tick(&self.scene);
            self.events.extend(outcome.events);
            if let Some(job) = outcome.export {
                match &self.exporter {
                    Some(exporter) => match exporter.try_send(job) {
                        Ok(()) => {}
                        Err(TrySendError::Full(job)) => {
                            warn!(radar_id = job.radar_id, rotation = job.rotation, "export queue full, rotation dropped");
                        }
                        Err(TrySendError::Disconnected(job)) => {
                            debug!(radar_id = job.radar_id, "exporter gone, rotation dropped");
                        }
                    },
                    None => Self::hold_export(&mut self.pending_exports, job),
                }
            }
        }

        self.scene.step();
        self.time.advance();
        self.serve_scene_queries();

        std::mem::take(&mut self.events)
    }

    /// Answer every pending scene query from the exporter.
    pub fn serve_scene_queries(&mut self) -> usize {
        let mut served = 0;
        while let Ok(query) = self.queries.try_recv() {
            let reply = self.registry.get(query.radar_id).map(|radar| SceneReply {
                radar_location: radar.pose().position,
                contacts: query
                    .contact_ids
                    .iter()
                    .filter_map(|id| self.scene.contact_position(*id).map(|p| (*id, p)))
                    .collect(),
            });
            // The exporter may have timed out already.
            let _ = query.reply.send(reply);
            served += 1;
        }
        served
    }

    /// Keep `job`, replacing any older undrained job from the same radar.
    fn hold_export(pending: &mut Vec<ExportJob>, job: ExportJob) {
        if let Some(slot) = pending.iter_mut().find(|p| p.radar_id == job.radar_id) {
            debug!(
                radar_id = job.radar_id,
                rotation = slot.rotation,
                "undrained rotation replaced"
            );
            *slot = job;
        } else {
            pending.push(job);
        }
    }

    /// Take export jobs produced while no exporter was attached: at most one
    /// per radar, the most recent rotation.
    pub fn drain_exports(&mut self) -> Vec<ExportJob> {
        std::mem::take(&mut self.pending_exports)
    }

    /// Simulation clock, advanced once per tick.
    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn weather(&self) -> WeatherState {
        self.weather
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn registry(&self) -> &RadarRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RadarRegistry {
        &mut self.registry
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn reject(&mut self, reason: String) {
        warn!(%reason, "command rejected");
        self.events.push(RadarEvent::CommandRejected { reason });
    }

    fn handle_command(&mut self, command: ControllerCommand) {
        match command {
            ControllerCommand::SpawnRadar { config, position } => {
                let spawned = match position {
                    Some(position) => self.registry.spawn_at(
                        config,
                        RadarPose {
                            position,
                            heading_deg: 0.0,
                        },
                        self.weather,
                    ),
                    None => self.registry.spawn(config, self.weather),
                };
                match spawned {
                    Ok(radar_id) => {
                        let position = self
                            .registry
                            .get(radar_id)
                            .map(|r| r.pose().position)
                            .unwrap_or_default();
                        self.events.push(RadarEvent::RadarSpawned { radar_id, position });
                    }
                    Err(e) => self.reject(format!("spawn failed: {e}")),
                }
            }
            ControllerCommand::UnloadRadar { radar_id } => match self.registry.unload(radar_id) {
                Ok(()) => self.events.push(RadarEvent::RadarUnloaded { radar_id }),
                Err(e) => self.reject(e.to_string()),
            },
            ControllerCommand::UnloadAll => {
                for radar_id in self.registry.unload_all() {
                    self.events.push(RadarEvent::RadarUnloaded { radar_id });
                }
            }
            ControllerCommand::SetWeather { weather, foggy } => {
                self.weather = WeatherState::new(weather, foggy);
                self.registry.set_weather(self.weather);
            }
            ControllerCommand::AddContact {
                position,
                velocity,
                radius,
                reflectivity,
            } => {
                if !(radius > 0.0) || !(reflectivity >= 0.0) {
                    self.reject(format!(
                        "contact needs positive radius and non-negative reflectivity, got {radius} and {reflectivity}"
                    ));
                    return;
                }
                let id = self.scene.add_contact(
                    position,
                    velocity,
                    Reflector {
                        radius,
                        reflectivity,
                    },
                );
                debug!(contact_id = id, "contact added");
            }
            ControllerCommand::RemoveContact { contact_id } => {
                if !self.scene.remove_contact(contact_id) {
                    self.reject(format!("no contact with id {contact_id}"));
                }
            }
        }
    }
}
