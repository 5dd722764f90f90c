//! Radar unit: one installation and its per-tick scan.
//!
//! Each tick: capture the frame along the current beam, score it into the
//! PPI row for the current azimuth, record contacts inside the beam, then
//! advance the rotation. The tick that closes a rotation produces an
//! [`ExportJob`] carrying a copy of the PPI.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info};

use searadar_core::config::RadarConfig;
use searadar_core::constants::FULL_ROTATION_DEG;
use searadar_core::enums::{RadarStatus, WeatherState};
use searadar_core::error::RegistryError;
use searadar_core::events::RadarEvent;
use searadar_core::message::radar_path;
use searadar_core::types::Position;

use crate::capture::{capture, BeamPose, FrameSpec};
use crate::clutter::RainClutter;
use crate::export::{CancelToken, Detection, ExportJob};
use crate::ppi::{PpiBuffer, RangeBins};
use crate::rotation::RotationState;
use crate::scene::SceneSource;
use crate::scorer::SignalScorer;
use crate::signal::SignalModel;

/// Where a radar stands and which way azimuth 0 points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RadarPose {
    pub position: Position,
    /// Bearing of azimuth 0 (degrees, 0 = North, clockwise).
    pub heading_deg: f64,
}

/// Result of one radar tick.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub row_written: bool,
    pub export: Option<ExportJob>,
    pub events: Vec<RadarEvent>,
}

pub struct RadarUnit {
    id: u32,
    path: String,
    config: RadarConfig,
    pose: RadarPose,
    frame: FrameSpec,
    rotation: RotationState,
    ppi: PpiBuffer,
    bins: RangeBins,
    model: SignalModel,
    clutter: RainClutter,
    scorer: Box<dyn SignalScorer>,
    rng: ChaCha8Rng,
    status: RadarStatus,
    detected: BTreeMap<u32, Detection>,
    cancel: CancelToken,
}

impl RadarUnit {
    /// Build a radar from a validated configuration.
    pub fn new(
        id: u32,
        config: RadarConfig,
        pose: RadarPose,
        weather: WeatherState,
        scorer: Box<dyn SignalScorer>,
        seed: u64,
    ) -> Result<Self, RegistryError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let clutter = RainClutter::from_weather(weather, &mut rng);
        let bins = RangeBins::new(config.max_range, config.range_bins());
        let ppi = PpiBuffer::new(config.rows(), bins.len());

        Ok(Self {
            id,
            path: radar_path(id),
            frame: FrameSpec::from_config(&config),
            rotation: RotationState::new(config.resolution),
            model: SignalModel::from_config(&config, weather),
            ppi,
            bins,
            clutter,
            scorer,
            rng,
            config,
            pose,
            status: RadarStatus::Scanning,
            detected: BTreeMap::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Broadcast path (`/radar<id>`).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn pose(&self) -> RadarPose {
        self.pose
    }

    pub fn status(&self) -> RadarStatus {
        self.status
    }

    /// Current beam azimuth relative to the heading, in [0, 360).
    pub fn azimuth(&self) -> f64 {
        self.rotation.azimuth()
    }

    pub fn rotations(&self) -> u64 {
        self.rotation.rotations()
    }

    pub fn ppi(&self) -> &PpiBuffer {
        &self.ppi
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Contacts seen so far in the current rotation.
    pub fn detections(&self) -> &BTreeMap<u32, Detection> {
        &self.detected
    }

    /// Swap the scoring backend.
    pub fn set_scorer(&mut self, scorer: Box<dyn SignalScorer>) {
        self.scorer = scorer;
    }

    /// Apply new weather: attenuation and a fresh clutter profile.
    pub fn set_weather(&mut self, weather: WeatherState) {
        self.model.set_weather(weather);
        self.clutter = RainClutter::from_weather(weather, &mut self.rng);
        debug!(
            radar_id = self.id,
            ?weather,
            probability = self.clutter.probability,
            "radar weather updated"
        );
    }

    /// Cancel in-flight exports. Called when the radar is unloaded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn beam(&self) -> BeamPose {
        BeamPose {
            origin: self.pose.position,
            bearing_deg: (self.pose.heading_deg + self.rotation.azimuth())
                .rem_euclid(FULL_ROTATION_DEG),
        }
    }

    /// Scan one azimuth step.
    pub fn tick(&mut self, scene: &dyn SceneSource) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.status == RadarStatus::Failed {
            return outcome;
        }

        let azimuth = self.rotation.azimuth();
        let beam = self.beam();

        match capture(scene, &beam, &self.frame, self.config.default_reflectivity) {
            Some(samples) => {
                let index = self.ppi.row_index(azimuth, self.config.resolution);
                let written = self.ppi.write_row(
                    index,
                    &samples,
                    self.scorer.as_mut(),
                    &self.model,
                    &self.bins,
                    &self.clutter,
                    &mut self.rng,
                );
                if let Err(e) = written {
                    error!(radar_id = self.id, error = %e, "signal scoring failed, radar stopped");
                    self.status = RadarStatus::Failed;
                    outcome.events.push(RadarEvent::ScorerFailed {
                        radar_id: self.id,
                        reason: e.to_string(),
                    });
                    return outcome;
                }
                outcome.row_written = true;
            }
            None => {
                outcome.events.push(RadarEvent::CaptureSkipped {
                    radar_id: self.id,
                    azimuth,
                });
            }
        }

        self.detect_contacts(scene, &beam, azimuth);

        if let Some(done) = self.rotation.advance() {
            info!(
                radar_id = self.id,
                rotation = done.rotation,
                contacts = self.detected.len(),
                "rotation complete"
            );
            outcome.export = Some(ExportJob {
                radar_id: self.id,
                path: self.path.clone(),
                range: self.config.max_range,
                rotation: done.rotation,
                ppi: self.ppi.snapshot(),
                detections: std::mem::take(&mut self.detected),
                cancel: self.cancel.clone(),
            });
            outcome.events.push(RadarEvent::RotationComplete {
                radar_id: self.id,
                rotation: done.rotation,
            });
        }
        outcome
    }

    /// Record contacts inside the horizontal beam and within range.
    fn detect_contacts(&mut self, scene: &dyn SceneSource, beam: &BeamPose, azimuth: f64) {
        let half_beam = self.config.beam_width * 0.5;
        for contact in scene.contacts() {
            let distance = beam.origin.horizontal_range_to(&contact.position);
            if distance > self.config.max_range || distance <= self.config.min_range {
                continue;
            }
            let bearing = beam.origin.bearing_deg_to(&contact.position);
            let off = (bearing - beam.bearing_deg + 180.0).rem_euclid(FULL_ROTATION_DEG) - 180.0;
            if off.abs() > half_beam {
                continue;
            }
            self.detected.insert(
                contact.id,
                Detection::new(contact.id, azimuth, distance, contact.radius),
            );
        }
    }
}
