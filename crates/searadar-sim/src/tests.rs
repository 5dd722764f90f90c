//! Tests for the radar engine: full scans, determinism, rotation export and isolation.

use std::thread;

use searadar_core::commands::ControllerCommand;
use searadar_core::config::RadarConfig;
use searadar_core::enums::{RadarStatus, Weather, WeatherState};
use searadar_core::error::ScorerError;
use searadar_core::events::RadarEvent;
use searadar_core::types::{Position, Velocity};

use crate::capture::Sample;
use crate::engine::{EngineConfig, RadarEngine};
use crate::export::ExportJob;
use crate::ppi::RangeBins;
use crate::rotation::RotationState;
use crate::scene::Reflector;
use crate::scorer::SignalScorer;
use crate::signal::SignalModel;

fn scan_config() -> RadarConfig {
    RadarConfig {
        height_res: 48,
        width_res: 4,
        resolution: 1.0,
        max_range: 5000.0,
        min_range: 10.0,
        image_radius: 5000,
        parallel_threshold: 0.45,
        ..RadarConfig::default()
    }
}

fn engine_with_radar(seed: u64, config: RadarConfig) -> RadarEngine {
    let mut engine = RadarEngine::new(EngineConfig {
        seed,
        ..Default::default()
    });
    engine.queue_command(ControllerCommand::SpawnRadar {
        config,
        position: Some(Position::default()),
    });
    engine
}

fn sphere(engine: &mut RadarEngine, position: Position) {
    engine.scene_mut().add_obstacle(
        position,
        Reflector {
            radius: 100.0,
            reflectivity: 1.0,
        },
    );
}

/// Tick until the first export job appears.
fn run_rotation(engine: &mut RadarEngine) -> ExportJob {
    for _ in 0..10_000 {
        engine.tick();
        if let Some(job) = engine.drain_exports().into_iter().next() {
            return job;
        }
    }
    panic!("no rotation completed");
}

fn azimuth_distance(row: usize, rows: usize, target: usize) -> usize {
    let d = row.abs_diff(target);
    d.min(rows - d)
}

// ---- Full scan ----

#[test]
fn test_sphere_ahead_lands_in_matching_row_and_bin() {
    let mut engine = engine_with_radar(1, scan_config());
    sphere(&mut engine, Position::new(0.0, 2500.0, 0.0));

    let job = run_rotation(&mut engine);
    let rows = job.ppi.rows.len();
    assert_eq!(rows, 360);
    assert_eq!(job.ppi.rows[0].len(), 5000);

    let hits: Vec<usize> = job.ppi.rows[0]
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .map(|(bin, _)| bin)
        .collect();
    assert!(!hits.is_empty(), "row 0 must see the sphere");
    assert!(
        hits.iter().all(|bin| (2395..=2500).contains(bin)),
        "returns must sit on the front surface: {hits:?}"
    );

    for (r, row) in job.ppi.rows.iter().enumerate() {
        if azimuth_distance(r, rows, 0) > 5 {
            assert!(row.iter().all(|v| *v == 0), "row {r} should be empty");
        }
    }
}

#[test]
fn test_sphere_east_lands_in_row_90() {
    let mut engine = engine_with_radar(1, scan_config());
    sphere(&mut engine, Position::new(1500.0, 0.0, 0.0));
    let job = run_rotation(&mut engine);
    assert!(job.ppi.rows[90].iter().any(|v| *v > 0));
    assert!(job.ppi.rows[0].iter().all(|v| *v == 0));
    assert!(job.ppi.rows[180].iter().all(|v| *v == 0));
}

#[test]
fn test_gain_raises_intensity() {
    let peak = |gain: f64| {
        let config = RadarConfig {
            antenna_gain_dbi: gain,
            ..scan_config()
        };
        let mut engine = engine_with_radar(5, config);
        sphere(&mut engine, Position::new(0.0, 800.0, 0.0));
        let job = run_rotation(&mut engine);
        job.ppi.rows[0].iter().copied().max().unwrap_or(0)
    };
    let low = peak(20.0);
    let high = peak(40.0);
    assert!(low > 0, "20 dBi must still detect the sphere");
    assert!(high > low, "40 dBi ({high}) must exceed 20 dBi ({low})");
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let config = RadarConfig {
        noise: 4.0,
        ..scan_config()
    };
    let run = |seed: u64| {
        let mut engine = engine_with_radar(seed, config.clone());
        engine.queue_command(ControllerCommand::SetWeather {
            weather: Weather::HeavyRain,
            foggy: true,
        });
        sphere(&mut engine, Position::new(0.0, 2500.0, 0.0));
        run_rotation(&mut engine).ppi.rows
    };
    assert_eq!(run(12345), run(12345), "same seed must give the same PPI");
    assert_ne!(run(111), run(222), "different seeds should diverge");
}

// ---- Rotation ----

#[test]
fn test_one_rotation_complete_per_revolution() {
    let config = RadarConfig {
        height_res: 8,
        width_res: 2,
        resolution: 0.5,
        image_radius: 100,
        ..RadarConfig::default()
    };
    let mut engine = engine_with_radar(3, config);
    let steps = RotationState::new(0.5).steps_per_rotation();
    assert_eq!(steps, 720);

    let mut completions = Vec::new();
    for tick in 1..=(2 * steps) {
        for event in engine.tick() {
            if let RadarEvent::RotationComplete { rotation, .. } = event {
                completions.push((tick, rotation));
            }
        }
    }
    assert_eq!(completions, vec![(720, 1), (1440, 2)]);
    let radar = engine.registry().get(0).unwrap();
    assert_eq!(radar.azimuth(), 0.0);
    assert_eq!(radar.rotations(), 2);
}

#[test]
fn test_rows_persist_until_revisited() {
    let mut engine = engine_with_radar(9, scan_config());
    let contact = engine.scene_mut().add_contact(
        Position::new(0.0, -2500.0, 0.0),
        Velocity::default(),
        Reflector {
            radius: 100.0,
            reflectivity: 1.0,
        },
    );
    let first = run_rotation(&mut engine);
    assert!(first.ppi.rows[180].iter().any(|v| *v > 0));
    assert!(first.detections.contains_key(&contact));

    engine.queue_command(ControllerCommand::RemoveContact { contact_id: contact });
    for _ in 0..90 {
        engine.tick();
    }
    let radar = engine.registry().get(0).unwrap();
    assert!(
        radar.ppi().row(180).iter().any(|v| *v > 0),
        "row 180 keeps last rotation's data until the beam returns"
    );

    for _ in 0..100 {
        engine.tick();
    }
    let radar = engine.registry().get(0).unwrap();
    assert!(radar.ppi().row(180).iter().all(|v| *v == 0));
}

#[test]
fn test_unready_scene_writes_no_rows() {
    let mut engine = engine_with_radar(1, scan_config());
    engine.scene_mut().set_ready(false);
    let events = engine.tick();
    assert!(events
        .iter()
        .any(|e| matches!(e, RadarEvent::CaptureSkipped { radar_id: 0, .. })));
    let radar = engine.registry().get(0).unwrap();
    assert_eq!(radar.ppi().generation(), 0);
    assert_eq!(radar.status(), RadarStatus::Scanning);

    engine.scene_mut().set_ready(true);
    engine.tick();
    assert_eq!(engine.registry().get(0).unwrap().ppi().generation(), 1);
}

// ---- Isolation ----

struct DeviceLost;

impl SignalScorer for DeviceLost {
    fn score_row(
        &mut self,
        _samples: &[Sample],
        _model: &SignalModel,
        _bins: &RangeBins,
        _rng: &mut rand_chacha::ChaCha8Rng,
        _row: &mut [u32],
    ) -> Result<(), ScorerError> {
        Err(ScorerError::Dispatch("device lost".into()))
    }
}

#[test]
fn test_scorer_failure_is_isolated_to_one_radar() {
    let config = RadarConfig {
        height_res: 8,
        width_res: 2,
        image_radius: 100,
        ..RadarConfig::default()
    };
    let mut engine = RadarEngine::new(EngineConfig::default());
    engine.queue_commands([
        ControllerCommand::SpawnRadar {
            config: config.clone(),
            position: None,
        },
        ControllerCommand::SpawnRadar {
            config,
            position: None,
        },
    ]);
    engine.tick();
    engine
        .registry_mut()
        .get_mut(0)
        .unwrap()
        .set_scorer(Box::new(DeviceLost));

    let events = engine.tick();
    assert!(events
        .iter()
        .any(|e| matches!(e, RadarEvent::ScorerFailed { radar_id: 0, .. })));
    for _ in 0..10 {
        engine.tick();
    }
    let failed = engine.registry().get(0).unwrap();
    let healthy = engine.registry().get(1).unwrap();
    assert_eq!(failed.status(), RadarStatus::Failed);
    assert_eq!(failed.ppi().generation(), 1);
    assert_eq!(healthy.status(), RadarStatus::Scanning);
    assert_eq!(healthy.ppi().generation(), 12);
}

// ---- Commands ----

#[test]
fn test_spawn_commands_and_unload_all() {
    let mut engine = RadarEngine::new(EngineConfig::default());
    let config = RadarConfig {
        height_res: 8,
        width_res: 2,
        image_radius: 100,
        max_range: 1000.0,
        ..RadarConfig::default()
    };
    engine.queue_commands([
        ControllerCommand::SpawnRadar {
            config: config.clone(),
            position: None,
        },
        ControllerCommand::SpawnRadar {
            config: config.clone(),
            position: None,
        },
        ControllerCommand::SpawnRadar {
            config: RadarConfig {
                resolution: -1.0,
                ..config.clone()
            },
            position: None,
        },
    ]);
    let events = engine.tick();
    assert!(events.contains(&RadarEvent::RadarSpawned {
        radar_id: 1,
        position: Position::new(2000.0, 0.0, 0.0),
    }));
    assert!(events
        .iter()
        .any(|e| matches!(e, RadarEvent::CommandRejected { .. })));
    assert_eq!(engine.registry().ids(), vec![0, 1]);

    engine.queue_command(ControllerCommand::UnloadAll);
    let events = engine.tick();
    assert_eq!(
        events,
        vec![
            RadarEvent::RadarUnloaded { radar_id: 0 },
            RadarEvent::RadarUnloaded { radar_id: 1 },
        ]
    );

    engine.queue_command(ControllerCommand::SpawnRadar {
        config,
        position: None,
    });
    let events = engine.tick();
    assert!(events.contains(&RadarEvent::RadarSpawned {
        radar_id: 0,
        position: Position::default(),
    }));
}

#[test]
fn test_unknown_ids_are_rejected() {
    let mut engine = RadarEngine::new(EngineConfig::default());
    engine.queue_commands([
        ControllerCommand::UnloadRadar { radar_id: 4 },
        ControllerCommand::RemoveContact { contact_id: 9 },
        ControllerCommand::AddContact {
            position: Position::default(),
            velocity: Velocity::default(),
            radius: 0.0,
            reflectivity: 1.0,
        },
    ]);
    let events = engine.tick();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| matches!(e, RadarEvent::CommandRejected { .. })));
    assert_eq!(engine.scene().contact_count(), 0);
}

#[test]
fn test_non_finite_noise_is_rejected_at_spawn() {
    let mut engine = engine_with_radar(
        4,
        RadarConfig {
            noise: f64::INFINITY,
            ..scan_config()
        },
    );
    sphere(&mut engine, Position::new(0.0, 2500.0, 0.0));
    let events = engine.tick();
    assert!(matches!(events[..], [RadarEvent::CommandRejected { .. }]));
    assert!(engine.registry().is_empty());
    engine.tick();
}

#[test]
fn test_rain_clutter_appears_on_empty_sea() {
    let config = RadarConfig {
        height_res: 8,
        width_res: 2,
        image_radius: 500,
        resolution: 2.0,
        ..RadarConfig::default()
    };
    let mut engine = engine_with_radar(21, config);
    engine.queue_command(ControllerCommand::SetWeather {
        weather: Weather::HeavyRain,
        foggy: true,
    });
    let job = run_rotation(&mut engine);
    assert_eq!(engine.weather(), WeatherState::new(Weather::HeavyRain, true));
    let cells: usize = job
        .ppi
        .rows
        .iter()
        .map(|row| row.iter().filter(|v| **v > 0).count())
        .sum();
    assert!(cells > 0, "heavy rain must leave clutter on an empty sea");
}

// ---- Export handoff ----

#[test]
fn test_undrained_exports_keep_latest_rotation_per_radar() {
    let config = RadarConfig {
        height_res: 8,
        width_res: 2,
        image_radius: 100,
        resolution: 10.0,
        ..RadarConfig::default()
    };
    let mut engine = engine_with_radar(9, config.clone());
    engine.queue_command(ControllerCommand::SpawnRadar {
        config,
        position: None,
    });
    for _ in 0..50 * 36 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 1800);
    assert!((engine.time().elapsed_secs - 36.0).abs() < 1e-6);

    let jobs = engine.drain_exports();
    assert_eq!(jobs.len(), 2);
    for job in &jobs {
        assert_eq!(job.rotation, 50);
    }
    assert_eq!(
        jobs.iter().map(|j| j.radar_id).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert!(engine.drain_exports().is_empty());
}

#[test]
fn test_scene_query_served_on_tick_thread() {
    let mut engine = engine_with_radar(2, scan_config());
    let contact = engine.scene_mut().add_contact(
        Position::new(0.0, 1200.0, 0.0),
        Velocity::new(5.0, 0.0, 0.0),
        Reflector {
            radius: 40.0,
            reflectivity: 1.0,
        },
    );
    let job = run_rotation(&mut engine);
    assert_eq!(job.contact_ids(), vec![contact]);

    let client = engine.scene_query_client();
    let handle = thread::spawn(move || client.request(&job));
    while !handle.is_finished() {
        engine.serve_scene_queries();
        thread::yield_now();
    }
    let reply = handle.join().unwrap().unwrap();
    assert_eq!(reply.radar_location, Position::default());
    assert_eq!(reply.contacts.len(), 1);
    let (id, position) = reply.contacts[0];
    assert_eq!(id, contact);
    assert!(position.x > 0.0, "contact has moved east since it was painted");
}
