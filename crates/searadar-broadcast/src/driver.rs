//! Driver thread: runs the radar engine at a fixed tick rate.
//!
//! The engine moves into its own thread. Controller commands arrive via an
//! `mpsc` channel and are queued at tick boundaries. Finished rotations go to
//! the broadcast worker over a bounded queue; the driver answers the worker's
//! scene queries at the end of each tick and keeps answering them on shutdown
//! until the worker has drained.

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, info, trace};

use searadar_core::commands::ControllerCommand;
use searadar_core::constants::{EVENT_QUEUE_CAPACITY, EXPORT_QUEUE_CAPACITY, TICK_RATE};
use searadar_core::events::RadarEvent;
use searadar_sim::engine::{EngineConfig, RadarEngine};

use crate::broadcaster::{spawn_broadcaster, BroadcasterHandle, StatsSnapshot};
use crate::transport::SessionHub;

/// Messages to the driver thread.
#[derive(Debug)]
pub enum DriverCommand {
    Controller(ControllerCommand),
    Shutdown,
}

/// Driver settings.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub engine: EngineConfig,
    pub tick_rate: u32,
    /// Sleep between ticks to hold `tick_rate`. Off for batch runs.
    pub realtime: bool,
    /// Stop on its own after this many ticks.
    pub max_ticks: Option<u64>,
    pub export_capacity: usize,
    /// Events held for the handle before new ones are dropped.
    pub event_capacity: usize,
    /// Commands applied on the first tick.
    pub startup: Vec<ControllerCommand>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tick_rate: TICK_RATE,
            realtime: true,
            max_ticks: None,
            export_capacity: EXPORT_QUEUE_CAPACITY,
            event_capacity: EVENT_QUEUE_CAPACITY,
            startup: Vec::new(),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSummary {
    pub ticks: u64,
    pub broadcast: StatsSnapshot,
}

/// Handle to a running driver.
pub struct DriverHandle {
    commands: mpsc::Sender<DriverCommand>,
    events: Receiver<RadarEvent>,
    thread: JoinHandle<DriverSummary>,
}

impl DriverHandle {
    /// Queue a controller command. Returns false if the driver has stopped.
    pub fn send(&self, command: ControllerCommand) -> bool {
        self.commands.send(DriverCommand::Controller(command)).is_ok()
    }

    /// Engine events, in tick order. Events produced while the queue is
    /// full are dropped.
    pub fn events(&self) -> &Receiver<RadarEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop after the current tick and wait for pending broadcasts.
    pub fn shutdown(self) -> DriverSummary {
        let _ = self.commands.send(DriverCommand::Shutdown);
        self.join()
    }

    /// Wait for the driver to stop on its own.
    pub fn join(self) -> DriverSummary {
        self.thread.join().unwrap_or_else(|_| {
            tracing::error!("driver thread panicked");
            DriverSummary {
                ticks: 0,
                broadcast: StatsSnapshot::default(),
            }
        })
    }
}

/// Start the engine and its broadcast worker.
pub fn spawn_driver(config: DriverConfig, hub: Arc<SessionHub>) -> io::Result<DriverHandle> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<DriverCommand>();
    let (event_tx, event_rx) = crossbeam_channel::bounded(config.event_capacity.max(1));
    let (job_tx, job_rx) = crossbeam_channel::bounded(config.export_capacity.max(1));

    let mut engine = RadarEngine::new(config.engine.clone()).with_directory(hub.clone());
    engine.attach_exporter(job_tx);
    engine.queue_commands(config.startup.iter().cloned());
    let broadcaster = spawn_broadcaster(hub, job_rx, engine.scene_query_client())?;

    let thread = std::thread::Builder::new()
        .name("searadar-driver".into())
        .spawn(move || run_driver(engine, &config, cmd_rx, event_tx, broadcaster))?;

    Ok(DriverHandle {
        commands: cmd_tx,
        events: event_rx,
        thread,
    })
}

fn run_driver(
    mut engine: RadarEngine,
    config: &DriverConfig,
    cmd_rx: mpsc::Receiver<DriverCommand>,
    event_tx: Sender<RadarEvent>,
    broadcaster: BroadcasterHandle,
) -> DriverSummary {
    let tick_duration = Duration::from_nanos(1_000_000_000 / config.tick_rate.max(1) as u64);
    let mut next_tick_time = Instant::now();
    let mut dropped_events = 0u64;

    'run: loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(DriverCommand::Controller(cmd)) => engine.queue_command(cmd),
                Ok(DriverCommand::Shutdown) => break 'run,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break 'run,
            }
        }

        // 2. Advance one tick
        for event in engine.tick() {
            match event_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    dropped_events += 1;
                    trace!(?event, "event queue full, event dropped");
                }
                // Handle dropped; nobody is listening.
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
        if config.max_ticks.is_some_and(|max| engine.time().tick >= max) {
            break;
        }

        // 3. Sleep until next tick
        if config.realtime {
            next_tick_time += tick_duration;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > tick_duration * 2 {
                // Too far behind, reset to avoid a catch-up spiral
                next_tick_time = now;
            }
        }
    }

    let time = engine.time();
    let ticks = time.tick;
    info!(ticks, elapsed_secs = time.elapsed_secs, dropped_events, "driver stopping");

    // Closing the export queue lets the worker finish; keep serving its
    // scene queries until it does.
    engine.detach_exporter();
    while !broadcaster.is_finished() {
        engine.serve_scene_queries();
        std::thread::sleep(Duration::from_millis(1));
    }
    let broadcast = broadcaster.join();
    debug!(?broadcast, "broadcast worker joined");

    DriverSummary { ticks, broadcast }
}
