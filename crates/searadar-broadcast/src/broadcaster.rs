//! Broadcast worker.
//!
//! Consumes export jobs off the tick thread. For each job it checks for
//! subscribers first, asks the engine for current contact positions, builds
//! the wire message, serializes it and fans it out. Failures are logged and
//! the job is skipped; the simulation never waits on this thread.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use tracing::{debug, error, warn};

use searadar_core::error::ExportError;
use searadar_sim::export::{build_message, unix_timestamp, ExportJob, SceneQueryClient};

use crate::transport::Transport;

/// What happened to one export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    /// Delivered to this many sessions.
    Sent(usize),
    /// Nobody was listening; nothing was serialized or sent.
    NoSubscribers,
}

/// Publish one rotation.
pub fn publish(
    transport: &dyn Transport,
    scenes: &SceneQueryClient,
    job: &ExportJob,
) -> Result<Published, ExportError> {
    if job.cancel.is_cancelled() {
        return Err(ExportError::Cancelled(job.radar_id));
    }
    if transport.subscriber_count(&job.path) == 0 {
        return Ok(Published::NoSubscribers);
    }

    let reply = scenes.request(job)?;
    // The radar may have been unloaded while we waited.
    if job.cancel.is_cancelled() {
        return Err(ExportError::Cancelled(job.radar_id));
    }

    let message = build_message(job, &reply, unix_timestamp());
    let payload = serde_json::to_string(&message)?;
    Ok(Published::Sent(transport.broadcast(&job.path, &payload)))
}

/// Running totals of the broadcast worker.
#[derive(Debug, Default)]
pub struct BroadcastStats {
    sent: AtomicU64,
    no_subscribers: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`BroadcastStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub no_subscribers: u64,
    pub cancelled: u64,
    pub failed: u64,
}

impl BroadcastStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            no_subscribers: self.no_subscribers.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, job: &ExportJob, result: Result<Published, ExportError>) {
        match result {
            Ok(Published::Sent(sessions)) => {
                debug!(radar_id = job.radar_id, rotation = job.rotation, sessions, "rotation broadcast");
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Published::NoSubscribers) => {
                debug!(radar_id = job.radar_id, path = %job.path, "no subscribers, rotation dropped");
                self.no_subscribers.fetch_add(1, Ordering::Relaxed);
            }
            Err(ExportError::Cancelled(radar_id)) => {
                warn!(radar_id, "export cancelled, radar unloaded");
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Err(e @ ExportError::Serialize(_)) => {
                error!(radar_id = job.radar_id, error = %e, "broadcast message dropped");
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(radar_id = job.radar_id, error = %e, "broadcast skipped");
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Handle to the broadcast worker thread.
pub struct BroadcasterHandle {
    thread: JoinHandle<()>,
    stats: Arc<BroadcastStats>,
}

impl BroadcasterHandle {
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker to drain its queue. The worker stops once every
    /// job sender is dropped.
    pub fn join(self) -> StatsSnapshot {
        if self.thread.join().is_err() {
            error!("broadcast worker panicked");
        }
        self.stats.snapshot()
    }
}

/// Spawn the worker. It runs until `jobs` disconnects.
pub fn spawn_broadcaster(
    transport: Arc<dyn Transport>,
    jobs: Receiver<ExportJob>,
    scenes: SceneQueryClient,
) -> io::Result<BroadcasterHandle> {
    let stats = Arc::new(BroadcastStats::default());
    let worker_stats = Arc::clone(&stats);
    let thread = std::thread::Builder::new()
        .name("searadar-broadcast".into())
        .spawn(move || {
            for job in jobs.iter() {
                let result = publish(transport.as_ref(), &scenes, &job);
                worker_stats.record(&job, result);
            }
            debug!("export queue closed, broadcaster exiting");
        })?;
    Ok(BroadcasterHandle { thread, stats })
}
