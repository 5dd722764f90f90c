//! Rotation export handoff.
//!
//! At the end of a rotation a radar packages a copy of its PPI into an
//! [`ExportJob`] and hands it to the broadcaster over a channel. The
//! broadcaster never touches the world directly: it asks the engine for
//! current contact positions through a [`SceneQueryClient`], and the engine
//! answers on the tick thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{bounded, Receiver, Sender};

use searadar_core::error::ExportError;
use searadar_core::message::{BroadcastMessage, ShipView};
use searadar_core::types::Position;

use crate::ppi::PpiSnapshot;

/// Shared cancellation flag for one radar's in-flight exports.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Object class written into detection labels. Every contact is a ship.
pub const SHIP_CLASS: u32 = 0;

/// Where and when a contact was last painted by the beam.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub contact_id: u32,
    /// Beam azimuth (degrees, relative to the radar heading).
    pub azimuth: f64,
    /// Horizontal range (meters).
    pub distance: f64,
    /// Training label, see [`bounds_label`].
    pub bounds: String,
}

impl Detection {
    /// Detection of a spherical contact of `radius` meters.
    pub fn new(contact_id: u32, azimuth: f64, distance: f64, radius: f64) -> Self {
        let size = 2.0 * radius;
        Self {
            contact_id,
            azimuth,
            distance,
            bounds: bounds_label(distance, azimuth, size, size),
        }
    }
}

/// YOLO-style box `"{class} {x_center} {y_center} {width} {height}"` in
/// polar image space: x is range in meters, y is azimuth in degrees. Width
/// and height are the contact's footprint in meters, unnormalized.
pub fn bounds_label(distance: f64, azimuth: f64, width: f64, height: f64) -> String {
    format!("{SHIP_CLASS} {distance} {azimuth} {width} {height}")
}

/// Everything the broadcaster needs to publish one rotation.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub radar_id: u32,
    pub path: String,
    pub range: f64,
    pub rotation: u64,
    pub ppi: PpiSnapshot,
    /// Contacts seen during the rotation, keyed by contact id.
    pub detections: BTreeMap<u32, Detection>,
    pub cancel: CancelToken,
}

impl ExportJob {
    pub fn contact_ids(&self) -> Vec<u32> {
        self.detections.keys().copied().collect()
    }
}

/// Request for current scene state, answered on the tick thread.
#[derive(Debug)]
pub struct SceneQuery {
    pub radar_id: u32,
    pub contact_ids: Vec<u32>,
    /// `None` if the radar no longer exists.
    pub reply: Sender<Option<SceneReply>>,
}

/// Scene state at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneReply {
    pub radar_location: Position,
    /// Positions of the requested contacts that still exist.
    pub contacts: Vec<(u32, Position)>,
}

/// Broadcaster-side handle for scene queries.
#[derive(Debug, Clone)]
pub struct SceneQueryClient {
    requests: Sender<SceneQuery>,
    timeout: Duration,
}

impl SceneQueryClient {
    pub fn new(requests: Sender<SceneQuery>, timeout: Duration) -> Self {
        Self { requests, timeout }
    }

    /// Ask for the radar location and contact positions for `job`.
    pub fn request(&self, job: &ExportJob) -> Result<SceneReply, ExportError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.requests
            .send(SceneQuery {
                radar_id: job.radar_id,
                contact_ids: job.contact_ids(),
                reply: reply_tx,
            })
            .map_err(|_| ExportError::SceneUnavailable)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(Some(reply)) => Ok(reply),
            // Radar vanished between rotation end and query.
            Ok(None) => Err(ExportError::Cancelled(job.radar_id)),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                Err(ExportError::SceneTimeout(job.radar_id))
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(ExportError::SceneUnavailable)
            }
        }
    }
}

/// Channel pair for scene queries: client for the broadcaster, receiver for the engine.
pub fn scene_query_channel(timeout: Duration) -> (SceneQueryClient, Receiver<SceneQuery>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (SceneQueryClient::new(tx, timeout), rx)
}

/// Current Unix time in whole seconds.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Assemble the wire message. Contacts missing from the reply are dropped.
pub fn build_message(job: &ExportJob, reply: &SceneReply, timestamp: i64) -> BroadcastMessage {
    let ships = reply
        .contacts
        .iter()
        .filter_map(|(id, position)| {
            job.detections.get(id).map(|d| ShipView {
                id: *id,
                position: *position,
                azimuth: d.azimuth,
                distance: d.distance,
                bounds: d.bounds.clone(),
            })
        })
        .collect();

    BroadcastMessage {
        id: job.radar_id,
        timestamp,
        range: job.range,
        ppi: job.ppi.rows.clone(),
        ships,
        radar_location: reply.radar_location,
    }
}
