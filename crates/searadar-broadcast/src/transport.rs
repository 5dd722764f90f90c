//! Subscriber transport.
//!
//! Each radar owns a logical path (`/radar<id>`). Subscribers attach to a
//! path and receive every broadcast message on it as a JSON text frame.
//! `SessionHub` is the in-process implementation; a network listener can
//! sit behind the same [`Transport`] trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use searadar_sim::registry::ChannelDirectory;

/// Frames buffered per session before new frames are dropped for it.
pub const SESSION_BUFFER: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("no broadcast path `{0}`")]
    UnknownPath(String),
}

/// Fan-out of text frames to the subscribers of a path.
pub trait Transport: Send + Sync {
    /// Send `payload` to every subscriber of `path`. Returns how many received it.
    fn broadcast(&self, path: &str, payload: &str) -> usize;
    /// Number of live subscribers on `path`.
    fn subscriber_count(&self, path: &str) -> usize;
}

/// Receiving end of one subscriber session.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    frames: Receiver<Arc<str>>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next frame, or `None` once the path has been removed.
    pub fn recv(&self) -> Option<Arc<str>> {
        self.frames.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Arc<str>, RecvTimeoutError> {
        self.frames.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<Arc<str>> {
        self.frames.try_recv().ok()
    }
}

/// In-process session registry keyed by path.
#[derive(Default)]
pub struct SessionHub {
    paths: RwLock<HashMap<String, Vec<Sender<Arc<str>>>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new session to an existing path.
    pub fn subscribe(&self, path: &str) -> Result<Subscription, TransportError> {
        let mut paths = self.paths.write();
        let sessions = paths
            .get_mut(path)
            .ok_or_else(|| TransportError::UnknownPath(path.to_string()))?;
        let (tx, rx) = bounded(SESSION_BUFFER);
        sessions.push(tx);
        debug!(path, sessions = sessions.len(), "subscriber attached");
        Ok(Subscription {
            path: path.to_string(),
            frames: rx,
        })
    }

    /// Create `path` if missing. Existing sessions are kept.
    pub fn register_path(&self, path: &str) {
        let mut paths = self.paths.write();
        if !paths.contains_key(path) {
            paths.insert(path.to_string(), Vec::new());
            info!(path, "broadcast path registered");
        }
    }

    /// Remove `path`, disconnecting its sessions.
    pub fn remove_path(&self, path: &str) -> bool {
        let removed = self.paths.write().remove(path);
        if let Some(sessions) = &removed {
            info!(path, sessions = sessions.len(), "broadcast path removed");
        }
        removed.is_some()
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.paths.read().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.paths.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Transport for SessionHub {
    fn broadcast(&self, path: &str, payload: &str) -> usize {
        let mut paths = self.paths.write();
        let Some(sessions) = paths.get_mut(path) else {
            return 0;
        };
        let frame: Arc<str> = Arc::from(payload);
        let mut delivered = 0;
        sessions.retain(|session| match session.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(path, "subscriber is lagging, frame dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        delivered
    }

    fn subscriber_count(&self, path: &str) -> usize {
        self.paths.read().get(path).map_or(0, Vec::len)
    }
}

impl ChannelDirectory for SessionHub {
    fn register_path(&self, path: &str) {
        SessionHub::register_path(self, path);
    }

    fn remove_path(&self, path: &str) {
        SessionHub::remove_path(self, path);
    }
}
