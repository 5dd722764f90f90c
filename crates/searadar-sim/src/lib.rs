//! Radar sensing pipeline.
//!
//! Owns the synthetic scene and every radar unit, steps each radar's beam
//! one azimuth step per tick, scores the captured frame into the PPI, and
//! produces export jobs once per rotation.

pub mod capture;
pub mod clutter;
pub mod engine;
pub mod export;
pub mod ppi;
pub mod radar;
pub mod registry;
pub mod rotation;
pub mod scene;
pub mod scorer;
pub mod signal;

pub use engine::{EngineConfig, RadarEngine};
pub use searadar_core as core;

#[cfg(test)]
mod tests;
