//! Rotation state machine.
//!
//! The beam advances one azimuth step per tick. Completion is detected by
//! an integer step counter rather than by comparing the accumulated angle
//! with zero, so floating-point drift can never skip a wrap. The azimuth is
//! derived from the counter and always lies in [0, 360).

use searadar_core::constants::FULL_ROTATION_DEG;

/// Emitted on the tick that closes a full rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationComplete {
    /// Number of rotations completed so far, including this one.
    pub rotation: u64,
}

#[derive(Debug, Clone)]
pub struct RotationState {
    resolution: f64,
    steps_per_rotation: usize,
    step: usize,
    rotations: u64,
}

impl RotationState {
    /// Start scanning at azimuth 0.
    pub fn new(resolution: f64) -> Self {
        let steps_per_rotation = ((FULL_ROTATION_DEG / resolution).round() as usize).max(1);
        Self {
            resolution,
            steps_per_rotation,
            step: 0,
            rotations: 0,
        }
    }

    /// Current beam azimuth in degrees, relative to the radar heading.
    pub fn azimuth(&self) -> f64 {
        (self.step as f64 * self.resolution).rem_euclid(FULL_ROTATION_DEG)
    }

    /// Steps taken in the current rotation; equals the PPI row being scanned.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn steps_per_rotation(&self) -> usize {
        self.steps_per_rotation
    }

    /// Completed rotations.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Advance one step. Returns the completion event when the beam wraps.
    pub fn advance(&mut self) -> Option<RotationComplete> {
        self.step += 1;
        if self.step < self.steps_per_rotation {
            return None;
        }
        self.step = 0;
        self.rotations += 1;
        Some(RotationComplete {
            rotation: self.rotations,
        })
    }
}
