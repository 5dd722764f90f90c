//! Sensor frame capture.
//!
//! Each tick the scene renders a narrow, tall frustum along the current
//! beam bearing. Every pixel carries `(nx, ny, nz, depth)`: the surface
//! normal in sensor space, where `+z` points from the surface back toward
//! the sensor, and the range along the pixel ray, already clamped to
//! `[minRange, maxRange]`. Background pixels are all zero.

use glam::DVec3;
use tracing::{debug, warn};

use searadar_core::config::RadarConfig;
use searadar_core::types::Position;

/// Orientation of the beam for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamPose {
    /// Antenna position.
    pub origin: Position,
    /// Absolute bearing of the beam axis in degrees (0 = North, clockwise).
    pub bearing_deg: f64,
}

impl BeamPose {
    /// Unit vector along the beam axis (horizontal).
    pub fn forward(&self) -> DVec3 {
        let b = self.bearing_deg.to_radians();
        DVec3::new(b.sin(), b.cos(), 0.0)
    }

    /// Unit vector to the right of the beam axis (horizontal).
    pub fn right(&self) -> DVec3 {
        let b = self.bearing_deg.to_radians();
        DVec3::new(b.cos(), -b.sin(), 0.0)
    }

    pub fn up(&self) -> DVec3 {
        DVec3::Z
    }
}

/// Frustum and resolution of the sensor frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view (degrees).
    pub vertical_fov_deg: f64,
    /// Horizontal field of view (degrees), the beam width.
    pub horizontal_fov_deg: f64,
    /// Near clip (meters).
    pub near: f64,
    /// Far clip (meters).
    pub far: f64,
}

impl FrameSpec {
    pub fn from_config(config: &RadarConfig) -> Self {
        Self {
            width: config.width_res,
            height: config.height_res,
            vertical_fov_deg: config.vertical_angle,
            horizontal_fov_deg: config.beam_width,
            near: config.min_range,
            far: config.max_range,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Ray direction through the centre of pixel `(col, row)`, row 0 at the top.
    pub fn pixel_ray(&self, pose: &BeamPose, col: u32, row: u32) -> DVec3 {
        let tan_h = (self.horizontal_fov_deg.to_radians() * 0.5).tan();
        let tan_v = (self.vertical_fov_deg.to_radians() * 0.5).tan();
        let x = ((col as f64 + 0.5) / self.width as f64) * 2.0 - 1.0;
        let y = 1.0 - ((row as f64 + 0.5) / self.height as f64) * 2.0;
        (pose.forward() + pose.right() * (x * tan_h) + pose.up() * (y * tan_v)).normalize()
    }
}

/// One rendered frame, row-major RGBA float pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    pub width: u32,
    pub height: u32,
    /// `(nx, ny, nz, depth)` per pixel.
    pub pixels: Vec<[f32; 4]>,
    /// Optional per-pixel reflectivity. Missing means the configured default.
    pub reflectivity: Option<Vec<f32>>,
}

impl SensorFrame {
    /// An all-background frame.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            reflectivity: None,
        }
    }
}

/// A decoded pixel, consumed immediately by the signal model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Surface normal in sensor space.
    pub normal: DVec3,
    /// Clamped range (meters).
    pub distance: f64,
    pub reflectivity: f64,
}

impl Sample {
    /// Alignment of the surface normal with the sensor axis.
    pub fn facing(&self) -> f64 {
        self.normal.z
    }
}

/// Anything that can render the sensor frame for a beam pose.
///
/// Returning `None` means the render target is not available this tick.
pub trait RenderSource {
    fn render(&self, pose: &BeamPose, spec: &FrameSpec) -> Option<SensorFrame>;
}

/// Decode a rendered frame into samples. Frames whose size does not match
/// the configured frame size are treated as unavailable.
pub fn decode_frame(
    frame: &SensorFrame,
    spec: &FrameSpec,
    default_reflectivity: f64,
) -> Option<Vec<Sample>> {
    let expected = spec.pixel_count();
    if frame.width != spec.width || frame.height != spec.height || frame.pixels.len() != expected {
        warn!(
            width = frame.width,
            height = frame.height,
            pixels = frame.pixels.len(),
            expected,
            "sensor frame does not match configured resolution"
        );
        return None;
    }
    if let Some(r) = &frame.reflectivity {
        if r.len() != expected {
            warn!(len = r.len(), expected, "reflectivity channel size mismatch");
            return None;
        }
    }

    let samples = frame
        .pixels
        .iter()
        .enumerate()
        .map(|(i, px)| Sample {
            normal: DVec3::new(px[0] as f64, px[1] as f64, px[2] as f64),
            distance: (px[3] as f64).clamp(spec.near, spec.far),
            reflectivity: frame
                .reflectivity
                .as_ref()
                .map_or(default_reflectivity, |r| r[i] as f64),
        })
        .collect();
    Some(samples)
}

/// Render and decode one tick's frame. `None` when nothing was captured.
pub fn capture<S: RenderSource + ?Sized>(
    source: &S,
    pose: &BeamPose,
    spec: &FrameSpec,
    default_reflectivity: f64,
) -> Option<Vec<Sample>> {
    let Some(frame) = source.render(pose, spec) else {
        debug!(bearing = pose.bearing_deg, "render target not ready, skipping capture");
        return None;
    };
    decode_frame(&frame, spec, default_reflectivity)
}
