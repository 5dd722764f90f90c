//! Radar configuration.
//!
//! Field names in JSON match the operator-facing option names
//! (`heightRes`, `maxRange`, `antennaGainDBi`, ...).

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// Configuration of a single radar unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadarConfig {
    /// Sensor frame height in pixels.
    pub height_res: u32,
    /// Sensor frame width in pixels.
    pub width_res: u32,
    /// Degrees per azimuth step.
    pub resolution: f64,
    /// Maximum range / far clip (meters).
    pub max_range: f64,
    /// Minimum range / near clip (meters).
    pub min_range: f64,
    /// Vertical field of view of the beam (degrees).
    pub vertical_angle: f64,
    /// Horizontal beam width (degrees).
    pub beam_width: f64,
    /// Number of range bins per PPI row.
    pub image_radius: u32,
    /// Zero-mean jitter amplitude added to each return (dB).
    pub noise: f64,
    /// Minimum normal alignment with the beam to register a return.
    pub parallel_threshold: f64,
    #[serde(rename = "transmittedPowerW")]
    pub transmitted_power_w: f64,
    #[serde(rename = "antennaGainDBi")]
    pub antenna_gain_dbi: f64,
    #[serde(rename = "wavelengthM")]
    pub wavelength_m: f64,
    #[serde(rename = "systemLossesDB")]
    pub system_losses_db: f64,
    /// Radar cross section of a single rain cell (m²).
    pub rain_rcs: f64,
    /// Reflectivity of scene objects that do not carry their own.
    pub default_reflectivity: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            height_res: DEFAULT_HEIGHT_RES,
            width_res: DEFAULT_WIDTH_RES,
            resolution: DEFAULT_RESOLUTION_DEG,
            max_range: DEFAULT_MAX_RANGE,
            min_range: DEFAULT_MIN_RANGE,
            vertical_angle: DEFAULT_VERTICAL_ANGLE_DEG,
            beam_width: DEFAULT_BEAM_WIDTH_DEG,
            image_radius: DEFAULT_IMAGE_RADIUS,
            noise: DEFAULT_NOISE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            transmitted_power_w: DEFAULT_TRANSMITTED_POWER_W,
            antenna_gain_dbi: DEFAULT_ANTENNA_GAIN_DBI,
            wavelength_m: DEFAULT_WAVELENGTH_M,
            system_losses_db: DEFAULT_SYSTEM_LOSSES_DB,
            rain_rcs: DEFAULT_RAIN_RCS,
            default_reflectivity: DEFAULT_REFLECTIVITY,
        }
    }
}

impl RadarConfig {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RadarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Every floating-point option with its JSON name.
    fn float_fields(&self) -> [(&'static str, f64); 13] {
        [
            ("resolution", self.resolution),
            ("maxRange", self.max_range),
            ("minRange", self.min_range),
            ("verticalAngle", self.vertical_angle),
            ("beamWidth", self.beam_width),
            ("noise", self.noise),
            ("parallelThreshold", self.parallel_threshold),
            ("transmittedPowerW", self.transmitted_power_w),
            ("antennaGainDBi", self.antenna_gain_dbi),
            ("wavelengthM", self.wavelength_m),
            ("systemLossesDB", self.system_losses_db),
            ("rainRcs", self.rain_rcs),
            ("defaultReflectivity", self.default_reflectivity),
        ]
    }

    /// Reject configurations the radar cannot scan with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Non-finite values reach the samplers as range bounds.
        for (field, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite, got {value}"),
                ));
            }
        }
        if !(self.resolution > 0.0) || self.resolution > FULL_ROTATION_DEG {
            return Err(ConfigError::invalid(
                "resolution",
                format!("must be in (0, 360], got {}", self.resolution),
            ));
        }
        if self.image_radius == 0 {
            return Err(ConfigError::invalid("imageRadius", "must be positive"));
        }
        if self.width_res == 0 || self.height_res == 0 {
            return Err(ConfigError::invalid(
                "widthRes/heightRes",
                format!("must be positive, got {}x{}", self.width_res, self.height_res),
            ));
        }
        if !(self.min_range >= 0.0) || !(self.max_range > self.min_range) {
            return Err(ConfigError::invalid(
                "minRange/maxRange",
                format!(
                    "need 0 <= minRange < maxRange, got {} and {}",
                    self.min_range, self.max_range
                ),
            ));
        }
        if !(self.vertical_angle > 0.0 && self.vertical_angle < 180.0) {
            return Err(ConfigError::invalid(
                "verticalAngle",
                format!("must be in (0, 180), got {}", self.vertical_angle),
            ));
        }
        if !(self.beam_width > 0.0 && self.beam_width < 180.0) {
            return Err(ConfigError::invalid(
                "beamWidth",
                format!("must be in (0, 180), got {}", self.beam_width),
            ));
        }
        if !(0.0..1.0).contains(&self.parallel_threshold) {
            return Err(ConfigError::invalid(
                "parallelThreshold",
                format!("must be in [0, 1), got {}", self.parallel_threshold),
            ));
        }
        // The jitter span is 2·noise and must not overflow.
        if !(self.noise >= 0.0) || !(2.0 * self.noise).is_finite() {
            return Err(ConfigError::invalid(
                "noise",
                format!("must be non-negative and bounded, got {}", self.noise),
            ));
        }
        if !(self.transmitted_power_w > 0.0) {
            return Err(ConfigError::invalid("transmittedPowerW", "must be positive"));
        }
        if !(self.wavelength_m > 0.0) {
            return Err(ConfigError::invalid("wavelengthM", "must be positive"));
        }
        if !(self.rain_rcs >= 0.0) || !(self.default_reflectivity >= 0.0) {
            return Err(ConfigError::invalid(
                "rainRcs/defaultReflectivity",
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Number of PPI rows (azimuth steps per rotation).
    pub fn rows(&self) -> usize {
        ((FULL_ROTATION_DEG / self.resolution).round() as usize).max(1)
    }

    /// Number of range bins per PPI row.
    pub fn range_bins(&self) -> usize {
        self.image_radius as usize
    }

    /// Antenna gain as a linear ratio.
    pub fn gain_linear(&self) -> f64 {
        10f64.powf(self.antenna_gain_dbi / 10.0)
    }

    /// System losses as a linear ratio.
    pub fn losses_linear(&self) -> f64 {
        10f64.powf(self.system_losses_db / 10.0)
    }

    /// Range-independent part of the monostatic radar equation:
    /// `Pt · G² · λ² / ((4π)³ · L)`.
    pub fn radar_constant(&self) -> f64 {
        let g = self.gain_linear();
        let lambda = self.wavelength_m;
        (self.transmitted_power_w * g * g * lambda * lambda)
            / ((4.0 * PI).powi(3) * self.losses_linear())
    }
}
