//! Signal model.
//!
//! Scores one sampled pixel from the monostatic radar range equation:
//! `Pr = Pt · G² · λ² · σ / ((4π)³ · R⁴ · L)`, reduced by two-way weather
//! attenuation and reported as whole dB above the receiver reference power.
//! Surfaces nearly perpendicular to the beam and degenerate near-zero hits
//! are rejected before any power is computed.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use searadar_core::config::RadarConfig;
use searadar_core::constants::{DEGENERATE_RANGE, RECEIVER_REFERENCE_POWER_W};
use searadar_core::enums::WeatherState;

/// Per-radar scoring parameters, precomputed from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalModel {
    radar_constant: f64,
    min_range: f64,
    max_range: f64,
    parallel_threshold: f64,
    noise: f64,
    attenuation_db_per_km: f64,
    rain_rcs: f64,
}

impl SignalModel {
    pub fn from_config(config: &RadarConfig, weather: WeatherState) -> Self {
        Self {
            radar_constant: config.radar_constant(),
            min_range: config.min_range,
            max_range: config.max_range,
            parallel_threshold: config.parallel_threshold,
            noise: config.noise,
            attenuation_db_per_km: weather.attenuation_db_per_km(),
            rain_rcs: config.rain_rcs,
        }
    }

    pub fn set_weather(&mut self, weather: WeatherState) {
        self.attenuation_db_per_km = weather.attenuation_db_per_km();
    }

    pub fn min_range(&self) -> f64 {
        self.min_range
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Clamp a raw distance to the instrumented range.
    pub fn clamp_range(&self, distance: f64) -> f64 {
        distance.clamp(self.min_range, self.max_range)
    }

    /// Whether a sample can produce a detection at all.
    pub fn accepts(&self, distance: f64, facing: f64) -> bool {
        facing > self.parallel_threshold && distance > DEGENERATE_RANGE
    }

    /// Two-way weather attenuation factor in (0, 1] at `distance` meters.
    pub fn attenuation(&self, distance: f64) -> f64 {
        let loss_db = self.attenuation_db_per_km * 2.0 * distance / 1000.0;
        10f64.powf(-loss_db / 10.0)
    }

    /// Received power in watts for a reflector of the given cross section.
    pub fn received_power(&self, distance: f64, reflectivity: f64) -> f64 {
        let r2 = distance * distance;
        self.radar_constant * reflectivity * self.attenuation(distance) / (r2 * r2)
    }

    /// Received power as dB above the receiver reference, before noise.
    /// `None` when no power arrives at all.
    pub fn level_db(&self, distance: f64, reflectivity: f64) -> Option<f64> {
        let power = self.received_power(distance, reflectivity);
        if power > 0.0 && power.is_finite() {
            Some(10.0 * (power / RECEIVER_REFERENCE_POWER_W).log10())
        } else {
            None
        }
    }

    /// Score one pixel. Returns the intensity to add to its range bin.
    ///
    /// `facing` is the surface normal's component along the sensor axis.
    /// The RNG is only drawn from when the sample is accepted and noise is
    /// enabled, so rejected pixels never perturb the random stream.
    pub fn score_sample(
        &self,
        distance: f64,
        facing: f64,
        reflectivity: f64,
        rng: &mut ChaCha8Rng,
    ) -> u32 {
        let distance = self.clamp_range(distance);
        if !self.accepts(distance, facing) {
            return 0;
        }
        self.quantize(self.level_db(distance, reflectivity), rng)
    }

    /// Score a rain return at `distance`. Rain has no orientation gate.
    pub fn score_rain(&self, distance: f64, rng: &mut ChaCha8Rng) -> u32 {
        let distance = self.clamp_range(distance);
        if distance <= DEGENERATE_RANGE {
            return 0;
        }
        self.quantize(self.level_db(distance, self.rain_rcs), rng)
    }

    fn quantize(&self, level_db: Option<f64>, rng: &mut ChaCha8Rng) -> u32 {
        let Some(mut level) = level_db else {
            return 0;
        };
        if self.noise > 0.0 {
            level += rng.gen_range(-self.noise..=self.noise);
        }
        level.max(0.0).round() as u32
    }
}
