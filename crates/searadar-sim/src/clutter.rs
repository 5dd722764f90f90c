//! Rain clutter.
//!
//! In rain, each PPI row receives a handful of randomly placed rain returns
//! on top of the target returns. The drop probability is drawn once per
//! weather change from the tier's range; the drop count is fixed per tier.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use searadar_core::enums::WeatherState;

use crate::ppi::RangeBins;
use crate::signal::SignalModel;

/// Rain clutter profile of one radar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RainClutter {
    /// Probability that each drop produces a return.
    pub probability: f64,
    /// Drops sampled per row.
    pub drops: u32,
}

impl RainClutter {
    /// No clutter (clear weather).
    pub fn none() -> Self {
        Self::default()
    }

    /// Draw a clutter profile for the given weather.
    pub fn from_weather(weather: WeatherState, rng: &mut ChaCha8Rng) -> Self {
        match weather.rain_profile() {
            Some((low, high, drops)) => Self {
                probability: rng.gen_range(low..high),
                drops,
            },
            None => Self::none(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.drops > 0 && self.probability > 0.0
    }

    /// Add rain returns into `row`.
    pub fn apply(
        &self,
        model: &SignalModel,
        bins: &RangeBins,
        rng: &mut ChaCha8Rng,
        row: &mut [u32],
    ) {
        if !self.is_active() {
            return;
        }
        for _ in 0..self.drops {
            if !rng.gen_bool(self.probability) {
                continue;
            }
            let distance = rng.gen_range(model.min_range()..model.max_range());
            let intensity = model.score_rain(distance, rng);
            if intensity > 0 {
                let bin = bins.bin(distance);
                row[bin] = row[bin].saturating_add(intensity);
            }
        }
    }
}
