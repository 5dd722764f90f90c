//! Polar accumulator (PPI buffer).
//!
//! A fixed `[rows][range bins]` grid owned by one radar. Each tick writes
//! exactly one row: the row is rebuilt in a scratch buffer and committed
//! whole, so a snapshot never observes a half-written row. Rows are never
//! cleared in bulk; a row keeps the previous rotation's data until it is
//! revisited.

use rand_chacha::ChaCha8Rng;

use searadar_core::error::ScorerError;

use crate::capture::Sample;
use crate::clutter::RainClutter;
use crate::scorer::SignalScorer;
use crate::signal::SignalModel;

/// Maps a distance onto a range bin. With `bins == max_range` the bin is
/// simply the rounded distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBins {
    max_range: f64,
    bins: usize,
}

impl RangeBins {
    pub fn new(max_range: f64, bins: usize) -> Self {
        Self { max_range, bins }
    }

    pub fn len(&self) -> usize {
        self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins == 0
    }

    /// Bin index for `distance`, clamped to the last bin.
    pub fn bin(&self, distance: f64) -> usize {
        let scaled = (distance.max(0.0) * self.bins as f64 / self.max_range).round() as usize;
        scaled.min(self.bins.saturating_sub(1))
    }
}

/// Read-only copy of a PPI buffer taken for export.
#[derive(Debug, Clone, PartialEq)]
pub struct PpiSnapshot {
    /// Number of row commits the buffer had seen when copied.
    pub generation: u64,
    pub rows: Vec<Vec<u32>>,
}

/// Polar detection image of one radar.
#[derive(Debug, Clone)]
pub struct PpiBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<u32>,
    scratch: Vec<u32>,
    generation: u64,
}

impl PpiBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
            scratch: vec![0; cols],
            generation: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of committed row writes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Row index for an azimuth: `round(azimuth / resolution)` modulo rows.
    pub fn row_index(&self, azimuth: f64, resolution: f64) -> usize {
        ((azimuth / resolution).round() as usize) % self.rows
    }

    pub fn row(&self, index: usize) -> &[u32] {
        let start = index * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// Recompute one row from a tick's samples.
    ///
    /// The row is cleared first, so writing the same samples twice gives
    /// the same row. On scorer failure the committed row is left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn write_row(
        &mut self,
        index: usize,
        samples: &[Sample],
        scorer: &mut dyn SignalScorer,
        model: &SignalModel,
        bins: &RangeBins,
        clutter: &RainClutter,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), ScorerError> {
        let index = index % self.rows;
        self.scratch.fill(0);
        scorer.score_row(samples, model, bins, rng, &mut self.scratch)?;
        clutter.apply(model, bins, rng, &mut self.scratch);

        let start = index * self.cols;
        self.cells[start..start + self.cols].copy_from_slice(&self.scratch);
        self.generation += 1;
        Ok(())
    }

    /// Copy the full buffer.
    pub fn snapshot(&self) -> PpiSnapshot {
        PpiSnapshot {
            generation: self.generation,
            rows: self.cells.chunks(self.cols).map(<[u32]>::to_vec).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use rand::SeedableRng;
    use searadar_core::config::RadarConfig;
    use searadar_core::enums::WeatherState;

    use crate::scorer::CpuBatchScorer;

    fn facing_sample(distance: f64) -> Sample {
        Sample {
            normal: DVec3::Z,
            distance,
            reflectivity: 1.0,
        }
    }

    fn setup() -> (RadarConfig, SignalModel, RangeBins) {
        let config = RadarConfig {
            max_range: 5000.0,
            min_range: 10.0,
            image_radius: 5000,
            ..Default::default()
        };
        let model = SignalModel::from_config(&config, WeatherState::default());
        let bins = RangeBins::new(config.max_range, config.range_bins());
        (config, model, bins)
    }

    #[test]
    fn test_range_bins() {
        let bins = RangeBins::new(5000.0, 5000);
        assert_eq!(bins.bin(2500.0), 2500);
        assert_eq!(bins.bin(2500.4), 2500);
        assert_eq!(bins.bin(5000.0), 4999);
        assert_eq!(bins.bin(-3.0), 0);

        let coarse = RangeBins::new(5000.0, 1000);
        assert_eq!(coarse.bin(2500.0), 500);
    }

    #[test]
    fn test_row_index_wraps() {
        let ppi = PpiBuffer::new(720, 4);
        assert_eq!(ppi.row_index(0.0, 0.5), 0);
        assert_eq!(ppi.row_index(90.0, 0.5), 180);
        assert_eq!(ppi.row_index(359.5, 0.5), 719);
        assert_eq!(ppi.row_index(360.0, 0.5), 0);
    }

    #[test]
    fn test_samples_accumulate_in_same_bin() {
        let (config, model, bins) = setup();
        let mut ppi = PpiBuffer::new(config.rows(), config.range_bins());
        let mut scorer = CpuBatchScorer;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let single = vec![facing_sample(2500.0)];
        ppi.write_row(3, &single, &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        let one = ppi.row(3)[2500];
        assert!(one > 0);

        let triple = vec![facing_sample(2500.0); 3];
        ppi.write_row(3, &triple, &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        assert_eq!(ppi.row(3)[2500], one * 3);
    }

    #[test]
    fn test_write_row_is_idempotent() {
        let (config, model, bins) = setup();
        let mut ppi = PpiBuffer::new(config.rows(), config.range_bins());
        let mut scorer = CpuBatchScorer;
        let samples = vec![facing_sample(1200.0), facing_sample(3000.0), facing_sample(3000.2)];

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        ppi.write_row(10, &samples, &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        let first = ppi.row(10).to_vec();
        ppi.write_row(10, &samples, &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        assert_eq!(ppi.row(10), first.as_slice());
        assert_eq!(ppi.generation(), 2);
    }

    #[test]
    fn test_rows_persist_until_overwritten() {
        let (config, model, bins) = setup();
        let mut ppi = PpiBuffer::new(config.rows(), config.range_bins());
        let mut scorer = CpuBatchScorer;
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        ppi.write_row(5, &[facing_sample(800.0)], &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        ppi.write_row(6, &[], &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        assert!(ppi.row(5)[800] > 0, "row 5 must survive a write to row 6");

        ppi.write_row(5, &[], &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        assert!(ppi.row(5).iter().all(|&v| v == 0), "rewrite clears the row");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let (config, model, bins) = setup();
        let mut ppi = PpiBuffer::new(config.rows(), config.range_bins());
        let mut scorer = CpuBatchScorer;
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let before = ppi.snapshot();
        assert_eq!(before.rows.len(), config.rows());
        assert_eq!(before.rows[0].len(), config.range_bins());

        ppi.write_row(0, &[facing_sample(900.0)], &mut scorer, &model, &bins, &RainClutter::none(), &mut rng)
            .unwrap();
        assert_eq!(before.rows[0][900], 0);
        assert_eq!(before.generation, 0);
        let after = ppi.snapshot();
        assert!(after.rows[0][900] > 0);
        assert_eq!(after.generation, 1);
    }
}
