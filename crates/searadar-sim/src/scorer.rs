//! Signal scorers.
//!
//! A scorer turns one tick's samples into a PPI row: each sample is scored
//! by the [`SignalModel`] and added into the range bin of its distance.
//! Two implementations share that contract: a sequential batch scorer and a
//! data-parallel scorer running on a worker pool.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use searadar_core::enums::ScorerKind;
use searadar_core::error::ScorerError;

use crate::capture::Sample;
use crate::ppi::RangeBins;
use crate::signal::SignalModel;

/// Samples scored per parallel work item.
const PARALLEL_CHUNK: usize = 256;

/// Scores a batch of samples into one PPI row.
pub trait SignalScorer: Send {
    /// Add every sample's intensity into `row`. `row` is already zeroed
    /// and must have one entry per range bin.
    fn score_row(
        &mut self,
        samples: &[Sample],
        model: &SignalModel,
        bins: &RangeBins,
        rng: &mut ChaCha8Rng,
        row: &mut [u32],
    ) -> Result<(), ScorerError>;
}

fn check_row(bins: &RangeBins, row: &[u32]) -> Result<(), ScorerError> {
    if row.len() != bins.len() {
        return Err(ScorerError::BufferMismatch {
            expected: bins.len(),
            actual: row.len(),
        });
    }
    Ok(())
}

/// Sequential scorer on the calling thread. Reference implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBatchScorer;

impl SignalScorer for CpuBatchScorer {
    fn score_row(
        &mut self,
        samples: &[Sample],
        model: &SignalModel,
        bins: &RangeBins,
        rng: &mut ChaCha8Rng,
        row: &mut [u32],
    ) -> Result<(), ScorerError> {
        check_row(bins, row)?;
        for sample in samples {
            let intensity =
                model.score_sample(sample.distance, sample.facing(), sample.reflectivity, rng);
            if intensity > 0 {
                let bin = bins.bin(model.clamp_range(sample.distance));
                row[bin] = row[bin].saturating_add(intensity);
            }
        }
        Ok(())
    }
}

/// Data-parallel scorer.
///
/// Samples are split into fixed chunks; each chunk scores into its own
/// partial row with an RNG stream derived from a per-dispatch seed and the
/// chunk index, and the partial rows are summed. Output therefore does not
/// depend on thread scheduling.
pub struct ParallelScorer {
    pool: ThreadPool,
}

impl ParallelScorer {
    /// Build a scorer with `threads` workers (0 = one per core).
    pub fn new(threads: usize) -> Result<Self, ScorerError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("searadar-scorer-{i}"))
            .build()
            .map_err(|e| ScorerError::Dispatch(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl SignalScorer for ParallelScorer {
    fn score_row(
        &mut self,
        samples: &[Sample],
        model: &SignalModel,
        bins: &RangeBins,
        rng: &mut ChaCha8Rng,
        row: &mut [u32],
    ) -> Result<(), ScorerError> {
        check_row(bins, row)?;
        let seed: u64 = rng.gen();
        let n = bins.len();

        let partial = self.pool.install(|| {
            samples
                .par_chunks(PARALLEL_CHUNK)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let mut local = ChaCha8Rng::seed_from_u64(seed);
                    local.set_stream(chunk_idx as u64);
                    let mut hist = vec![0u32; n];
                    for sample in chunk {
                        let intensity = model.score_sample(
                            sample.distance,
                            sample.facing(),
                            sample.reflectivity,
                            &mut local,
                        );
                        if intensity > 0 {
                            let bin = bins.bin(model.clamp_range(sample.distance));
                            hist[bin] = hist[bin].saturating_add(intensity);
                        }
                    }
                    hist
                })
                .reduce(
                    || vec![0u32; n],
                    |mut acc, hist| {
                        for (a, h) in acc.iter_mut().zip(hist) {
                            *a = a.saturating_add(h);
                        }
                        acc
                    },
                )
        });

        for (r, p) in row.iter_mut().zip(partial) {
            *r = r.saturating_add(p);
        }
        Ok(())
    }
}

/// Build the scorer selected by `kind`.
pub fn build_scorer(kind: ScorerKind) -> Result<Box<dyn SignalScorer>, ScorerError> {
    match kind {
        ScorerKind::CpuBatch => Ok(Box::new(CpuBatchScorer)),
        ScorerKind::Parallel => Ok(Box::new(ParallelScorer::new(0)?)),
    }
}
