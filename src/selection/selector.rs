use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::stats::CorrelationMatrix;

/// Trial budget used when nothing else is configured
pub const DEFAULT_TRIALS: usize = 1000;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Group size must be at least 1")]
    InvalidGroupSize,

    #[error("Correlation matrix has no symbols")]
    EmptySymbolSet,

    #[error("No trials requested")]
    NoTrialsRequested,

    #[error("Score is undefined for a group of {size} symbol(s), at least 2 are needed")]
    UndefinedScore { size: usize },
}

/// Outcome of a least-correlated-group search
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    /// Best group found, in matrix column order
    pub group: Vec<String>,
    /// Matrix indices of `group`, ascending
    pub indices: Vec<usize>,
    /// Mean absolute pairwise correlation of `group`
    pub score: f64,
    pub requested_size: usize,
    pub effective_size: usize,
    /// True when `requested_size` exceeded the number of symbols
    pub clamped: bool,
    pub trials: usize,
    /// Zero-based trial at which `group` was first drawn
    pub best_trial: usize,
    /// Best score after each trial, empty unless history is recorded
    pub history: Vec<f64>,
}

/// Monte Carlo search for the subset of symbols with the lowest mean
/// absolute pairwise correlation.
///
/// Each trial draws a uniformly random subset of the requested size
/// without replacement. The search is approximate: the result is the best
/// of the sampled subsets, not necessarily the global optimum.
///
/// Memory use does not grow with `trials` unless `record_history` is set.
#[derive(Debug, Clone)]
pub struct GroupSelector {
    pub trials: usize,
    pub parallel: bool,
    /// Keep the best score after every trial (one `f64` per trial)
    pub record_history: bool,
}

impl Default for GroupSelector {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            parallel: false,
            record_history: false,
        }
    }
}

/// Best candidate so far: group indices, score, trial
type Best = (Vec<usize>, f64, usize);

impl GroupSelector {
    pub fn new(trials: usize) -> Self {
        Self {
            trials,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Run the search with the given random source.
    ///
    /// A `group_size` larger than the symbol count is clamped to it; the
    /// result reports both sizes and sets `clamped`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        matrix: &CorrelationMatrix,
        group_size: usize,
        rng: &mut R,
    ) -> Result<SearchResult, SelectionError> {
        let effective_size = self.validate(matrix, group_size)?;
        let n = matrix.len();

        tracing::info!(
            "Searching {} random groups of {} out of {} symbols{}",
            self.trials,
            effective_size,
            n,
            if self.parallel { " (parallel)" } else { "" }
        );

        let ((indices, score, best_trial), history) = if self.parallel {
            self.run_parallel(matrix, effective_size, rng)?
        } else {
            self.run_sequential(matrix, effective_size, rng)?
        };

        let group = indices.iter().map(|&i| matrix.symbols()[i].clone()).collect();
        tracing::info!(
            "Best group found at trial {}: score {:.4}",
            best_trial + 1,
            score
        );

        Ok(SearchResult {
            group,
            indices,
            score,
            requested_size: group_size,
            effective_size,
            clamped: effective_size < group_size,
            trials: self.trials,
            best_trial,
            history,
        })
    }

    /// Check inputs and return the effective group size
    fn validate(
        &self,
        matrix: &CorrelationMatrix,
        group_size: usize,
    ) -> Result<usize, SelectionError> {
        if matrix.is_empty() {
            return Err(SelectionError::EmptySymbolSet);
        }
        if group_size < 1 {
            return Err(SelectionError::InvalidGroupSize);
        }
        if self.trials == 0 {
            return Err(SelectionError::NoTrialsRequested);
        }

        let effective = group_size.min(matrix.len());
        if effective < group_size {
            tracing::warn!(
                "Only {} valid symbols available, group size reduced from {}",
                matrix.len(),
                group_size
            );
        }
        if effective < 2 {
            return Err(SelectionError::UndefinedScore { size: effective });
        }

        Ok(effective)
    }

    fn run_sequential<R: Rng + ?Sized>(
        &self,
        matrix: &CorrelationMatrix,
        size: usize,
        rng: &mut R,
    ) -> Result<(Best, Vec<f64>), SelectionError> {
        let mut best: Option<Best> = None;
        let mut history = Vec::new();

        for trial in 0..self.trials {
            let candidate = sample_group(matrix.len(), size, rng);
            let score = group_score(matrix, &candidate)?;

            // Strictly lower: the earliest group wins ties
            if best.as_ref().map_or(true, |(_, s, _)| score < *s) {
                tracing::debug!("Trial {}: new best {:.4}", trial + 1, score);
                best = Some((candidate, score, trial));
            }

            if self.record_history {
                if let Some((_, s, _)) = &best {
                    history.push(*s);
                }
            }
        }

        let best = best.ok_or(SelectionError::NoTrialsRequested)?;
        Ok((best, history))
    }

    /// Trials run on the rayon pool, each with its own generator seeded
    /// from one base seed and the trial index. Reduction keeps the lowest
    /// `(score, trial)`, so the outcome does not depend on scheduling.
    fn run_parallel<R: Rng + ?Sized>(
        &self,
        matrix: &CorrelationMatrix,
        size: usize,
        rng: &mut R,
    ) -> Result<(Best, Vec<f64>), SelectionError> {
        let base_seed: u64 = rng.gen();
        let n = matrix.len();
        let score_trial = |trial: usize| {
            let candidate = trial_group(base_seed, trial, n, size);
            group_score(matrix, &candidate).map(|score| (score, trial))
        };

        let (score, best_trial, history) = if self.record_history {
            let scores = (0..self.trials)
                .into_par_iter()
                .map(|trial| score_trial(trial).map(|(score, _)| score))
                .collect::<Result<Vec<f64>, SelectionError>>()?;

            let mut best_trial = 0;
            let mut history = Vec::with_capacity(scores.len());
            for (trial, score) in scores.iter().enumerate() {
                if *score < scores[best_trial] {
                    best_trial = trial;
                }
                history.push(scores[best_trial]);
            }
            (scores[best_trial], best_trial, history)
        } else {
            let (score, best_trial) = (0..self.trials)
                .into_par_iter()
                .map(score_trial)
                .try_reduce_with(|a, b| Ok(lower_first(a, b)))
                .ok_or(SelectionError::NoTrialsRequested)??;
            (score, best_trial, Vec::new())
        };

        // Regenerate the winning group instead of carrying every sample
        let indices = trial_group(base_seed, best_trial, n, size);
        Ok(((indices, score, best_trial), history))
    }
}

/// Lower score wins, ties go to the lower trial index
fn lower_first(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    match a.0.partial_cmp(&b.0) {
        Some(Ordering::Less) => a,
        Some(Ordering::Greater) => b,
        _ => {
            if a.1 <= b.1 {
                a
            } else {
                b
            }
        }
    }
}

/// Group drawn by parallel trial `trial`
fn trial_group(base_seed: u64, trial: usize, n: usize, size: usize) -> Vec<usize> {
    let mut trial_rng = StdRng::seed_from_u64(base_seed.wrapping_add(trial as u64));
    sample_group(n, size, &mut trial_rng)
}

/// Draw `size` distinct indices out of `0..n`, every subset equally likely.
/// Returned ascending.
fn sample_group<R: Rng + ?Sized>(n: usize, size: usize, rng: &mut R) -> Vec<usize> {
    let mut indices = index::sample(rng, n, size).into_vec();
    indices.sort_unstable();
    indices
}

/// Mean absolute correlation over all unordered pairs of `indices`.
///
/// Groups with fewer than two members have no pairs and yield
/// [`SelectionError::UndefinedScore`].
pub fn group_score(matrix: &CorrelationMatrix, indices: &[usize]) -> Result<f64, SelectionError> {
    let k = indices.len();
    if k < 2 {
        return Err(SelectionError::UndefinedScore { size: k });
    }

    let mut sum = 0.0;
    for (pos, &i) in indices.iter().enumerate() {
        for &j in &indices[pos + 1..] {
            sum += matrix.get(i, j).abs();
        }
    }

    Ok(sum / (k * (k - 1) / 2) as f64)
}

/// Seeded generator for reproducible runs, OS entropy otherwise
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
