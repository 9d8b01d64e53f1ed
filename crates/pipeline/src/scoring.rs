//! Scorer - Bayesian-shrinkage weighted rating
//!
//! ```text
//! weighted = count / (count + m) * mean + m / (m + count) * C
//! ```
//! - `C`: mean of all per-movie means in the neighborhood
//! - `m`: a high quantile (default 0.95) of the per-movie rating counts
//!
//! Movies with few ratings are pulled toward `C`; movies with many ratings
//! keep close to their own mean.

use crate::types::{TitleScore, TitleStats};
use serde::Serialize;
use tracing::debug;

/// Neighborhood-wide constants of the weighted rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringConstants {
    /// Mean of the per-movie means
    pub global_mean: f64,
    /// Rating count quantile used as the prior weight
    pub min_votes: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    count_quantile: f64,
}

impl Scorer {
    pub fn new() -> Self {
        Self {
            count_quantile: 0.95,
        }
    }

    /// Configure the rating-count quantile used for `m` (default: 0.95)
    pub fn with_count_quantile(mut self, q: f64) -> Self {
        self.count_quantile = q;
        self
    }

    /// Compute `C` and `m` for a statistics table; `None` when it is empty
    pub fn constants(&self, stats: &[TitleStats]) -> Option<ScoringConstants> {
        if stats.is_empty() {
            return None;
        }

        let global_mean = stats.iter().map(|s| s.rating_mean).sum::<f64>() / stats.len() as f64;
        let counts: Vec<f64> = stats.iter().map(|s| s.rating_count as f64).collect();
        let min_votes = quantile(&counts, self.count_quantile)?;

        Some(ScoringConstants {
            global_mean,
            min_votes,
        })
    }

    /// Attach a weighted rating to every row, keeping row order
    pub fn score(&self, stats: Vec<TitleStats>) -> Vec<TitleScore> {
        let Some(constants) = self.constants(&stats) else {
            return Vec::new();
        };
        debug!(
            "Scoring {} movies with C = {:.4}, m = {:.2}",
            stats.len(),
            constants.global_mean,
            constants.min_votes
        );

        stats
            .into_iter()
            .map(|s| TitleScore {
                weighted_rating: weighted_rating(
                    s.rating_count as f64,
                    s.rating_mean,
                    constants.min_votes,
                    constants.global_mean,
                ),
                movie_id: s.movie_id,
                title: s.title,
                rating_count: s.rating_count,
                rating_mean: s.rating_mean,
            })
            .collect()
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Shrink `mean` toward `global_mean` by the evidence in `count`.
///
/// With `count + min_votes == 0` there is no evidence either way and the
/// global mean is returned.
pub fn weighted_rating(count: f64, mean: f64, min_votes: f64, global_mean: f64) -> f64 {
    let total = count + min_votes;
    if total <= 0.0 {
        return global_mean;
    }
    count / total * mean + min_votes / total * global_mean
}

/// Quantile with linear interpolation between closest ranks.
///
/// The position of `q` in the sorted values is `(n - 1) * q`; fractional
/// positions interpolate between the two neighboring values. Returns `None`
/// for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
