//! Neighbor Finder - favorite titles to a taste neighborhood
//!
//! ## Algorithm
//! 1. Resolve each favorite title to a movie id (exact match)
//! 2. Ask the rating predictor how every known user would rate that movie
//! 3. Rank users by predicted rating, highest first
//! 4. Keep the top `neighbors_per_title` users of each title
//! 5. Concatenate the per-title lists (duplicates kept)
//!
//! Step 2 dominates: one predictor call per (title, user). Calls for a title
//! run in parallel across users. A cancel flag is polled before every call so
//! an abandoned request stops issuing predictions.

use crate::error::{RecommendError, Result};
use data_loader::{DataIndex, MovieId, UserId};
use predictor::RatingPredictor;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Outcome of ranking the user universe for one movie
#[derive(Debug, Default)]
struct UserRanking {
    top_users: Vec<UserId>,
    attempted: usize,
    failed: usize,
}

/// Finds users predicted to like the caller's favorite movies
#[derive(Clone)]
pub struct NeighborFinder {
    /// Shared read-only rating store; provides titles and the user universe
    data_index: Arc<DataIndex>,
    predictor: Arc<dyn RatingPredictor>,

    /// Users kept per favorite title
    neighbors_per_title: usize,

    /// Failed share of predictions above which the search is abandoned
    max_failure_ratio: f64,
}

impl NeighborFinder {
    pub fn new(data_index: Arc<DataIndex>, predictor: Arc<dyn RatingPredictor>) -> Self {
        Self {
            data_index,
            predictor,
            neighbors_per_title: 20,
            max_failure_ratio: 0.5,
        }
    }

    /// Configure how many users each title contributes (default: 20)
    pub fn with_neighbors_per_title(mut self, count: usize) -> Self {
        self.neighbors_per_title = count;
        self
    }

    /// Configure the tolerated share of failed predictions (default: 0.5)
    pub fn with_max_failure_ratio(mut self, ratio: f64) -> Self {
        self.max_failure_ratio = ratio;
        self
    }

    /// Find the neighbor users for a list of favorite titles.
    ///
    /// Unknown titles are skipped. The result may contain the same user more
    /// than once when they rank highly for several favorites.
    pub fn find_neighbors<S: AsRef<str>>(&self, favorite_titles: &[S]) -> Result<Vec<UserId>> {
        self.find_neighbors_with_cancel(favorite_titles, &AtomicBool::new(false))
    }

    /// Same as [`find_neighbors`](Self::find_neighbors), but gives up with
    /// [`RecommendError::Cancelled`] once `cancel` is set.
    ///
    /// No predictor call starts after the flag is observed.
    #[instrument(skip(self, favorite_titles, cancel), fields(titles = favorite_titles.len()))]
    pub fn find_neighbors_with_cancel<S: AsRef<str>>(
        &self,
        favorite_titles: &[S],
        cancel: &AtomicBool,
    ) -> Result<Vec<UserId>> {
        let mut neighbors = Vec::with_capacity(favorite_titles.len() * self.neighbors_per_title);
        let mut attempted = 0;
        let mut failed = 0;

        for title in favorite_titles {
            if cancel.load(Ordering::Relaxed) {
                return Err(RecommendError::Cancelled);
            }
            let Some(movie_id) = self.resolve_title(title.as_ref()) else {
                continue;
            };

            let ranking = self.rank_users(movie_id, cancel)?;
            debug!(
                "Movie {} contributed {} neighbors ({} of {} predictions failed)",
                movie_id,
                ranking.top_users.len(),
                ranking.failed,
                ranking.attempted
            );
            attempted += ranking.attempted;
            failed += ranking.failed;
            neighbors.extend(ranking.top_users);
        }

        if attempted > 0 && failed as f64 / attempted as f64 > self.max_failure_ratio {
            warn!(
                "Predictor {} failed {} of {} predictions",
                self.predictor.name(),
                failed,
                attempted
            );
            return Err(RecommendError::PredictorUnavailable { failed, attempted });
        }

        debug!("Found {} neighbors (with repeats)", neighbors.len());
        Ok(neighbors)
    }

    /// Resolve a title to a movie id by exact match.
    ///
    /// When several movies share the title, the first one loaded wins.
    pub fn resolve_title(&self, title: &str) -> Option<MovieId> {
        match self.data_index.find_movies_by_title(title) {
            [] => {
                warn!("Unknown title {:?}, skipping", title);
                None
            }
            [only] => Some(*only),
            [first, ..] => {
                warn!(
                    "Title {:?} matches several movies, using movie {}",
                    title, first
                );
                Some(*first)
            }
        }
    }

    /// Rank the whole user universe for one movie and keep the top users
    fn rank_users(&self, movie_id: MovieId, cancel: &AtomicBool) -> Result<UserRanking> {
        let universe = self.data_index.user_universe();

        // Indexed parallel collect keeps universe order
        let predictions: Vec<(UserId, Option<f32>)> = universe
            .par_iter()
            .map(|&user_id| {
                if cancel.load(Ordering::Relaxed) {
                    return (user_id, None);
                }
                match self.predictor.predict(movie_id, user_id) {
                    Ok(estimate) if estimate.is_finite() => (user_id, Some(estimate)),
                    Ok(estimate) => {
                        debug!("Non-finite prediction {} for user {}", estimate, user_id);
                        (user_id, None)
                    }
                    Err(e) => {
                        debug!("Prediction failed for user {}: {}", user_id, e);
                        (user_id, None)
                    }
                }
            })
            .collect();

        // Skipped calls are not failures; the whole ranking is void
        if cancel.load(Ordering::Relaxed) {
            return Err(RecommendError::Cancelled);
        }

        let attempted = predictions.len();
        let mut scored: Vec<(UserId, f32)> = predictions
            .into_iter()
            .filter_map(|(user_id, estimate)| estimate.map(|e| (user_id, e)))
            .collect();
        let failed = attempted - scored.len();

        // Stable sort: equal predictions keep ascending user order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.neighbors_per_title);

        Ok(UserRanking {
            top_users: scored.into_iter().map(|(user_id, _)| user_id).collect(),
            attempted,
            failed,
        })
    }
}
