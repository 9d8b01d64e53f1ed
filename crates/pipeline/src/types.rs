//! Per-request tables passed between pipeline stages.

use data_loader::MovieId;
use serde::Serialize;

/// Neighborhood statistics for one movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleStats {
    pub movie_id: MovieId,
    pub title: String,
    /// Number of neighbor ratings, always at least 1
    pub rating_count: u32,
    /// Arithmetic mean of those ratings
    pub rating_mean: f64,
}

/// [`TitleStats`] plus the shrinkage-weighted rating
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleScore {
    pub movie_id: MovieId,
    pub title: String,
    pub rating_count: u32,
    pub rating_mean: f64,
    pub weighted_rating: f64,
}

impl TitleScore {
    /// Feature vector used for similarity: (count, mean, weighted)
    pub fn features(&self) -> [f64; 3] {
        [
            self.rating_count as f64,
            self.rating_mean,
            self.weighted_rating,
        ]
    }
}

/// One entry of a similarity ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTitle {
    pub movie_id: MovieId,
    pub title: String,
    /// Cosine similarity to the anchor
    pub similarity: f64,
}
