//! Error types for the recommendation pipeline.

use std::time::Duration;
use thiserror::Error;

/// Failures a recommendation request can surface to its caller.
///
/// Unknown titles and empty neighborhoods are not errors: they degrade to an
/// empty recommendation list.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The caller supplied no favorite titles
    #[error("At least one favorite title is required")]
    EmptyFavorites,

    /// The caller asked for zero recommendations
    #[error("top_n must be at least 1, got {0}")]
    InvalidTopN(usize),

    /// Too many predictor calls failed for the result to mean anything
    #[error("Rating predictor unavailable: {failed} of {attempted} predictions failed")]
    PredictorUnavailable { failed: usize, attempted: usize },

    /// The request did not finish in time
    #[error("Recommendation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller stopped waiting and the remaining work was abandoned
    #[error("Recommendation was cancelled")]
    Cancelled,

    /// Configuration file could not be read or parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unexpected failure outside the pipeline itself (e.g. a worker panic)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;
