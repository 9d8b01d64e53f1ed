//! Error types for the data-loader crate.
//!
//! CSV failures carry the file and line of the offending row; integrity
//! failures carry the rating that broke the invariant.

use crate::types::{MovieId, UserId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading and validating the rating store
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// A required export file is absent from the dataset directory
    #[error("Missing dataset file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be decoded into its record type
    #[error("{file} line {line}: {reason}")]
    Csv {
        file: String,
        line: u64,
        reason: String,
    },

    /// A row has a different number of columns than the header
    #[error("{file} line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        file: String,
        line: u64,
        expected: u64,
        found: u64,
    },

    /// A rating refers to a movie that is not in movies.csv
    #[error("User {user_id} rated unknown movie {movie_id}")]
    UnknownMovie { user_id: UserId, movie_id: MovieId },

    /// A rating lies outside the MovieLens half-star scale
    #[error("User {user_id} gave movie {movie_id} an out-of-range rating {rating}")]
    RatingOutOfRange {
        user_id: UserId,
        movie_id: MovieId,
        rating: f32,
    },

    /// Title index or user universe no longer matches the ratings
    #[error("Secondary indices are stale; call build_secondary_indices")]
    StaleIndex,
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
