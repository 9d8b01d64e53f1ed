//! Core domain types for the rating store.
//!
//! The store holds two read-only tables (movies and ratings) plus the
//! indices the recommendation pipeline queries:
//! - ratings grouped by user and by movie
//! - titles mapped to movie ids, in load order
//! - the user universe (every user that appears in a rating)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// Lowest rating the MovieLens exports allow
pub const MIN_RATING: f32 = 0.5;

/// Highest rating the MovieLens exports allow
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Movie-related Types
// =============================================================================

/// A movie from the metadata table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Full title as it appears in the dataset, e.g. "Toy Story (1995)"
    pub title: String,
    /// Year extracted from the title, if present
    pub year: Option<u16>,
    /// Raw genre labels ("Adventure", "Sci-Fi", "(no genres listed)", ...)
    pub genres: Vec<String>,
}

// =============================================================================
// Rating Type
// =============================================================================

/// A single historical rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0
    pub rating: f32,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Whole-dataset statistics for a movie (all users, not a neighborhood)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex - The Rating Store
// =============================================================================

/// In-memory rating store shared read-only by every pipeline stage.
///
/// Loaded once per process and handed around as `Arc<DataIndex>`.
#[derive(Debug)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,
    /// Movie ids in the order they were inserted (file order when loaded)
    pub(crate) movie_order: Vec<MovieId>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    /// Exact title -> movie ids, in insertion order
    pub(crate) title_index: HashMap<String, Vec<MovieId>>,
    /// Every user that appears in at least one rating, ascending
    pub(crate) user_universe: Vec<UserId>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: HashMap::new(),
            movie_order: Vec::new(),
            user_ratings: HashMap::new(),
            movie_ratings: HashMap::new(),
            title_index: HashMap::new(),
            user_universe: Vec::new(),
            movie_stats: HashMap::new(),
        }
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All movie ids in insertion order
    pub fn get_all_movie_ids(&self) -> &[MovieId] {
        &self.movie_order
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Movie ids whose title matches exactly, in insertion order.
    ///
    /// More than one id means the title is ambiguous in the dataset.
    pub fn find_movies_by_title(&self, title: &str) -> &[MovieId] {
        self.title_index
            .get(title)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every user with at least one rating, ascending.
    ///
    /// Built by `build_secondary_indices`; empty before that.
    pub fn user_universe(&self) -> &[UserId] {
        &self.user_universe
    }

    /// Get precomputed whole-dataset statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Insert a movie into the index
    pub fn insert_movie(&mut self, movie: Movie) {
        if !self.movies.contains_key(&movie.id) {
            self.movie_order.push(movie.id);
        }
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update the per-user and per-movie lists
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.movies.len(), total_ratings)
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
