//! # Data Loader Crate
//!
//! Rating store for the recommendation engine: loads a MovieLens "latest"
//! export (`movies.csv`, `ratings.csv`) into an in-memory [`DataIndex`].
//!
//! ## Main Components
//!
//! - **types**: domain types (Movie, Rating, DataIndex, MovieStats)
//! - **parser**: CSV parsing into Rust structs
//! - **index**: loading, secondary indices, validation
//! - **error**: error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/ml-latest-small"))?;
//!
//! let ids = index.find_movies_by_title("Toy Story (1995)");
//! println!("{} users in the universe", index.user_universe().len());
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{DataLoadError, Result};
pub use types::{DataIndex, MAX_RATING, MIN_RATING, Movie, MovieId, MovieStats, Rating, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        let (users, movies, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(ratings, 0);
    }

    #[test]
    fn test_insert_movie() {
        let mut index = DataIndex::new();

        let movie = Movie {
            id: 1,
            title: "Toy Story (1995)".to_string(),
            year: Some(1995),
            genres: vec!["Adventure".to_string(), "Animation".to_string()],
        };

        index.insert_movie(movie.clone());
        index.insert_movie(movie);

        let retrieved = index.get_movie(1).unwrap();
        assert_eq!(retrieved.id, 1);
        assert_eq!(retrieved.year, Some(1995));
        assert_eq!(index.get_all_movie_ids(), &[1]);
    }

    #[test]
    fn test_insert_rating() {
        let mut index = DataIndex::new();

        index.insert_rating(Rating {
            user_id: 1,
            movie_id: 1193,
            rating: 5.0,
        });

        let user_ratings = index.get_user_ratings(1);
        assert_eq!(user_ratings.len(), 1);
        assert_eq!(user_ratings[0].rating, 5.0);

        let movie_ratings = index.get_movie_ratings(1193);
        assert_eq!(movie_ratings.len(), 1);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_movie(999).is_none());
        assert!(index.get_user_ratings(999).is_empty());
        assert!(index.get_movie_ratings(999).is_empty());
        assert!(index.find_movies_by_title("Nothing").is_empty());
        assert!(index.user_universe().is_empty());
    }
}
