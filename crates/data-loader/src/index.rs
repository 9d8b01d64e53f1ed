//! DataIndex building and indexing logic.
//!
//! Loading happens in three steps:
//! - parse movies.csv and ratings.csv (in parallel)
//! - build secondary indices (title lookup, user universe) and statistics
//! - validate referential integrity and the rating scale

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

impl DataIndex {
    /// Load a MovieLens "latest" export from a directory containing
    /// `movies.csv` and `ratings.csv`.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading MovieLens dataset from {:?}", data_dir);

        let movies_path = data_dir.join("movies.csv");
        let ratings_path = data_dir.join("ratings.csv");

        for path in [&movies_path, &ratings_path] {
            if !path.exists() {
                return Err(DataLoadError::MissingFile { path: path.clone() });
            }
        }

        // Ratings dominate the load time, so parse both files side by side
        let (movies, ratings) = rayon::join(
            || parser::parse_movies(&movies_path),
            || parser::parse_ratings(&ratings_path),
        );
        let movies = movies?;
        let ratings = ratings?;

        info!("Parsed {} movies and {} ratings", movies.len(), ratings.len());

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }

        index.build_secondary_indices();
        index.compute_movie_stats();
        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            "DataIndex built and validated: {} users, {} movies, {} ratings",
            users, movies, ratings
        );
        Ok(index)
    }

    /// Build the title index and the user universe.
    ///
    /// Must be called after all movies and ratings are inserted; indices are
    /// rebuilt from scratch each time.
    pub fn build_secondary_indices(&mut self) {
        self.title_index.clear();
        for movie_id in &self.movie_order {
            if let Some(movie) = self.movies.get(movie_id) {
                self.title_index
                    .entry(movie.title.clone())
                    .or_default()
                    .push(*movie_id);
            }
        }

        let mut users: Vec<UserId> = self.user_ratings.keys().copied().collect();
        users.sort_unstable();
        self.user_universe = users;

        let ambiguous = self.title_index.values().filter(|ids| ids.len() > 1).count();
        debug!(
            "Indexed {} titles ({} ambiguous), user universe of {}",
            self.title_index.len(),
            ambiguous,
            self.user_universe.len()
        );
    }

    /// Compute whole-dataset count and average rating for every rated movie
    pub fn compute_movie_stats(&mut self) {
        let movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };

                (movie_id, MovieStats { avg_rating, rating_count })
            })
            .collect();
        self.movie_stats = movie_stats;
    }

    /// Validate data integrity
    ///
    /// Checks that every rating references a known movie and lies within
    /// [`MIN_RATING`, `MAX_RATING`].
    pub fn validate(&self) -> Result<()> {
        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !self.movies.contains_key(&rating.movie_id) {
                    return Err(DataLoadError::UnknownMovie {
                        user_id: rating.user_id,
                        movie_id: rating.movie_id,
                    });
                }
                if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                    return Err(DataLoadError::RatingOutOfRange {
                        user_id: rating.user_id,
                        movie_id: rating.movie_id,
                        rating: rating.rating,
                    });
                }
            }
        }

        if self.user_universe.len() != self.user_ratings.len() {
            return Err(DataLoadError::StaleIndex);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: None,
            genres: vec![],
        }
    }

    #[test]
    fn test_title_index_keeps_insertion_order() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(20, "Hamlet (2000)"));
        index.insert_movie(movie(3, "Hamlet (2000)"));
        index.insert_movie(movie(7, "Heat (1995)"));
        index.build_secondary_indices();

        assert_eq!(index.find_movies_by_title("Hamlet (2000)"), &[20, 3]);
        assert_eq!(index.find_movies_by_title("Heat (1995)"), &[7]);
        assert!(index.find_movies_by_title("Unknown").is_empty());
    }

    #[test]
    fn test_user_universe_covers_all_raters() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(1, "A"));
        index.insert_movie(movie(2, "B"));
        for (user_id, movie_id) in [(9, 1), (2, 2), (5, 1), (2, 1)] {
            index.insert_rating(Rating { user_id, movie_id, rating: 3.0 });
        }
        index.build_secondary_indices();

        // Users who never rated movie 2 are still part of the universe
        assert_eq!(index.user_universe(), &[2, 5, 9]);
    }

    #[test]
    fn test_movie_stats() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(1, "A"));
        for (user_id, rating) in [(1, 5.0), (2, 4.0), (3, 3.0)] {
            index.insert_rating(Rating { user_id, movie_id: 1, rating });
        }
        index.compute_movie_stats();

        let stats = index.get_movie_stats(1).unwrap();
        assert_eq!(stats.rating_count, 3);
        assert!((stats.avg_rating - 4.0).abs() < 1e-6);
        assert!(index.get_movie_stats(2).is_none());
    }

    #[test]
    fn test_validate_rejects_unknown_movie() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(1, "A"));
        index.insert_rating(Rating { user_id: 1, movie_id: 99, rating: 4.0 });
        index.build_secondary_indices();

        let err = index.validate().unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnknownMovie { user_id: 1, movie_id: 99 }
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_scale_rating() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(1, "A"));
        index.insert_rating(Rating { user_id: 1, movie_id: 1, rating: 0.0 });
        index.build_secondary_indices();

        assert!(matches!(
            index.validate(),
            Err(DataLoadError::RatingOutOfRange { movie_id: 1, .. })
        ));
    }

    #[test]
    fn test_validate_requires_indices() {
        let mut index = DataIndex::new();
        index.insert_movie(movie(1, "A"));
        index.insert_rating(Rating { user_id: 1, movie_id: 1, rating: 4.0 });

        assert!(matches!(
            index.validate(),
            Err(DataLoadError::StaleIndex)
        ));
    }

    #[test]
    fn test_load_missing_directory() {
        let result = DataIndex::load_from_files(Path::new("/nonexistent/ml-latest-small"));
        assert!(matches!(result, Err(DataLoadError::MissingFile { .. })));
    }

    #[test]
    fn test_load_small_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n\
             1,\"Lord of the Rings, The (1978)\",Adventure|Animation\n\
             2,Heat (1995),Action|Crime\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("ratings.csv"),
            "userId,movieId,rating,timestamp\n\
             4,1,4.5,964982703\n\
             2,2,3.0,964981247\n\
             4,2,5.0,964982224\n",
        )
        .unwrap();

        let index = DataIndex::load_from_files(dir.path()).unwrap();
        assert_eq!(index.counts(), (2, 2, 3));
        assert_eq!(index.user_universe(), &[2, 4]);
        assert_eq!(
            index.find_movies_by_title("Lord of the Rings, The (1978)"),
            &[1]
        );
    }

    #[test]
    fn test_load_reports_unknown_movie() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movies.csv"), "movieId,title,genres\n1,A (2000),Drama\n")
            .unwrap();
        std::fs::write(
            dir.path().join("ratings.csv"),
            "userId,movieId,rating,timestamp\n3,8,4.0,964982703\n",
        )
        .unwrap();

        assert!(matches!(
            DataIndex::load_from_files(dir.path()),
            Err(DataLoadError::UnknownMovie { user_id: 3, movie_id: 8 })
        ));
    }

    #[test]
    fn test_load_dataset() {
        // Requires the real dataset; place ml-latest-small under data/
        let data_dir = Path::new("../../data/ml-latest-small");

        if data_dir.exists() {
            let index = DataIndex::load_from_files(data_dir).unwrap();
            let (users, movies, ratings) = index.counts();

            assert!(users > 0);
            assert!(movies > 0);
            assert!(ratings > 0);
            assert_eq!(index.user_universe().len(), users);
        }
    }
}
