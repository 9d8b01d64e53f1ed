//! Aggregator - neighborhood ratings to per-movie statistics
//!
//! Neighbor ids are treated as a set: a user listed twice contributes their
//! ratings once. Grouping is keyed by movie id; the title is attached only for
//! output.

use crate::types::TitleStats;
use data_loader::{DataIndex, MovieId, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Aggregator {
    data_index: Arc<DataIndex>,
}

impl Aggregator {
    pub fn new(data_index: Arc<DataIndex>) -> Self {
        Self { data_index }
    }

    /// Count and average the neighbors' ratings per movie.
    ///
    /// Movies no neighbor rated are absent. Rows are ordered by
    /// `(title, movie_id)` so identical inputs give identical tables.
    pub fn aggregate(&self, neighbor_user_ids: &[UserId]) -> Vec<TitleStats> {
        // Ordered so per-movie sums accumulate in the same order every call
        let neighbors: BTreeSet<UserId> = neighbor_user_ids.iter().copied().collect();

        // (sum, count) per movie
        let mut totals: HashMap<MovieId, (f64, u32)> = HashMap::new();
        for &user_id in &neighbors {
            for rating in self.data_index.get_user_ratings(user_id) {
                let entry = totals.entry(rating.movie_id).or_insert((0.0, 0));
                entry.0 += rating.rating as f64;
                entry.1 += 1;
            }
        }

        let mut stats: Vec<TitleStats> = totals
            .into_iter()
            .filter_map(|(movie_id, (sum, count))| {
                let Some(movie) = self.data_index.get_movie(movie_id) else {
                    warn!("Rating references unknown movie {}, dropping it", movie_id);
                    return None;
                };
                Some(TitleStats {
                    movie_id,
                    title: movie.title.clone(),
                    rating_count: count,
                    rating_mean: sum / count as f64,
                })
            })
            .collect();

        stats.sort_by(|a, b| a.title.cmp(&b.title).then(a.movie_id.cmp(&b.movie_id)));

        debug!(
            "Aggregated {} distinct neighbors into {} movies",
            neighbors.len(),
            stats.len()
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Movie, Rating};

    fn create_test_index() -> Arc<DataIndex> {
        let mut index = DataIndex::new();

        for (id, title) in [(1, "B"), (2, "A"), (3, "C"), (4, "A")] {
            index.insert_movie(Movie {
                id,
                title: title.to_string(),
                year: None,
                genres: vec![],
            });
        }

        let ratings = [
            (1, 1, 4.0),
            (2, 1, 5.0),
            (3, 1, 3.0),
            (1, 2, 2.0),
            (2, 2, 3.0),
            (3, 3, 5.0),
            (9, 4, 1.0),
        ];
        for (user_id, movie_id, rating) in ratings {
            index.insert_rating(Rating { user_id, movie_id, rating });
        }

        index.build_secondary_indices();
        Arc::new(index)
    }

    #[test]
    fn test_counts_and_means() {
        let aggregator = Aggregator::new(create_test_index());
        let stats = aggregator.aggregate(&[1, 2, 3]);

        assert_eq!(stats.len(), 3);

        let b = stats.iter().find(|s| s.movie_id == 1).unwrap();
        assert_eq!(b.rating_count, 3);
        assert!((b.rating_mean - 4.0).abs() < 1e-12);

        let a = stats.iter().find(|s| s.movie_id == 2).unwrap();
        assert_eq!(a.rating_count, 2);
        assert!((a.rating_mean - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_membership_only() {
        let aggregator = Aggregator::new(create_test_index());

        // Repeating a neighbor does not double their ratings
        let once = aggregator.aggregate(&[1, 2]);
        let repeated = aggregator.aggregate(&[1, 1, 2, 2, 2]);
        assert_eq!(once, repeated);
    }

    #[test]
    fn test_unrated_movies_are_absent() {
        let aggregator = Aggregator::new(create_test_index());
        let stats = aggregator.aggregate(&[3]);

        let ids: Vec<MovieId> = stats.iter().map(|s| s.movie_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_same_title_stays_separate_and_ordered() {
        let aggregator = Aggregator::new(create_test_index());
        let stats = aggregator.aggregate(&[1, 2, 3, 9]);

        // Movies 2 and 4 share the title "A" but are different movies
        let order: Vec<(String, MovieId)> = stats
            .iter()
            .map(|s| (s.title.clone(), s.movie_id))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), 2),
                ("A".to_string(), 4),
                ("B".to_string(), 1),
                ("C".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_empty_neighbors() {
        let aggregator = Aggregator::new(create_test_index());
        assert!(aggregator.aggregate(&[]).is_empty());
        assert!(aggregator.aggregate(&[404]).is_empty());
    }
}
