//! Similarity Selector - top-N titles closest to an anchor
//!
//! ## Algorithm
//! 1. Anchor row chosen by an [`AnchorStrategy`]
//! 2. Cosine similarity of every feature row `(count, mean, weighted)` to the
//!    anchor's, in score-table order
//! 3. Stable descending sort, truncated to `top_n`
//!
//! Only the anchor's row of the pairwise matrix is ever read, so only that
//! row is computed: O(n) per request.

use crate::similarity::cosine_similarity;
use crate::traits::AnchorStrategy;
use crate::types::{RankedTitle, TitleScore};
use tracing::debug;

/// Anchor row and the ranking built around it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Index of the anchor in the score table
    pub anchor: Option<usize>,
    pub ranked: Vec<RankedTitle>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilaritySelector {
    exclude_anchor: bool,
}

impl SimilaritySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the anchor itself from the ranking (default: kept)
    pub fn with_exclude_anchor(mut self, exclude: bool) -> Self {
        self.exclude_anchor = exclude;
        self
    }

    /// Rank titles by similarity to the chosen anchor.
    ///
    /// An empty table or a strategy that picks no anchor gives an empty
    /// selection.
    pub fn rank(&self, scores: &[TitleScore], top_n: usize, anchor: &dyn AnchorStrategy) -> Selection {
        if scores.is_empty() {
            return Selection::default();
        }
        let Some(anchor_idx) = anchor.choose(scores).filter(|&idx| idx < scores.len()) else {
            debug!("{} chose no anchor among {} titles", anchor.name(), scores.len());
            return Selection::default();
        };

        let anchor_features = scores[anchor_idx].features();
        let mut candidates: Vec<(usize, f64)> = scores
            .iter()
            .enumerate()
            .filter(|&(idx, _)| !(self.exclude_anchor && idx == anchor_idx))
            .map(|(idx, score)| (idx, cosine_similarity(&anchor_features, &score.features())))
            .collect();

        // Stable: equal similarities keep score-table order
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(top_n);

        debug!(
            "Anchor {:?} ({}) selected {} of {} titles",
            scores[anchor_idx].title,
            anchor.name(),
            candidates.len(),
            scores.len()
        );

        Selection {
            anchor: Some(anchor_idx),
            ranked: candidates
                .into_iter()
                .map(|(idx, similarity)| RankedTitle {
                    movie_id: scores[idx].movie_id,
                    title: scores[idx].title.clone(),
                    similarity,
                })
                .collect(),
        }
    }

    /// Titles of [`rank`](Self::rank), in order
    pub fn select(&self, scores: &[TitleScore], top_n: usize, anchor: &dyn AnchorStrategy) -> Vec<String> {
        self.rank(scores, top_n, anchor)
            .ranked
            .into_iter()
            .map(|r| r.title)
            .collect()
    }
}
