//! Collaborative-filtering stages for title-based movie recommendations.
//!
//! This crate provides:
//! - NeighborFinder: favorite titles to a neighborhood of like-minded users
//! - Aggregator: per-movie rating count and mean over that neighborhood
//! - Scorer: Bayesian-shrinkage weighted rating
//! - SimilaritySelector: top-N titles closest to an anchor in
//!   (count, mean, weighted) space
//!
//! ## Architecture
//! Each stage is a synchronous function over shared, read-only inputs:
//! 1. NeighborFinder queries the rating predictor for every user
//! 2. Aggregator groups the neighbors' ratings by movie
//! 3. Scorer attaches the weighted rating
//! 4. SimilaritySelector ranks titles against an anchor chosen by an
//!    [`AnchorStrategy`]
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Aggregator, NeighborFinder, RandomAnchor, Scorer, SimilaritySelector};
//!
//! let neighbors = NeighborFinder::new(index.clone(), predictor.clone())
//!     .find_neighbors(&["Toy Story (1995)"])?;
//! let stats = Aggregator::new(index.clone()).aggregate(&neighbors);
//! let scores = Scorer::new().score(stats);
//! let titles = SimilaritySelector::new().select(&scores, 10, &RandomAnchor);
//! ```

pub mod aggregate;
pub mod anchor;
pub mod config;
pub mod error;
pub mod neighbors;
pub mod scoring;
pub mod selector;
pub mod similarity;
pub mod traits;
pub mod types;

// Re-export main types
pub use aggregate::Aggregator;
pub use anchor::{FixedAnchor, RandomAnchor, SeededAnchor};
pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use neighbors::NeighborFinder;
pub use scoring::{Scorer, ScoringConstants};
pub use selector::{Selection, SimilaritySelector};
pub use similarity::{SimilarityMatrix, cosine_similarity};
pub use traits::AnchorStrategy;
pub use types::{RankedTitle, TitleScore, TitleStats};
