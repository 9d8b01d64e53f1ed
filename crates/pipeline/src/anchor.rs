//! Anchor selection strategies.
//!
//! - [`RandomAnchor`]: uniform over all titles, different on every call
//! - [`SeededAnchor`]: uniform but reproducible for a given seed
//! - [`FixedAnchor`]: a caller-chosen title

use crate::traits::AnchorStrategy;
use crate::types::TitleScore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Picks the anchor uniformly at random from the thread-local generator.
///
/// Repeated calls with the same inputs give varied recommendations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAnchor;

impl AnchorStrategy for RandomAnchor {
    fn name(&self) -> &str {
        "RandomAnchor"
    }

    fn choose(&self, scores: &[TitleScore]) -> Option<usize> {
        if scores.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..scores.len()))
    }
}

/// Picks the anchor uniformly from a generator seeded per call.
///
/// The same seed and the same table always give the same anchor.
#[derive(Debug, Clone, Copy)]
pub struct SeededAnchor {
    seed: u64,
}

impl SeededAnchor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl AnchorStrategy for SeededAnchor {
    fn name(&self) -> &str {
        "SeededAnchor"
    }

    fn choose(&self, scores: &[TitleScore]) -> Option<usize> {
        if scores.is_empty() {
            return None;
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        Some(rng.random_range(0..scores.len()))
    }
}

/// Uses a specific title as the anchor.
///
/// If the title has no neighborhood ratings it is not in the table and no
/// anchor is chosen.
#[derive(Debug, Clone)]
pub struct FixedAnchor {
    title: String,
}

impl FixedAnchor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl AnchorStrategy for FixedAnchor {
    fn name(&self) -> &str {
        "FixedAnchor"
    }

    fn choose(&self, scores: &[TitleScore]) -> Option<usize> {
        let found = scores.iter().position(|s| s.title == self.title);
        if found.is_none() {
            debug!("Anchor title {:?} not among {} scored titles", self.title, scores.len());
        }
        found
    }
}
