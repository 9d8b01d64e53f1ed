//! Core traits for the recommendation pipeline.

use crate::types::TitleScore;

/// Chooses the anchor title the final similarity ranking is built around.
///
/// ## Design Note
/// - `Send + Sync` so one strategy can be shared by concurrent requests
/// - Strategies only pick a row index; they never reorder the table
pub trait AnchorStrategy: Send + Sync {
    /// Returns the name of this strategy (for logging/debugging)
    fn name(&self) -> &str;

    /// Pick the anchor row of `scores`.
    ///
    /// # Returns
    /// * `Some(index)` - an index into `scores`
    /// * `None` - no anchor can be chosen (empty table, requested title absent)
    fn choose(&self, scores: &[TitleScore]) -> Option<usize>;
}
