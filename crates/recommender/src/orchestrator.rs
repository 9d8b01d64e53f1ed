//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Validate the request
//! 2. Find the neighbor users of the favorite titles
//! 3. Aggregate the neighbors' ratings per movie
//! 4. Score every movie with the weighted rating
//! 5. Rank titles by similarity to an anchor and return the top N
//!
//! Stages are CPU-bound and synchronous. The async entry points run them on
//! tokio's blocking pool under a deadline. When the deadline passes, a shared
//! cancel flag is raised and the blocking task stops at its next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use data_loader::{DataIndex, MovieId};
use pipeline::{
    Aggregator, AnchorStrategy, NeighborFinder, RandomAnchor, RecommendError, RecommenderConfig,
    Result, Scorer, ScoringConstants, SimilaritySelector,
};
use predictor::RatingPredictor;

/// One recommended movie with the statistics that placed it
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    /// Cosine similarity to the anchor
    pub similarity: f64,
    pub rating_count: u32,
    pub rating_mean: f64,
    pub weighted_rating: f64,
}

/// Full account of one recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationReport {
    /// Neighbor list length, repeats included
    pub neighbor_count: usize,
    pub distinct_neighbors: usize,
    /// Movies the neighborhood rated
    pub scored_titles: usize,
    /// `None` when the neighborhood rated nothing
    pub constants: Option<ScoringConstants>,
    pub anchor: Option<String>,
    pub recommendations: Vec<Recommendation>,
    pub elapsed: Duration,
}

impl RecommendationReport {
    pub fn titles(&self) -> Vec<String> {
        self.recommendations.iter().map(|r| r.title.clone()).collect()
    }
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    data_index: Arc<DataIndex>,
    neighbor_finder: NeighborFinder,
    aggregator: Aggregator,
    scorer: Scorer,
    selector: SimilaritySelector,
    anchor_strategy: Arc<dyn AnchorStrategy>,
    config: RecommenderConfig,
}

impl RecommendationOrchestrator {
    /// Create a new orchestrator with all stages configured from `config`
    ///
    /// # Arguments
    /// * `data_index` - Shared reference to the rating store
    /// * `predictor` - Rating model queried by the neighbor search
    /// * `config` - Stage tunables; rejected if invalid
    ///
    /// The anchor strategy defaults to [`RandomAnchor`].
    pub fn new(
        data_index: Arc<DataIndex>,
        predictor: Arc<dyn RatingPredictor>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;

        let neighbor_finder = NeighborFinder::new(data_index.clone(), predictor)
            .with_neighbors_per_title(config.neighbors_per_title)
            .with_max_failure_ratio(config.max_failure_ratio);
        let aggregator = Aggregator::new(data_index.clone());
        let scorer = Scorer::new().with_count_quantile(config.count_quantile);
        let selector = SimilaritySelector::new().with_exclude_anchor(config.exclude_anchor);

        Ok(Self {
            data_index,
            neighbor_finder,
            aggregator,
            scorer,
            selector,
            anchor_strategy: Arc::new(RandomAnchor),
            config,
        })
    }

    /// Replace the anchor strategy (default: [`RandomAnchor`])
    pub fn with_anchor_strategy(mut self, strategy: impl AnchorStrategy + 'static) -> Self {
        self.anchor_strategy = Arc::new(strategy);
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Recommend up to `top_n` titles for a list of favorites.
    ///
    /// Runs on a blocking thread and fails with [`RecommendError::Timeout`]
    /// when the configured deadline passes first. The abandoned work is
    /// cancelled and issues no further predictor calls.
    pub async fn recommend(&self, favorite_titles: Vec<String>, top_n: usize) -> Result<Vec<String>> {
        Ok(self.explain(favorite_titles, top_n).await?.titles())
    }

    /// Like [`recommend`](Self::recommend), with the full report
    pub async fn explain(
        &self,
        favorite_titles: Vec<String>,
        top_n: usize,
    ) -> Result<RecommendationReport> {
        validate_request(favorite_titles.as_slice(), top_n)?;

        let timeout = self.config.timeout();
        let orchestrator = self.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let task_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            orchestrator.run(favorite_titles.as_slice(), top_n, &task_cancel)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RecommendError::Internal(format!(
                "Recommendation task failed: {}",
                join_error
            ))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!("Recommendation request exceeded {:?}, cancelling", timeout);
                Err(RecommendError::Timeout(timeout))
            }
        }
    }

    /// Synchronous [`recommend`](Self::recommend) without a deadline
    pub fn recommend_blocking<S: AsRef<str>>(
        &self,
        favorite_titles: &[S],
        top_n: usize,
    ) -> Result<Vec<String>> {
        Ok(self.explain_blocking(favorite_titles, top_n)?.titles())
    }

    /// Synchronous [`explain`](Self::explain) without a deadline
    pub fn explain_blocking<S: AsRef<str>>(
        &self,
        favorite_titles: &[S],
        top_n: usize,
    ) -> Result<RecommendationReport> {
        validate_request(favorite_titles, top_n)?;
        self.run(favorite_titles, top_n, &AtomicBool::new(false))
    }

    /// Run every stage; the request is already validated.
    ///
    /// `cancel` is checked inside the neighbor search and between stages.
    #[instrument(skip(self, favorite_titles, cancel), fields(titles = favorite_titles.len()))]
    fn run<S: AsRef<str>>(
        &self,
        favorite_titles: &[S],
        top_n: usize,
        cancel: &AtomicBool,
    ) -> Result<RecommendationReport> {
        let start_time = Instant::now();

        let neighbors = self
            .neighbor_finder
            .find_neighbors_with_cancel(favorite_titles, cancel)?;
        let mut distinct = neighbors.clone();
        distinct.sort_unstable();
        distinct.dedup();
        info!(
            "Found {} neighbors ({} distinct)",
            neighbors.len(),
            distinct.len()
        );

        check_cancelled(cancel)?;
        let stats = self.aggregator.aggregate(&neighbors);
        let constants = self.scorer.constants(&stats);
        let scores = self.scorer.score(stats);
        info!("Scored {} titles", scores.len());

        check_cancelled(cancel)?;
        let selection = self
            .selector
            .rank(&scores, top_n, self.anchor_strategy.as_ref());
        let anchor = selection.anchor.map(|idx| scores[idx].title.clone());

        let recommendations: Vec<Recommendation> = selection
            .ranked
            .into_iter()
            .filter_map(|ranked| {
                let score = scores.iter().find(|s| s.movie_id == ranked.movie_id)?;
                let movie = self.data_index.get_movie(ranked.movie_id)?;
                Some(Recommendation {
                    movie_id: ranked.movie_id,
                    title: ranked.title,
                    year: movie.year,
                    genres: movie.genres.clone(),
                    similarity: ranked.similarity,
                    rating_count: score.rating_count,
                    rating_mean: score.rating_mean,
                    weighted_rating: score.weighted_rating,
                })
            })
            .collect();

        let elapsed = start_time.elapsed();
        debug!("Anchor: {:?}", anchor);
        info!(
            "Selected {} recommendations in {:.2?}",
            recommendations.len(),
            elapsed
        );

        Ok(RecommendationReport {
            neighbor_count: neighbors.len(),
            distinct_neighbors: distinct.len(),
            scored_titles: scores.len(),
            constants,
            anchor,
            recommendations,
            elapsed,
        })
    }
}

fn check_cancelled(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        debug!("Request cancelled between stages");
        return Err(RecommendError::Cancelled);
    }
    Ok(())
}

/// Fail fast on requests no stage can answer
fn validate_request<S: AsRef<str>>(favorite_titles: &[S], top_n: usize) -> Result<()> {
    if favorite_titles.is_empty() {
        return Err(RecommendError::EmptyFavorites);
    }
    if top_n == 0 {
        return Err(RecommendError::InvalidTopN(top_n));
    }
    Ok(())
}
