//! Rating prediction for the neighbor search.
//!
//! This crate provides:
//! - the [`RatingPredictor`] trait the pipeline queries in its hot loop
//! - [`LatentFactorModel`], a pretrained baseline/SVD-style model loaded from a
//!   JSON export
//!
//! The model is trained elsewhere; this crate only reads its parameters and
//! evaluates `global_mean + b_u + b_i + p_u · q_i`, clipped to the rating
//! scale.

use data_loader::{MovieId, UserId, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading a model or evaluating a prediction
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Latent factor length mismatch for user {user_id} ({user_dim}) and movie {movie_id} ({item_dim})")]
    DimensionMismatch {
        user_id: UserId,
        movie_id: MovieId,
        user_dim: usize,
        item_dim: usize,
    },

    #[error("Non-finite estimate for user {user_id} and movie {movie_id}")]
    NonFinite { user_id: UserId, movie_id: MovieId },

    #[error("Prediction unavailable: {0}")]
    Unavailable(String),
}

/// Something that can estimate how a user would rate a movie.
///
/// `Send + Sync` because the neighbor search queries it from many rayon
/// workers at once. Implementations must be cheap per call: the search makes
/// one call per (favorite movie, known user) pair.
pub trait RatingPredictor: Send + Sync {
    /// Returns the name of this predictor (for logging)
    fn name(&self) -> &str;

    /// Estimate the rating `user_id` would give `movie_id`.
    fn predict(&self, movie_id: MovieId, user_id: UserId) -> Result<f32, PredictionError>;
}

fn default_rating_scale() -> (f32, f32) {
    (MIN_RATING, MAX_RATING)
}

/// Pretrained latent-factor rating model.
///
/// ## File format
/// ```json
/// {
///   "global_mean": 3.5,
///   "rating_scale": [0.5, 5.0],
///   "user_bias": { "1": 0.12 },
///   "item_bias": { "31": -0.3 },
///   "user_factors": { "1": [0.1, -0.2] },
///   "item_factors": { "31": [0.05, 0.4] }
/// }
/// ```
/// Every field except `global_mean` is optional. A model without factors is a
/// pure baseline (biases only). Users or movies missing from a table
/// contribute nothing for that term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentFactorModel {
    global_mean: f32,
    #[serde(default = "default_rating_scale")]
    rating_scale: (f32, f32),
    #[serde(default)]
    user_bias: HashMap<UserId, f32>,
    #[serde(default)]
    item_bias: HashMap<MovieId, f32>,
    #[serde(default)]
    user_factors: HashMap<UserId, Vec<f32>>,
    #[serde(default)]
    item_factors: HashMap<MovieId, Vec<f32>>,
}

impl LatentFactorModel {
    /// Create a baseline model that predicts `global_mean` for everyone
    pub fn new(global_mean: f32) -> Self {
        Self {
            global_mean,
            rating_scale: default_rating_scale(),
            user_bias: HashMap::new(),
            item_bias: HashMap::new(),
            user_factors: HashMap::new(),
            item_factors: HashMap::new(),
        }
    }

    /// Configure the clipping range (default: 0.5 to 5.0)
    pub fn with_rating_scale(mut self, low: f32, high: f32) -> Self {
        self.rating_scale = (low, high);
        self
    }

    pub fn with_user_bias(mut self, user_id: UserId, bias: f32) -> Self {
        self.user_bias.insert(user_id, bias);
        self
    }

    pub fn with_item_bias(mut self, movie_id: MovieId, bias: f32) -> Self {
        self.item_bias.insert(movie_id, bias);
        self
    }

    pub fn with_user_factors(mut self, user_id: UserId, factors: Vec<f32>) -> Self {
        self.user_factors.insert(user_id, factors);
        self
    }

    pub fn with_item_factors(mut self, movie_id: MovieId, factors: Vec<f32>) -> Self {
        self.item_factors.insert(movie_id, factors);
        self
    }

    /// Parse and validate a model from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self, PredictionError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model exported to a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, PredictionError> {
        info!("Loading rating model from {:?}", path);
        let data = fs::read_to_string(path)?;
        let model = Self::from_json_str(&data)?;

        let (users, items, factors) = model.dimensions();
        info!(
            "Rating model loaded: {} users, {} movies, {} latent factors",
            users, items, factors
        );
        Ok(model)
    }

    /// (users with parameters, movies with parameters, latent factor count)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        let users = self.user_bias.len().max(self.user_factors.len());
        let items = self.item_bias.len().max(self.item_factors.len());
        let factors = self
            .user_factors
            .values()
            .chain(self.item_factors.values())
            .map(Vec::len)
            .next()
            .unwrap_or(0);
        (users, items, factors)
    }

    /// Check the invariants a loaded model must satisfy:
    /// finite parameters, an ordered scale and one factor length throughout.
    pub fn validate(&self) -> Result<(), PredictionError> {
        let (low, high) = self.rating_scale;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(PredictionError::InvalidModel(format!(
                "rating scale [{}, {}] is not an increasing range",
                low, high
            )));
        }
        if !self.global_mean.is_finite() {
            return Err(PredictionError::InvalidModel(
                "global mean is not finite".to_string(),
            ));
        }
        if self
            .user_bias
            .values()
            .chain(self.item_bias.values())
            .any(|b| !b.is_finite())
        {
            return Err(PredictionError::InvalidModel(
                "bias table contains a non-finite value".to_string(),
            ));
        }

        let mut lengths = self
            .user_factors
            .values()
            .chain(self.item_factors.values())
            .map(Vec::len);
        if let Some(first) = lengths.next() {
            if let Some(other) = lengths.find(|&len| len != first) {
                return Err(PredictionError::InvalidModel(format!(
                    "latent factors have inconsistent lengths ({} and {})",
                    first, other
                )));
            }
        }
        Ok(())
    }
}

impl RatingPredictor for LatentFactorModel {
    fn name(&self) -> &str {
        "LatentFactorModel"
    }

    fn predict(&self, movie_id: MovieId, user_id: UserId) -> Result<f32, PredictionError> {
        let mut estimate = self.global_mean
            + self.user_bias.get(&user_id).copied().unwrap_or(0.0)
            + self.item_bias.get(&movie_id).copied().unwrap_or(0.0);

        if let (Some(p), Some(q)) = (
            self.user_factors.get(&user_id),
            self.item_factors.get(&movie_id),
        ) {
            if p.len() != q.len() {
                return Err(PredictionError::DimensionMismatch {
                    user_id,
                    movie_id,
                    user_dim: p.len(),
                    item_dim: q.len(),
                });
            }
            estimate += p.iter().zip(q).map(|(a, b)| a * b).sum::<f32>();
        }

        if !estimate.is_finite() {
            debug!("Non-finite estimate for user {} movie {}", user_id, movie_id);
            return Err(PredictionError::NonFinite { user_id, movie_id });
        }

        let (low, high) = self.rating_scale;
        Ok(estimate.clamp(low, high))
    }
}
