//! Tunables for the recommendation pipeline.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "neighbors_per_title": 50, "exclude_anchor": true }
//! ```

use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Users taken per favorite title, ranked by predicted rating
    pub neighbors_per_title: usize,
    /// Quantile of neighborhood rating counts used as the shrinkage prior `m`
    pub count_quantile: f64,
    /// Recommendations returned when the caller does not say
    pub default_top_n: usize,
    /// Drop the anchor title from its own recommendation list
    pub exclude_anchor: bool,
    /// Failed share of predictor calls above which a request fails
    pub max_failure_ratio: f64,
    /// Upper bound on one request, in seconds
    pub timeout_secs: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            neighbors_per_title: 20,
            count_quantile: 0.95,
            default_top_n: 10,
            exclude_anchor: false,
            max_failure_ratio: 0.5,
            timeout_secs: 30,
        }
    }
}

impl RecommenderConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| RecommendError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| RecommendError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        if self.neighbors_per_title == 0 {
            return Err(RecommendError::Config(
                "neighbors_per_title must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.count_quantile) {
            return Err(RecommendError::Config(format!(
                "count_quantile must lie in [0, 1], got {}",
                self.count_quantile
            )));
        }
        if self.default_top_n == 0 {
            return Err(RecommendError::Config(
                "default_top_n must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_failure_ratio) {
            return Err(RecommendError::Config(format!(
                "max_failure_ratio must lie in [0, 1], got {}",
                self.max_failure_ratio
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
