//! Recommender crate for the ReelRecs recommendation engine.
//!
//! This crate contains the orchestrator that runs the pipeline stages for a
//! list of favorite titles, synchronously or on tokio's blocking pool with a
//! deadline.

pub mod orchestrator;

pub use orchestrator::{Recommendation, RecommendationOrchestrator, RecommendationReport};
