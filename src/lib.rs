//! Site Scout - similarity analysis engine for franchise expansion
//!
//! Scores candidate locations against a proven reference site using a
//! weighted combination of demographic, commercial, cost and accessibility
//! features, and returns a ranked, explainable recommendation list.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{AnalysisError, SimilarityEngine};
pub use models::{Candidate, Feature, RecommendationResult, ReferenceProfile, RunState, WeightConfig};
pub use services::{AnalysisOrchestrator, InMemoryCatalog};
