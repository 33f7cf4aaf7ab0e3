// Core algorithm exports
pub mod engine;
pub mod error;
pub mod filters;
pub mod normalizer;
pub mod ranker;
pub mod scoring;

pub use engine::{validate_config, SimilarityEngine};
pub use error::{AnalysisError, Result};
pub use filters::{check_features, filter_candidates, passes_thresholds};
pub use normalizer::{normalize, NormalizedSet};
pub use ranker::rank;
pub use scoring::{normalize_weights, score_candidate};
