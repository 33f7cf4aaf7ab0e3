use thiserror::Error;

use crate::models::{Feature, RunState};

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that fail an analysis run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Feature mismatch: {subject} is missing or has a non-finite {feature}")]
    FeatureMismatch { subject: String, feature: Feature },

    #[error("Duplicate candidate id: {0}")]
    DuplicateCandidate(String),

    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },

    #[error("Processing error: {0}")]
    Processing(String),
}
