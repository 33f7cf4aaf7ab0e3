// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AnalysisRun, AnalysisSummary, Candidate, Feature, FeatureContribution, FeatureVector, Impact,
    Insight, InsightKind, MismatchPolicy, RankedCandidate, RecommendationResult, ReferenceProfile,
    RunState, ScoredCandidate, Thresholds, TopFactor, WeightConfig,
};
pub use requests::{AnalysisRequest, RunRequest};
pub use responses::{ErrorResponse, HealthResponse, RunResultResponse, RunStatus, SubmitRunResponse};
