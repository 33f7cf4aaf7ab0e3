use serde::{Deserialize, Serialize};

use crate::models::domain::{AnalysisRun, RecommendationResult, RunState};

/// Response for the submit endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRunResponse {
    pub run_id: uuid::Uuid,
    pub state: RunState,
}

/// Response for the result endpoint: the terminal state plus its output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResultResponse {
    pub run_id: uuid::Uuid,
    pub state: RunState,
    pub result: RecommendationResult,
}

/// Lifecycle snapshot of a run, without its result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub run_id: uuid::Uuid,
    pub reference_id: String,
    pub config_id: String,
    pub state: RunState,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&AnalysisRun> for RunStatus {
    fn from(run: &AnalysisRun) -> Self {
        Self {
            run_id: run.id,
            reference_id: run.reference_id.clone(),
            config_id: run.config_id.clone(),
            state: run.state,
            error: run.error.clone(),
            created_at: run.created_at,
            started_at: run.started_at,
            finished_at: run.finished_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
