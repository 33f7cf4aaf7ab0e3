use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AnalysisRequest, ErrorResponse, HealthResponse, RunResultResponse, RunState, SubmitRunResponse,
    WeightConfig,
};
use crate::services::{AnalysisOrchestrator, OrchestratorError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: AnalysisOrchestrator,
    /// Defaults every request is layered on
    pub defaults: WeightConfig,
}

/// Configure all analysis-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/analysis/runs", web::post().to(submit_run))
        .route("/analysis/runs/{run_id}", web::get().to(get_run_status))
        .route("/analysis/runs/{run_id}/result", web::get().to(get_run_result));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn parse_run_id(raw: &str) -> Result<uuid::Uuid, HttpResponse> {
    uuid::Uuid::parse_str(raw).map_err(|e| {
        error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Invalid run id",
            e.to_string(),
        )
    })
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Submit analysis endpoint
///
/// POST /api/v1/analysis/runs
///
/// Request body:
/// ```json
/// {
///   "referenceId": "string",
///   "weightPopulation": 0.25,
///   "minPopulation": 10000,
///   "maxResults": 10
/// }
/// ```
///
/// The run executes on the blocking pool before the response is sent; the
/// returned state is always terminal.
async fn submit_run(
    state: web::Data<AppState>,
    req: web::Json<AnalysisRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for analysis request: field_errors={:?}", errors);
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let run_request = req.into_inner().into_run_request(&state.defaults);
    let orchestrator = state.orchestrator.clone();
    // CPU-bound; keep it off the worker's event loop
    let run_id = match web::block(move || orchestrator.submit(run_request)).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Analysis run could not be scheduled: {}", e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Run not scheduled",
                e.to_string(),
            );
        }
    };

    match state.orchestrator.get_status(&run_id) {
        Some(status) => HttpResponse::Created().json(SubmitRunResponse {
            run_id,
            state: status.state,
        }),
        None => error_response(
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Run not retained",
            format!("Run {} was evicted before it could be reported", run_id),
        ),
    }
}

/// Run status endpoint
///
/// GET /api/v1/analysis/runs/{runId}
async fn get_run_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let run_id = match parse_run_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.get_status(&run_id) {
        Some(status) => HttpResponse::Ok().json(status),
        None => error_response(
            actix_web::http::StatusCode::NOT_FOUND,
            "Run not found",
            run_id.to_string(),
        ),
    }
}

/// Run result endpoint
///
/// GET /api/v1/analysis/runs/{runId}/result
async fn get_run_result(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let run_id = match parse_run_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.get_result(&run_id) {
        Ok(result) => HttpResponse::Ok().json(RunResultResponse {
            run_id,
            state: RunState::Completed,
            result,
        }),
        Err(e @ OrchestratorError::RunNotFound(_)) => {
            error_response(actix_web::http::StatusCode::NOT_FOUND, "Run not found", e.to_string())
        }
        Err(e @ OrchestratorError::NotCompleted(_)) => {
            error_response(actix_web::http::StatusCode::CONFLICT, "Run not completed", e.to_string())
        }
        Err(e @ OrchestratorError::RunFailed(_)) => error_response(
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "Run failed",
            e.to_string(),
        ),
    }
}
