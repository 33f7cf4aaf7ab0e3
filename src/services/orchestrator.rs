use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{validate_config, AnalysisError, SimilarityEngine};
use crate::models::{
    AnalysisRun, Candidate, RecommendationResult, RunRequest, RunState, RunStatus, WeightConfig,
};
use crate::services::catalog::{CandidateSource, ReferenceLookup};

/// Errors returned when looking up a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    #[error("Run not found: {0}")]
    RunNotFound(Uuid),

    #[error("Run has not completed (state: {0})")]
    NotCompleted(RunState),

    #[error("Run failed: {0}")]
    RunFailed(String),
}

/// Apply a lifecycle transition, stamping the matching timestamp
fn transition(run: &mut AnalysisRun, next: RunState) -> Result<(), AnalysisError> {
    if !run.state.can_transition_to(next) {
        return Err(AnalysisError::InvalidTransition {
            from: run.state,
            to: next,
        });
    }

    let now = chrono::Utc::now();
    match next {
        RunState::Running => run.started_at = Some(now),
        RunState::Completed | RunState::Failed => run.finished_at = Some(now),
        RunState::Pending => {}
    }
    run.state = next;
    Ok(())
}

/// Drives analysis runs and keeps their outcome for later lookup
///
/// Each submitted run executes its pipeline exactly once, synchronously,
/// inside `submit`. Finished runs stay in a bounded registry until evicted
/// by capacity or TTL.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    engine: SimilarityEngine,
    references: Arc<dyn ReferenceLookup>,
    candidates: Arc<dyn CandidateSource>,
    runs: Cache<Uuid, Arc<AnalysisRun>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        references: Arc<dyn ReferenceLookup>,
        candidates: Arc<dyn CandidateSource>,
        capacity: u64,
        ttl_secs: u64,
    ) -> Self {
        let runs = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            engine: SimilarityEngine::new(),
            references,
            candidates,
            runs,
        }
    }

    fn store(&self, run: &AnalysisRun) {
        self.runs.insert(run.id, Arc::new(run.clone()));
    }

    fn execute(
        &self,
        reference_id: &str,
        candidates: Option<Vec<Candidate>>,
        config: &WeightConfig,
    ) -> Result<RecommendationResult, AnalysisError> {
        let reference = self
            .references
            .get_reference(reference_id)
            .ok_or_else(|| AnalysisError::ReferenceNotFound(reference_id.to_string()))?;

        let candidates = candidates.unwrap_or_else(|| self.candidates.candidates());
        tracing::debug!("Analyzing {} candidates against reference {}", candidates.len(), reference_id);

        self.engine.analyze(&reference, candidates, config)
    }

    /// Create a run and execute it; returns the run id whatever the outcome
    pub fn submit(&self, request: RunRequest) -> Uuid {
        let RunRequest {
            reference_id,
            candidates,
            config,
        } = request;

        let mut run = AnalysisRun::new(reference_id.clone(), config.id.clone());
        let run_id = run.id;

        tracing::info!("Run {} submitted for reference {} (config {})", run_id, reference_id, config.id);

        // Invalid configs fail straight from PENDING, before any candidate is touched
        let outcome = validate_config(&config).and_then(|_| {
            self.store(&run);
            transition(&mut run, RunState::Running)?;
            self.store(&run);
            self.execute(&reference_id, candidates, &config)
        });

        let finished = outcome.and_then(|result| {
            transition(&mut run, RunState::Completed)?;
            run.result = Some(result);
            Ok(())
        });

        match finished {
            Ok(()) => {
                let count = run.result.as_ref().map_or(0, |r| r.entries.len());
                tracing::info!("Run {} completed with {} recommendations", run_id, count);
            }
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                run.error = Some(e.to_string());
                if let Err(te) = transition(&mut run, RunState::Failed) {
                    tracing::error!("Run {} could not be marked failed: {}", run_id, te);
                }
            }
        }

        self.store(&run);
        run_id
    }

    /// Lifecycle state of a run, if it is still retained
    pub fn get_status(&self, run_id: &Uuid) -> Option<RunStatus> {
        self.runs.get(run_id).map(|run| RunStatus::from(run.as_ref()))
    }

    /// Result of a completed run
    pub fn get_result(&self, run_id: &Uuid) -> Result<RecommendationResult, OrchestratorError> {
        let run = self
            .runs
            .get(run_id)
            .ok_or(OrchestratorError::RunNotFound(*run_id))?;

        match run.state {
            RunState::Completed => run
                .result
                .clone()
                .ok_or_else(|| OrchestratorError::RunFailed("completed run has no result".to_string())),
            RunState::Failed => Err(OrchestratorError::RunFailed(
                run.error.clone().unwrap_or_default(),
            )),
            state => Err(OrchestratorError::NotCompleted(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, ReferenceProfile};
    use crate::services::catalog::{CatalogSeed, InMemoryCatalog};
    use std::collections::BTreeMap;

    fn create_orchestrator() -> AnalysisOrchestrator {
        let catalog = InMemoryCatalog::new(CatalogSeed {
            references: vec![ReferenceProfile {
                id: "ref".to_string(),
                name: None,
                features: [(Feature::PopulationTotal, 25_000.0)].into_iter().collect(),
            }],
            locations: vec![Candidate {
                id: "loc".to_string(),
                name: None,
                region: None,
                features: [(Feature::PopulationTotal, 20_000.0)].into_iter().collect(),
            }],
        })
        .unwrap();
        let catalog = Arc::new(catalog);
        AnalysisOrchestrator::new(catalog.clone(), catalog, 100, 60)
    }

    fn create_request(reference_id: &str, weight: f64) -> RunRequest {
        RunRequest {
            reference_id: reference_id.to_string(),
            candidates: None,
            config: WeightConfig::new(BTreeMap::from([(Feature::PopulationTotal, weight)])),
        }
    }

    #[test]
    fn test_transition_rules() {
        let mut run = AnalysisRun::new("ref".to_string(), "cfg".to_string());
        assert!(transition(&mut run, RunState::Completed).is_err());
        assert!(transition(&mut run, RunState::Running).is_ok());
        assert!(run.started_at.is_some());
        assert!(transition(&mut run, RunState::Running).is_err());
        assert!(transition(&mut run, RunState::Completed).is_ok());
        assert!(run.finished_at.is_some());
        assert!(transition(&mut run, RunState::Failed).is_err());
    }

    #[test]
    fn test_submit_completes() {
        let orchestrator = create_orchestrator();
        let run_id = orchestrator.submit(create_request("ref", 1.0));

        let status = orchestrator.get_status(&run_id).unwrap();
        assert_eq!(status.state, RunState::Completed);
        assert!(status.started_at.is_some());

        let result = orchestrator.get_result(&run_id).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].scored.candidate_id, "loc");
    }

    #[test]
    fn test_config_error_fails_without_running() {
        let orchestrator = create_orchestrator();
        let run_id = orchestrator.submit(create_request("ref", 0.0));

        let status = orchestrator.get_status(&run_id).unwrap();
        assert_eq!(status.state, RunState::Failed);
        assert!(status.started_at.is_none());
        assert!(status.error.unwrap().contains("Invalid configuration"));
    }

    #[test]
    fn test_unknown_reference_fails() {
        let orchestrator = create_orchestrator();
        let run_id = orchestrator.submit(create_request("nowhere", 1.0));

        match orchestrator.get_result(&run_id) {
            Err(OrchestratorError::RunFailed(detail)) => assert!(detail.contains("nowhere")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_run() {
        let orchestrator = create_orchestrator();
        let id = Uuid::new_v4();
        assert!(orchestrator.get_status(&id).is_none());
        assert_eq!(orchestrator.get_result(&id), Err(OrchestratorError::RunNotFound(id)));
    }
}
