// Service exports
pub mod catalog;
pub mod orchestrator;

pub use catalog::{CandidateSource, CatalogError, CatalogSeed, InMemoryCatalog, ReferenceLookup};
pub use orchestrator::{AnalysisOrchestrator, OrchestratorError};
