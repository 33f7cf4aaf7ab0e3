use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::models::{Candidate, ReferenceProfile};

/// Errors that can occur while loading catalog records
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },
}

/// Resolves reference profiles by id
pub trait ReferenceLookup: Send + Sync {
    fn get_reference(&self, id: &str) -> Option<ReferenceProfile>;
}

/// Supplies the candidate locations to evaluate
pub trait CandidateSource: Send + Sync {
    fn candidates(&self) -> Vec<Candidate>;
}

/// On-disk layout of a catalog seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub references: Vec<ReferenceProfile>,
    #[serde(default)]
    pub locations: Vec<Candidate>,
}

/// Read-only catalog of reference areas and location records
///
/// Records are loaded once and cloned out per run; the storage layer that
/// maintains them lives outside this service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    references: HashMap<String, ReferenceProfile>,
    locations: Vec<Candidate>,
}

impl InMemoryCatalog {
    pub fn new(seed: CatalogSeed) -> Result<Self, CatalogError> {
        let mut references = HashMap::with_capacity(seed.references.len());
        for reference in seed.references {
            if references.contains_key(&reference.id) {
                return Err(CatalogError::Duplicate {
                    kind: "reference",
                    id: reference.id,
                });
            }
            references.insert(reference.id.clone(), reference);
        }

        let mut location_ids = std::collections::HashSet::with_capacity(seed.locations.len());
        for location in &seed.locations {
            if !location_ids.insert(location.id.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "location",
                    id: location.id.clone(),
                });
            }
        }

        Ok(Self {
            references,
            locations: seed.locations,
        })
    }

    /// Load a catalog from a JSON seed file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path.as_ref())?;
        let seed: CatalogSeed = serde_json::from_slice(&bytes)?;
        let catalog = Self::new(seed)?;

        tracing::info!(
            "Loaded catalog from {} ({} references, {} locations)",
            path.as_ref().display(),
            catalog.reference_count(),
            catalog.location_count()
        );
        Ok(catalog)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

impl ReferenceLookup for InMemoryCatalog {
    fn get_reference(&self, id: &str) -> Option<ReferenceProfile> {
        self.references.get(id).cloned()
    }
}

impl CandidateSource for InMemoryCatalog {
    fn candidates(&self) -> Vec<Candidate> {
        self.locations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use std::io::Write;

    const SEED: &str = r#"{
        "references": [
            {"id": "gangnam", "name": "Gangnam flagship",
             "features": {"population_total": 25000, "rent_price": 2000000, "competitor_count": 3}}
        ],
        "locations": [
            {"id": "loc-1", "region": "Seoul",
             "features": {"population_total": 18000, "rent_price": 1500000, "competitor_count": 2}},
            {"id": "loc-2",
             "features": {"population_total": 5000, "rent_price": 500000, "competitor_count": 0}}
        ]
    }"#;

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let catalog = InMemoryCatalog::from_json_file(file.path()).unwrap();

        assert_eq!(catalog.reference_count(), 1);
        assert_eq!(catalog.location_count(), 2);

        let reference = catalog.get_reference("gangnam").unwrap();
        assert_eq!(reference.features[&Feature::PopulationTotal], 25_000.0);
        assert!(catalog.get_reference("missing").is_none());
        assert_eq!(catalog.candidates()[0].region.as_deref(), Some("Seoul"));
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let seed = CatalogSeed {
            references: vec![],
            locations: vec![
                Candidate {
                    id: "dup".to_string(),
                    name: None,
                    region: None,
                    features: Default::default(),
                },
                Candidate {
                    id: "dup".to_string(),
                    name: None,
                    region: None,
                    features: Default::default(),
                },
            ],
        };

        assert!(matches!(
            InMemoryCatalog::new(seed),
            Err(CatalogError::Duplicate { kind: "location", .. })
        ));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let json = r#"{"locations": [{"id": "x", "features": {"monthly_sales": 1}}]}"#;
        assert!(serde_json::from_str::<CatalogSeed>(json).is_err());
    }
}
