use crate::core::error::{AnalysisError, Result};
use crate::models::{Candidate, Feature, FeatureVector, Thresholds};

/// Check a vector carries every required feature with a finite value
pub fn check_features(subject: &str, vector: &FeatureVector, required: &[Feature]) -> Result<()> {
    for feature in required {
        match vector.get(feature) {
            Some(value) if value.is_finite() => {}
            _ => {
                return Err(AnalysisError::FeatureMismatch {
                    subject: subject.to_string(),
                    feature: *feature,
                })
            }
        }
    }
    Ok(())
}

/// Check a candidate against the hard thresholds, on raw values
///
/// Every bound is inclusive. An absent threshold never excludes; a present
/// threshold excludes a candidate that lacks the feature.
#[inline]
pub fn passes_thresholds(candidate: &Candidate, thresholds: &Thresholds) -> bool {
    if let Some(min_population) = thresholds.min_population {
        if !candidate
            .raw(Feature::PopulationTotal)
            .is_some_and(|p| p >= min_population)
        {
            return false;
        }
    }

    if let Some(max_rent) = thresholds.max_rent_price {
        if !candidate.raw(Feature::RentPrice).is_some_and(|r| r <= max_rent) {
            return false;
        }
    }

    if let Some(max_competitors) = thresholds.max_competitor_count {
        if !candidate
            .raw(Feature::CompetitorCount)
            .is_some_and(|c| c <= max_competitors)
        {
            return false;
        }
    }

    true
}

/// Silently drop every candidate that fails a threshold
pub fn filter_candidates(candidates: Vec<Candidate>, thresholds: &Thresholds) -> Vec<Candidate> {
    let before = candidates.len();
    let eligible: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| passes_thresholds(c, thresholds))
        .collect();

    tracing::debug!("Threshold filter kept {} of {} candidates", eligible.len(), before);
    eligible
}
