use std::collections::BTreeMap;

use crate::core::error::{AnalysisError, Result};
use crate::models::{Candidate, Feature, FeatureContribution, FeatureVector, ScoredCandidate};

/// Closeness above which a feature is called out as matching
const STRONG_MATCH_CLOSENESS: f64 = 0.8;
/// Normalized weight above which a feature is worth calling out
const NOTABLE_WEIGHT: f64 = 0.15;
/// Weighted shortfall above which the largest detractor is mentioned
const NOTABLE_SHORTFALL: f64 = 0.05;

/// Rescale raw weights so the non-zero ones sum to 1
///
/// Rejects negative or non-finite weights and configs where nothing is
/// weighted. Zero-weight features are dropped from the result.
pub fn normalize_weights(weights: &BTreeMap<Feature, f64>) -> Result<BTreeMap<Feature, f64>> {
    if let Some((feature, weight)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(AnalysisError::Config(format!(
            "weight for {} must be a non-negative number, got {}",
            feature, weight
        )));
    }

    let total: f64 = weights.values().filter(|w| **w > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(AnalysisError::Config(
            "at least one feature weight must be positive".to_string(),
        ));
    }

    Ok(weights
        .iter()
        .filter(|(_, w)| **w > 0.0)
        .map(|(f, w)| (*f, w / total))
        .collect())
}

/// Score one candidate against the reference, both already normalized
///
/// similarity = Σ w'ᵢ · (1 − |refᵢ − candᵢ|)
///
/// `weights` must come from [`normalize_weights`]. A feature absent from
/// either vector contributes nothing.
pub fn score_candidate(
    reference: &FeatureVector,
    normalized: &FeatureVector,
    candidate: &Candidate,
    weights: &BTreeMap<Feature, f64>,
) -> ScoredCandidate {
    let contributions: BTreeMap<Feature, FeatureContribution> = weights
        .iter()
        .filter_map(|(feature, weight)| {
            let ref_value = reference.get(feature)?;
            let cand_value = normalized.get(feature)?;
            let closeness = (1.0 - (ref_value - cand_value).abs()).clamp(0.0, 1.0);
            Some((
                *feature,
                FeatureContribution {
                    weight: *weight,
                    closeness,
                    contribution: weight * closeness,
                },
            ))
        })
        .collect();

    let similarity_score = contributions
        .values()
        .map(|c| c.contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0);

    // Ties resolve to the earliest feature in schema order
    let top_contributor = contributions
        .iter()
        .fold(None::<(Feature, f64)>, |best, (f, c)| match best {
            Some((_, v)) if v >= c.contribution => best,
            _ => Some((*f, c.contribution)),
        })
        .map(|(f, _)| f);

    let top_detractor = contributions
        .iter()
        .filter(|(_, c)| c.shortfall() > 0.0)
        .fold(None::<(Feature, f64)>, |worst, (f, c)| match worst {
            Some((_, v)) if v >= c.shortfall() => worst,
            _ => Some((*f, c.shortfall())),
        })
        .map(|(f, _)| f);

    let rationale = build_rationale(&contributions, top_detractor);

    ScoredCandidate {
        candidate_id: candidate.id.clone(),
        name: candidate.name.clone(),
        region: candidate.region.clone(),
        similarity_score,
        contributions,
        top_contributor,
        top_detractor,
        rationale,
        rent_price: candidate.raw(Feature::RentPrice),
        competitor_count: candidate.raw(Feature::CompetitorCount),
    }
}

/// Human-readable recommendation reason
pub fn build_rationale(
    contributions: &BTreeMap<Feature, FeatureContribution>,
    top_detractor: Option<Feature>,
) -> String {
    let strong: Vec<String> = contributions
        .iter()
        .filter(|(_, c)| c.closeness > STRONG_MATCH_CLOSENESS && c.weight > NOTABLE_WEIGHT)
        .map(|(f, _)| format!("{} closely matches the reference", f.label()))
        .collect();

    let mut rationale = if strong.is_empty() {
        "Overall profile resembles the reference".to_string()
    } else {
        strong.join(", ")
    };

    if let Some(feature) = top_detractor {
        if let Some(c) = contributions.get(&feature) {
            if c.shortfall() > NOTABLE_SHORTFALL {
                rationale.push_str(&format!("; {} differs most", feature.label().to_lowercase()));
            }
        }
    }

    rationale
}
