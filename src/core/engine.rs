use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use crate::core::{
    error::{AnalysisError, Result},
    filters::{check_features, filter_candidates},
    normalizer::normalize,
    ranker::rank,
    scoring::{normalize_weights, score_candidate},
};
use crate::models::{
    AnalysisSummary, Candidate, Feature, Impact, Insight, InsightKind, MismatchPolicy,
    RankedCandidate, RecommendationResult, ReferenceProfile, ScoredCandidate, TopFactor,
    WeightConfig,
};

pub const ANALYSIS_METHOD: &str = "weighted_similarity";

const TOP_FACTOR_COUNT: usize = 3;

/// Validate a config and return its normalized weights
pub fn validate_config(config: &WeightConfig) -> Result<BTreeMap<Feature, f64>> {
    let weights = normalize_weights(&config.weights)?;

    let thresholds = [
        ("min_population", config.thresholds.min_population),
        ("max_rent_price", config.thresholds.max_rent_price),
        ("max_competitor_count", config.thresholds.max_competitor_count),
    ];
    for (name, value) in thresholds {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(AnalysisError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }
    }

    if config.max_results == Some(0) {
        return Err(AnalysisError::Config("max_results must be at least 1".to_string()));
    }

    if let Some(min) = config.min_similarity {
        if !(0.0..=1.0).contains(&min) {
            return Err(AnalysisError::Config(format!(
                "min_similarity must be within [0, 1], got {}",
                min
            )));
        }
    }

    Ok(weights)
}

/// Single-run similarity pipeline
///
/// # Pipeline Stages
/// 1. Config and feature validation
/// 2. Hard threshold filtering on raw values
/// 3. Min-max normalization over the reference and eligible candidates
/// 4. Weighted similarity scoring
/// 5. Deterministic ranking and truncation
///
/// Holds no state between runs; one engine can serve any number of
/// concurrent analyses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine;

impl SimilarityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce the ranked recommendation list for one reference
    pub fn analyze(
        &self,
        reference: &ReferenceProfile,
        candidates: Vec<Candidate>,
        config: &WeightConfig,
    ) -> Result<RecommendationResult> {
        let started = Instant::now();
        let total_candidates = candidates.len();

        let weights = validate_config(config)?;
        let required = config.required_features();

        check_features(&format!("reference {}", reference.id), &reference.features, &required)?;

        let mut seen = HashSet::with_capacity(candidates.len());
        for candidate in &candidates {
            if !seen.insert(candidate.id.as_str()) {
                return Err(AnalysisError::DuplicateCandidate(candidate.id.clone()));
            }
        }

        // Stage 1: feature validation, per mismatch policy
        let mut skipped_candidates = Vec::new();
        let mut valid = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match check_features(&format!("candidate {}", candidate.id), &candidate.features, &required) {
                Ok(()) => valid.push(candidate),
                Err(e) => match config.mismatch_policy {
                    MismatchPolicy::Fail => return Err(e),
                    MismatchPolicy::Skip => {
                        tracing::warn!("Skipping candidate: {}", e);
                        skipped_candidates.push(candidate.id);
                    }
                },
            }
        }

        // Stage 2: hard thresholds
        let eligible = filter_candidates(valid, &config.thresholds);
        let eligible_candidates = eligible.len();

        // Stage 3: normalization over weighted features only
        let features: Vec<Feature> = weights.keys().copied().collect();
        let normalized = normalize(&features, &reference.features, &eligible);

        // Stage 4: scoring
        let scored: Vec<ScoredCandidate> = eligible
            .iter()
            .zip(normalized.candidates.iter())
            .map(|(candidate, vector)| score_candidate(&normalized.reference, vector, candidate, &weights))
            .filter(|s| config.min_similarity.map_or(true, |min| s.similarity_score >= min))
            .collect();

        // Stage 5: ranking
        let entries = rank(scored, config.max_results);

        let summary = AnalysisSummary {
            method: ANALYSIS_METHOD.to_string(),
            top_factors: top_factors(&weights),
            insights: insights(&entries),
            weights_used: weights,
            total_candidates,
            eligible_candidates,
            skipped_candidates,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::debug!(
            "Analysis for reference {} ranked {} of {} candidates",
            reference.id,
            entries.len(),
            total_candidates
        );

        Ok(RecommendationResult {
            reference_id: reference.id.clone(),
            config_id: config.id.clone(),
            entries,
            summary,
        })
    }
}

/// The most heavily weighted features, heaviest first
pub fn top_factors(weights: &BTreeMap<Feature, f64>) -> Vec<TopFactor> {
    let mut sorted: Vec<(Feature, f64)> = weights.iter().map(|(f, w)| (*f, *w)).collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    sorted
        .into_iter()
        .take(TOP_FACTOR_COUNT)
        .map(|(feature, weight)| TopFactor {
            feature,
            weight,
            impact: Impact::from_weight(weight),
        })
        .collect()
}

/// Short observations about the result set as a whole
pub fn insights(entries: &[RankedCandidate]) -> Vec<Insight> {
    if entries.is_empty() {
        return vec![Insight {
            kind: InsightKind::Info,
            message: "No candidate met the configured constraints".to_string(),
        }];
    }

    let mut insights = Vec::new();
    let avg = entries.iter().map(|e| e.scored.similarity_score).sum::<f64>() / entries.len() as f64;

    if avg > 0.8 {
        insights.push(Insight {
            kind: InsightKind::Positive,
            message: "Many highly similar locations were found".to_string(),
        });
    } else if avg < 0.6 {
        insights.push(Insight {
            kind: InsightKind::Warning,
            message: "Recommended locations show low similarity; consider revisiting the conditions"
                .to_string(),
        });
    }

    let mut by_region: BTreeMap<&str, usize> = BTreeMap::new();
    for region in entries.iter().filter_map(|e| e.scored.region.as_deref()) {
        *by_region.entry(region).or_default() += 1;
    }
    // First region in name order wins a tie
    if let Some((region, count)) = by_region
        .iter()
        .fold(None::<(&str, usize)>, |best, (r, c)| match best {
            Some((_, n)) if n >= *c => best,
            _ => Some((r, *c)),
        })
    {
        insights.push(Insight {
            kind: InsightKind::Info,
            message: format!("Recommendations concentrate in {} ({} of {})", region, count, entries.len()),
        });
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candidate(id: &str, population: f64, rent: f64, competitors: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: Some(format!("Location {}", id)),
            region: Some("Seoul".to_string()),
            features: [
                (Feature::PopulationTotal, population),
                (Feature::RentPrice, rent),
                (Feature::CompetitorCount, competitors),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn create_reference() -> ReferenceProfile {
        ReferenceProfile {
            id: "ref".to_string(),
            name: None,
            features: [
                (Feature::PopulationTotal, 25_000.0),
                (Feature::RentPrice, 2_000_000.0),
                (Feature::CompetitorCount, 3.0),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn create_config() -> WeightConfig {
        WeightConfig::new(BTreeMap::from([
            (Feature::PopulationTotal, 0.5),
            (Feature::RentPrice, 0.3),
            (Feature::CompetitorCount, 0.2),
        ]))
    }

    #[test]
    fn test_analyze_basic() {
        let engine = SimilarityEngine::new();
        let candidates = vec![
            create_candidate("a", 24_000.0, 1_900_000.0, 3.0),
            create_candidate("b", 5_000.0, 500_000.0, 0.0),
        ];

        let result = engine.analyze(&create_reference(), candidates, &create_config()).unwrap();

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].scored.candidate_id, "a");
        assert_eq!(result.reference_id, "ref");
        assert_eq!(result.config_id, "custom");
        assert_eq!(result.summary.method, ANALYSIS_METHOD);
        assert_eq!(result.summary.total_candidates, 2);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = create_config();
        config.thresholds.max_rent_price = Some(-1.0);
        assert!(matches!(validate_config(&config), Err(AnalysisError::Config(_))));

        let mut config = create_config();
        config.min_similarity = Some(1.5);
        assert!(matches!(validate_config(&config), Err(AnalysisError::Config(_))));

        let mut config = create_config();
        config.max_results = Some(0);
        assert!(matches!(validate_config(&config), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_duplicate_candidate_rejected() {
        let engine = SimilarityEngine::new();
        let candidates = vec![
            create_candidate("a", 24_000.0, 1_900_000.0, 3.0),
            create_candidate("a", 20_000.0, 1_000_000.0, 1.0),
        ];

        let err = engine.analyze(&create_reference(), candidates, &create_config()).unwrap_err();
        assert_eq!(err, AnalysisError::DuplicateCandidate("a".to_string()));
    }

    #[test]
    fn test_reference_mismatch_always_fails() {
        let engine = SimilarityEngine::new();
        let mut reference = create_reference();
        reference.features.remove(&Feature::RentPrice);
        let mut config = create_config();
        config.mismatch_policy = MismatchPolicy::Skip;

        let err = engine
            .analyze(&reference, vec![create_candidate("a", 1.0, 1.0, 1.0)], &config)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::FeatureMismatch { feature: Feature::RentPrice, .. }));
    }

    #[test]
    fn test_min_similarity_drops_low_scores() {
        let engine = SimilarityEngine::new();
        let candidates = vec![
            create_candidate("close", 25_000.0, 2_000_000.0, 3.0),
            create_candidate("far", 1_000.0, 100_000.0, 15.0),
        ];
        let mut config = create_config();
        config.min_similarity = Some(0.9);

        let result = engine.analyze(&create_reference(), candidates, &config).unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].scored.candidate_id, "close");
        assert_eq!(result.summary.eligible_candidates, 2);
    }

    #[test]
    fn test_top_factors() {
        let weights = BTreeMap::from([
            (Feature::PopulationTotal, 0.25),
            (Feature::BusinessDensity, 0.25),
            (Feature::RentPrice, 0.20),
            (Feature::CompetitorCount, 0.15),
            (Feature::TransportationScore, 0.15),
        ]);

        let factors = top_factors(&weights);

        assert_eq!(factors.len(), 3);
        assert_eq!(factors[0].feature, Feature::PopulationTotal);
        assert_eq!(factors[1].feature, Feature::BusinessDensity);
        assert_eq!(factors[2].feature, Feature::RentPrice);
        assert_eq!(factors[0].impact, Impact::Medium);
        assert_eq!(factors[2].impact, Impact::Medium);
    }

    fn ranked(id: &str, score: f64, region: Option<&str>) -> RankedCandidate {
        RankedCandidate {
            priority_rank: 0,
            scored: ScoredCandidate {
                candidate_id: id.to_string(),
                name: None,
                region: region.map(str::to_string),
                similarity_score: score,
                contributions: BTreeMap::new(),
                top_contributor: None,
                top_detractor: None,
                rationale: String::new(),
                rent_price: None,
                competitor_count: None,
            },
        }
    }

    #[test]
    fn test_high_average_is_positive() {
        let entries = vec![ranked("a", 0.95, None), ranked("b", 0.85, None)];
        let found = insights(&entries);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InsightKind::Positive);
    }

    #[test]
    fn test_low_average_is_warning() {
        let entries = vec![ranked("a", 0.55, None), ranked("b", 0.45, None)];
        let found = insights(&entries);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InsightKind::Warning);
    }

    #[test]
    fn test_middling_average_has_no_score_insight() {
        let entries = vec![ranked("a", 0.7, None)];
        assert!(insights(&entries).is_empty());
    }

    #[test]
    fn test_region_concentration() {
        let entries = vec![
            ranked("a", 0.7, Some("Seoul")),
            ranked("b", 0.7, Some("Busan")),
            ranked("c", 0.7, Some("Seoul")),
            ranked("d", 0.7, None),
        ];
        let found = insights(&entries);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InsightKind::Info);
        assert_eq!(found[0].message, "Recommendations concentrate in Seoul (2 of 4)");
    }

    #[test]
    fn test_region_tie_picks_first_by_name() {
        let entries = vec![
            ranked("a", 0.9, Some("Seoul")),
            ranked("b", 0.9, Some("Busan")),
        ];
        let found = insights(&entries);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, InsightKind::Positive);
        assert_eq!(found[1].message, "Recommendations concentrate in Busan (1 of 2)");
    }

    #[test]
    fn test_extreme_values_score_in_unit_range() {
        let engine = SimilarityEngine::new();
        let reference = ReferenceProfile {
            id: "ref".to_string(),
            name: None,
            features: [(Feature::BusinessDensity, 1.7e308)].into_iter().collect(),
        };
        let candidates = vec![Candidate {
            id: "far".to_string(),
            name: None,
            region: None,
            features: [(Feature::BusinessDensity, -1.7e308)].into_iter().collect(),
        }];
        let config = WeightConfig::new(BTreeMap::from([(Feature::BusinessDensity, 1.0)]));

        let result = engine.analyze(&reference, candidates, &config).unwrap();
        let score = result.entries[0].scored.similarity_score;

        assert!(!score.is_nan());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_result_insight() {
        let found = insights(&[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, InsightKind::Info);
    }
}
