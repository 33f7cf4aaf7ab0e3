// Unit tests for Site Scout pipeline stages

use site_scout::core::{
    filters::passes_thresholds,
    normalizer::{normalize, ZERO_VARIANCE_VALUE},
    ranker::rank,
    scoring::{normalize_weights, score_candidate},
};
use site_scout::models::{Candidate, Feature, FeatureVector, Thresholds};
use std::collections::BTreeMap;

fn create_location(id: &str, population: f64, rent: f64, competitors: f64) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: None,
        region: None,
        features: [
            (Feature::PopulationTotal, population),
            (Feature::RentPrice, rent),
            (Feature::CompetitorCount, competitors),
        ]
        .into_iter()
        .collect(),
    }
}

#[test]
fn test_normalized_weights_sum_to_one() {
    let configs = [
        vec![(Feature::PopulationTotal, 1.0)],
        vec![(Feature::PopulationTotal, 0.25), (Feature::RentPrice, 0.25)],
        vec![
            (Feature::PopulationTotal, 17.0),
            (Feature::BusinessDensity, 3.5),
            (Feature::TransportationScore, 0.001),
            (Feature::VacancyRate, 0.0),
        ],
        vec![(Feature::ParkingScore, 1e-9), (Feature::FloatingPopulation, 1e9)],
    ];

    for weights in configs {
        let weights: BTreeMap<Feature, f64> = weights.into_iter().collect();
        let normalized = normalize_weights(&weights).unwrap();
        let sum: f64 = normalized.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights {:?} summed to {}", weights, sum);
    }
}

#[test]
fn test_zero_variance_never_nan() {
    let reference: FeatureVector = [(Feature::CompetitorCount, 2.0)].into_iter().collect();
    let candidates = vec![create_location("only", 10.0, 10.0, 2.0)];

    let set = normalize(&[Feature::CompetitorCount], &reference, &candidates);

    assert_eq!(set.reference[&Feature::CompetitorCount], ZERO_VARIANCE_VALUE);
    assert_eq!(set.candidates[0][&Feature::CompetitorCount], ZERO_VARIANCE_VALUE);
}

#[test]
fn test_population_threshold_boundary() {
    let thresholds = Thresholds {
        min_population: Some(10_000.0),
        ..Default::default()
    };

    assert!(passes_thresholds(&create_location("at", 10_000.0, 0.0, 0.0), &thresholds));
    assert!(!passes_thresholds(&create_location("below", 9_999.0, 0.0, 0.0), &thresholds));
}

#[test]
fn test_score_and_rank_pipeline() {
    let reference: FeatureVector = [
        (Feature::PopulationTotal, 25_000.0),
        (Feature::RentPrice, 2_000_000.0),
        (Feature::CompetitorCount, 3.0),
    ]
    .into_iter()
    .collect();
    let candidates = vec![
        create_location("near", 24_000.0, 2_100_000.0, 3.0),
        create_location("far", 2_000.0, 100_000.0, 12.0),
        create_location("mid", 15_000.0, 1_200_000.0, 6.0),
    ];
    let weights = normalize_weights(&BTreeMap::from([
        (Feature::PopulationTotal, 0.5),
        (Feature::RentPrice, 0.3),
        (Feature::CompetitorCount, 0.2),
    ]))
    .unwrap();

    let features: Vec<Feature> = weights.keys().copied().collect();
    let set = normalize(&features, &reference, &candidates);
    let scored = candidates
        .iter()
        .zip(set.candidates.iter())
        .map(|(c, v)| score_candidate(&set.reference, v, c, &weights))
        .collect();

    let ranked = rank(scored, None);
    let order: Vec<&str> = ranked.iter().map(|r| r.scored.candidate_id.as_str()).collect();

    assert_eq!(order, vec!["near", "mid", "far"]);
    for entry in &ranked {
        assert!((0.0..=1.0).contains(&entry.scored.similarity_score));
        let total: f64 = entry.scored.contributions.values().map(|c| c.contribution).sum();
        assert!((total - entry.scored.similarity_score).abs() < 1e-12);
    }
}
