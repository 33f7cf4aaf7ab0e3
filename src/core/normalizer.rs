use std::collections::BTreeMap;

use crate::models::{Candidate, Feature, FeatureVector};

/// Value assigned to every vector on a feature with no spread
pub const ZERO_VARIANCE_VALUE: f64 = 0.5;

/// Observed raw range of one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    fn observe(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Map a raw value onto [0, 1], inverting lower-is-better features
    #[inline]
    pub fn scale(&self, feature: Feature, value: f64) -> f64 {
        // Halved operands keep the span finite for any pair of finite bounds
        let low = self.min / 2.0;
        let span = self.max / 2.0 - low;
        if span <= 0.0 {
            return ZERO_VARIANCE_VALUE;
        }

        let scaled = ((value / 2.0 - low) / span).clamp(0.0, 1.0);
        if feature.lower_is_better() {
            1.0 - scaled
        } else {
            scaled
        }
    }
}

/// Normalized reference plus candidates, in input order
#[derive(Debug, Clone)]
pub struct NormalizedSet {
    pub reference: FeatureVector,
    pub candidates: Vec<FeatureVector>,
    pub ranges: BTreeMap<Feature, FeatureRange>,
}

/// Compute per-feature ranges over {reference} ∪ candidates.
///
/// Only `features` are considered; vectors missing a feature are expected
/// to have been rejected or skipped by validation already, and are simply
/// ignored here.
pub fn feature_ranges(
    features: &[Feature],
    reference: &FeatureVector,
    candidates: &[Candidate],
) -> BTreeMap<Feature, FeatureRange> {
    let mut ranges = BTreeMap::new();

    let vectors = std::iter::once(reference).chain(candidates.iter().map(|c| &c.features));
    for vector in vectors {
        for feature in features {
            if let Some(&value) = vector.get(feature) {
                ranges
                    .entry(*feature)
                    .and_modify(|r: &mut FeatureRange| r.observe(value))
                    .or_insert(FeatureRange { min: value, max: value });
            }
        }
    }

    ranges
}

fn scale_vector(vector: &FeatureVector, ranges: &BTreeMap<Feature, FeatureRange>) -> FeatureVector {
    ranges
        .iter()
        .filter_map(|(feature, range)| {
            vector
                .get(feature)
                .map(|&value| (*feature, range.scale(*feature, value)))
        })
        .collect()
}

/// Min-max normalize the reference and every candidate on `features`.
///
/// Two passes: the first collects ranges, the second rescales. Features not
/// listed are dropped from the output vectors.
pub fn normalize(
    features: &[Feature],
    reference: &FeatureVector,
    candidates: &[Candidate],
) -> NormalizedSet {
    let ranges = feature_ranges(features, reference, candidates);

    let normalized_reference = scale_vector(reference, &ranges);
    let normalized_candidates = candidates
        .iter()
        .map(|c| scale_vector(&c.features, &ranges))
        .collect();

    tracing::trace!("Normalized {} features over {} candidates", ranges.len(), candidates.len());

    NormalizedSet {
        reference: normalized_reference,
        candidates: normalized_candidates,
        ranges,
    }
}
