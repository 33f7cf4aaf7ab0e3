use std::cmp::Ordering;

use crate::models::{RankedCandidate, ScoredCandidate};

/// Missing tie-break values sort after present ones
#[inline]
fn cmp_ascending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total order used for ranking
///
/// Score descending, then cheaper rent, then fewer competitors, then
/// candidate id ascending.
pub fn compare_scored(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.similarity_score
        .total_cmp(&a.similarity_score)
        .then_with(|| cmp_ascending(a.rent_price, b.rent_price))
        .then_with(|| cmp_ascending(a.competitor_count, b.competitor_count))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Sort the full set, then truncate, then assign 1-based ranks
pub fn rank(mut scored: Vec<ScoredCandidate>, max_results: Option<usize>) -> Vec<RankedCandidate> {
    scored.sort_by(compare_scored);

    if let Some(limit) = max_results {
        scored.truncate(limit);
    }

    scored
        .into_iter()
        .enumerate()
        .map(|(i, scored)| RankedCandidate {
            priority_rank: i + 1,
            scored,
        })
        .collect()
}
