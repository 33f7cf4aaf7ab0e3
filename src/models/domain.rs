use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed feature schema shared by reference profiles and candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PopulationTotal,
    FloatingPopulation,
    BusinessDensity,
    RentPrice,
    VacancyRate,
    CompetitorCount,
    SimilarBusinessCount,
    CommercialAreaRatio,
    TransportationScore,
    ParkingScore,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::PopulationTotal,
        Feature::FloatingPopulation,
        Feature::BusinessDensity,
        Feature::RentPrice,
        Feature::VacancyRate,
        Feature::CompetitorCount,
        Feature::SimilarBusinessCount,
        Feature::CommercialAreaRatio,
        Feature::TransportationScore,
        Feature::ParkingScore,
    ];

    /// Features where a smaller raw value is the favorable one.
    /// The normalizer inverts these so that higher always means better.
    #[inline]
    pub fn lower_is_better(self) -> bool {
        matches!(
            self,
            Feature::RentPrice
                | Feature::VacancyRate
                | Feature::CompetitorCount
                | Feature::SimilarBusinessCount
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::PopulationTotal => "population_total",
            Feature::FloatingPopulation => "floating_population",
            Feature::BusinessDensity => "business_density",
            Feature::RentPrice => "rent_price",
            Feature::VacancyRate => "vacancy_rate",
            Feature::CompetitorCount => "competitor_count",
            Feature::SimilarBusinessCount => "similar_business_count",
            Feature::CommercialAreaRatio => "commercial_area_ratio",
            Feature::TransportationScore => "transportation_score",
            Feature::ParkingScore => "parking_score",
        }
    }

    /// Human-readable label used in rationale text
    pub fn label(self) -> &'static str {
        match self {
            Feature::PopulationTotal => "Population",
            Feature::FloatingPopulation => "Floating population",
            Feature::BusinessDensity => "Business density",
            Feature::RentPrice => "Rent",
            Feature::VacancyRate => "Vacancy rate",
            Feature::CompetitorCount => "Competition",
            Feature::SimilarBusinessCount => "Similar businesses",
            Feature::CommercialAreaRatio => "Commercial area ratio",
            Feature::TransportationScore => "Transportation access",
            Feature::ParkingScore => "Parking",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw (or normalized) feature values keyed by feature.
///
/// Ordered map so that every pass over the features, and therefore every
/// floating-point sum, happens in the same order for identical inputs.
pub type FeatureVector = BTreeMap<Feature, f64>;

/// A known-successful site used as the similarity target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub features: FeatureVector,
}

/// A location under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub features: FeatureVector,
}

impl Candidate {
    /// Raw value of a feature, if the record carries it
    #[inline]
    pub fn raw(&self, feature: Feature) -> Option<f64> {
        self.features.get(&feature).copied()
    }
}

/// Hard eligibility thresholds, expressed in raw units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub min_population: Option<f64>,
    #[serde(default)]
    pub max_rent_price: Option<f64>,
    #[serde(default)]
    pub max_competitor_count: Option<f64>,
}

impl Thresholds {
    /// Features an active threshold needs to read
    pub fn referenced_features(&self) -> impl Iterator<Item = Feature> {
        [
            (self.min_population.is_some(), Feature::PopulationTotal),
            (self.max_rent_price.is_some(), Feature::RentPrice),
            (self.max_competitor_count.is_some(), Feature::CompetitorCount),
        ]
        .into_iter()
        .filter_map(|(active, feature)| active.then_some(feature))
    }
}

/// What to do with a candidate that lacks a required feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Fail the whole run
    #[default]
    Fail,
    /// Drop the candidate and record its id in the summary
    Skip,
}

/// Weights, thresholds and output options for one run.
///
/// Immutable once handed to the engine. Weights are raw; the scorer
/// normalizes them to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(default = "default_config_id")]
    pub id: String,
    pub weights: BTreeMap<Feature, f64>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

fn default_config_id() -> String {
    "custom".to_string()
}

impl WeightConfig {
    pub fn new(weights: BTreeMap<Feature, f64>) -> Self {
        Self {
            id: default_config_id(),
            weights,
            thresholds: Thresholds::default(),
            max_results: None,
            min_similarity: None,
            mismatch_policy: MismatchPolicy::default(),
        }
    }

    /// Features carrying a non-zero weight
    pub fn active_features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(f, _)| *f)
    }

    /// Every feature a vector must carry to take part in this run
    pub fn required_features(&self) -> Vec<Feature> {
        let mut required: Vec<Feature> = self
            .active_features()
            .chain(self.thresholds.referenced_features())
            .collect();
        required.sort();
        required.dedup();
        required
    }
}

/// Per-feature breakdown of a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureContribution {
    /// Normalized weight (sums to 1 across the run)
    pub weight: f64,
    /// 1 - |ref - cand| on the normalized scale
    pub closeness: f64,
    /// weight * closeness
    pub contribution: f64,
}

impl FeatureContribution {
    /// Weighted closeness the candidate lost on this feature
    #[inline]
    pub fn shortfall(&self) -> f64 {
        self.weight - self.contribution
    }
}

/// A candidate with its similarity score and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub candidate_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub similarity_score: f64,
    pub contributions: BTreeMap<Feature, FeatureContribution>,
    pub top_contributor: Option<Feature>,
    pub top_detractor: Option<Feature>,
    pub rationale: String,
    /// Raw rent used as the first tie-break
    pub rent_price: Option<f64>,
    /// Raw competitor count used as the second tie-break
    pub competitor_count: Option<f64>,
}

/// A scored candidate with its final position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub priority_rank: usize,
    #[serde(flatten)]
    pub scored: ScoredCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn from_weight(weight: f64) -> Self {
        if weight > 0.25 {
            Impact::High
        } else if weight > 0.15 {
            Impact::Medium
        } else {
            Impact::Low
        }
    }
}

/// One of the most heavily weighted features of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: Feature,
    pub weight: f64,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

/// How a result was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub method: String,
    pub weights_used: BTreeMap<Feature, f64>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
    pub skipped_candidates: Vec<String>,
    pub duration_ms: u64,
    pub top_factors: Vec<TopFactor>,
    pub insights: Vec<Insight>,
}

/// The engine's output: ranked recommendations for one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub reference_id: String,
    pub config_id: String,
    pub entries: Vec<RankedCandidate>,
    pub summary: AnalysisSummary,
}

/// Lifecycle of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// PENDING -> RUNNING -> {COMPLETED, FAILED}; PENDING may fail directly
    /// when validation rejects the inputs.
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Pending, RunState::Running)
                | (RunState::Pending, RunState::Failed)
                | (RunState::Running, RunState::Completed)
                | (RunState::Running, RunState::Failed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Pending => "PENDING",
            RunState::Running => "RUNNING",
            RunState::Completed => "COMPLETED",
            RunState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Unit of work binding one reference, one candidate set and one config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    pub id: uuid::Uuid,
    pub reference_id: String,
    pub config_id: String,
    pub state: RunState,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip)]
    pub result: Option<RecommendationResult>,
}

impl AnalysisRun {
    pub fn new(reference_id: String, config_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            reference_id,
            config_id,
            state: RunState::Pending,
            error: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
        }
    }
}
