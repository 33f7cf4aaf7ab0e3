use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::models::domain::{Candidate, Feature, MismatchPolicy, WeightConfig};

/// Request to run a similarity analysis
///
/// The five named weights are the options exposed by the condition screens;
/// `extraWeights` can weight any other feature of the schema. When no weight
/// is supplied at all the configured defaults apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "reference_id")]
    pub reference_id: String,
    #[serde(default)]
    pub config_id: Option<String>,
    /// Inline candidate set; when absent every catalog location is evaluated
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_population: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_business_density: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_rent_price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_competition: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_transportation: Option<f64>,
    #[serde(default)]
    pub extra_weights: BTreeMap<Feature, f64>,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub min_population: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub max_rent_price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub max_competitor_count: Option<f64>,

    #[validate(range(min = 1))]
    #[serde(default)]
    pub max_results: Option<usize>,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub mismatch_policy: Option<MismatchPolicy>,
}

impl AnalysisRequest {
    fn named_weights(&self) -> [(Feature, Option<f64>); 5] {
        [
            (Feature::PopulationTotal, self.weight_population),
            (Feature::BusinessDensity, self.weight_business_density),
            (Feature::RentPrice, self.weight_rent_price),
            (Feature::CompetitorCount, self.weight_competition),
            (Feature::TransportationScore, self.weight_transportation),
        ]
    }

    /// Build the run's weight config on top of the configured defaults
    pub fn to_weight_config(&self, defaults: &WeightConfig) -> WeightConfig {
        let named = self.named_weights();
        let any_weight = named.iter().any(|(_, w)| w.is_some()) || !self.extra_weights.is_empty();

        let weights = if any_weight {
            let mut weights: BTreeMap<Feature, f64> = named
                .iter()
                .map(|(feature, weight)| (*feature, weight.unwrap_or(0.0)))
                .collect();
            weights.extend(self.extra_weights.iter().map(|(f, w)| (*f, *w)));
            weights
        } else {
            defaults.weights.clone()
        };

        let mut config = defaults.clone();
        config.weights = weights;
        if let Some(id) = &self.config_id {
            config.id = id.clone();
        }
        if self.min_population.is_some() {
            config.thresholds.min_population = self.min_population;
        }
        if self.max_rent_price.is_some() {
            config.thresholds.max_rent_price = self.max_rent_price;
        }
        if self.max_competitor_count.is_some() {
            config.thresholds.max_competitor_count = self.max_competitor_count;
        }
        if self.max_results.is_some() {
            config.max_results = self.max_results;
        }
        if self.min_similarity.is_some() {
            config.min_similarity = self.min_similarity;
        }
        if let Some(policy) = self.mismatch_policy {
            config.mismatch_policy = policy;
        }
        config
    }

    pub fn into_run_request(self, defaults: &WeightConfig) -> RunRequest {
        let config = self.to_weight_config(defaults);
        RunRequest {
            reference_id: self.reference_id,
            candidates: self.candidates,
            config,
        }
    }
}

/// Orchestrator input: which reference, which candidates, which config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub reference_id: String,
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    pub config: WeightConfig,
}
