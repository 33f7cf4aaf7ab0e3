use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{Feature, MismatchPolicy, Thresholds, WeightConfig};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub runs: RunSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Defaults applied to every analysis request
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_config_id")]
    pub config_id: String,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub min_population: Option<f64>,
    #[serde(default)]
    pub max_rent_price: Option<f64>,
    #[serde(default)]
    pub max_competitor_count: Option<f64>,
    #[serde(default = "default_max_results")]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            config_id: default_config_id(),
            weights: WeightsConfig::default(),
            min_population: None,
            max_rent_price: None,
            max_competitor_count: None,
            max_results: default_max_results(),
            min_similarity: None,
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

fn default_config_id() -> String { "default".to_string() }
fn default_max_results() -> Option<usize> { Some(10) }

impl AnalysisSettings {
    /// Weight config that requests are layered on top of
    pub fn template(&self) -> WeightConfig {
        WeightConfig {
            id: self.config_id.clone(),
            weights: self.weights.to_map(),
            thresholds: Thresholds {
                min_population: self.min_population,
                max_rent_price: self.max_rent_price,
                max_competitor_count: self.max_competitor_count,
            },
            max_results: self.max_results,
            min_similarity: self.min_similarity,
            mismatch_policy: self.mismatch_policy,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_population_weight")]
    pub population: f64,
    #[serde(default = "default_business_density_weight")]
    pub business_density: f64,
    #[serde(default = "default_rent_price_weight")]
    pub rent_price: f64,
    #[serde(default = "default_competition_weight")]
    pub competition: f64,
    #[serde(default = "default_transportation_weight")]
    pub transportation: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            population: default_population_weight(),
            business_density: default_business_density_weight(),
            rent_price: default_rent_price_weight(),
            competition: default_competition_weight(),
            transportation: default_transportation_weight(),
        }
    }
}

impl WeightsConfig {
    pub fn to_map(&self) -> BTreeMap<Feature, f64> {
        BTreeMap::from([
            (Feature::PopulationTotal, self.population),
            (Feature::BusinessDensity, self.business_density),
            (Feature::RentPrice, self.rent_price),
            (Feature::CompetitorCount, self.competition),
            (Feature::TransportationScore, self.transportation),
        ])
    }
}

fn default_population_weight() -> f64 { 0.25 }
fn default_business_density_weight() -> f64 { 0.25 }
fn default_rent_price_weight() -> f64 { 0.20 }
fn default_competition_weight() -> f64 { 0.15 }
fn default_transportation_weight() -> f64 { 0.15 }

/// Retention of finished runs
#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_run_capacity")]
    pub capacity: u64,
    #[serde(default = "default_run_ttl")]
    pub ttl_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            capacity: default_run_capacity(),
            ttl_secs: default_run_ttl(),
        }
    }
}

fn default_run_capacity() -> u64 { 10_000 }
fn default_run_ttl() -> u64 { 3_600 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSettings {
    /// JSON seed with reference areas and location records
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// `LOG_LEVEL` / `LOG_FORMAT` take precedence over the file values
    pub fn with_overrides(self, level: Option<String>, format: Option<String>) -> Self {
        Self {
            level: level.unwrap_or(self.level),
            format: format.unwrap_or(self.format),
        }
    }

    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    // e.g., SITE_SCOUT__SERVER__PORT -> server.port
    Environment::with_prefix("SITE_SCOUT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SITE_SCOUT__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}
