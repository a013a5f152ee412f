//! Configuration for forest construction, search and logging.
//!
//! Supports:
//! - Default values (embedded in binary)
//! - Configuration files (TOML format)
//! - Environment variable overrides (prefix: `BOSQUE__`)
//!
//! # Environment Variables
//!
//! - `BOSQUE__FOREST__N_TREES=50`
//! - `BOSQUE__FOREST__LEAF_SIZE=16`
//! - `BOSQUE__FOREST__METRIC=euclidean`
//! - `BOSQUE__FOREST__SEED=42`
//! - `BOSQUE__SEARCH__K=10`
//! - `BOSQUE__SEARCH__MAX_CANDIDATES=500`
//! - `BOSQUE__SEARCH__MAX_NODES=2000`
//! - `BOSQUE__LOGGING__LEVEL=debug`
//!
//! # Example
//!
//! ```
//! use bosque::config::BosqueConfig;
//! use bosque::distance::Metric;
//!
//! let config = BosqueConfig::from_toml_str(r#"
//!     [forest]
//!     n_trees = 25
//!     metric = "euclidean"
//! "#).expect("valid toml");
//!
//! assert_eq!(config.forest.n_trees, 25);
//! assert_eq!(config.forest.metric, Metric::Euclidean);
//! assert_eq!(config.forest.leaf_size, 8);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::distance::Metric;
use crate::error::{BosqueError, Result};
use crate::index::SearchBudget;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BosqueConfig {
    /// Forest construction parameters
    pub forest: ForestConfig,
    /// Default query parameters
    pub search: SearchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl BosqueConfig {
    /// Loads configuration from an optional file path with environment variable overrides.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`BOSQUE__*`)
    /// 2. Configuration file (if provided and present)
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_path) = path {
            if file_path.exists() {
                let contents = std::fs::read_to_string(file_path)?;
                config = Self::from_toml_str(&contents)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses configuration from a TOML string. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::Config`] on malformed TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serializes configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BosqueError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("BOSQUE__FOREST__N_TREES") {
            self.forest.n_trees = v;
        }
        if let Some(v) = env_parse("BOSQUE__FOREST__LEAF_SIZE") {
            self.forest.leaf_size = v;
        }
        if let Some(v) = env_parse("BOSQUE__FOREST__METRIC") {
            self.forest.metric = v;
        }
        if let Some(v) = env_parse("BOSQUE__FOREST__SEED") {
            self.forest.seed = Some(v);
        }
        if let Some(v) = env_parse("BOSQUE__SEARCH__K") {
            self.search.k = v;
        }
        if let Some(v) = env_parse("BOSQUE__SEARCH__MAX_CANDIDATES") {
            self.search.max_candidates = Some(v);
        }
        if let Some(v) = env_parse("BOSQUE__SEARCH__MAX_NODES") {
            self.search.max_nodes = Some(v);
        }
        if let Ok(val) = std::env::var("BOSQUE__LOGGING__LEVEL") {
            self.logging.level = val;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.parse().ok())
}

/// Forest construction parameters.
///
/// # Examples
///
/// ```
/// use bosque::config::ForestConfig;
/// use bosque::distance::Metric;
///
/// let config = ForestConfig::new()
///     .with_n_trees(20)
///     .with_leaf_size(4)
///     .with_metric(Metric::Euclidean)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees (more trees = better recall, slower build)
    pub n_trees: usize,
    /// Maximum ids per leaf before a node is split
    pub leaf_size: usize,
    /// Distance metric used for splitting and ranking
    pub metric: Metric,
    /// Random seed; `None` draws one at build time
    pub seed: Option<u64>,
    /// Random point pairs sampled per split (farthest pair wins)
    pub split_samples: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 10,
            leaf_size: 8,
            metric: Metric::Angular,
            seed: None,
            split_samples: 3,
        }
    }
}

impl ForestConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Sets the leaf size threshold.
    #[must_use]
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets how many random pairs each split samples.
    #[must_use]
    pub fn with_split_samples(mut self, split_samples: usize) -> Self {
        self.split_samples = split_samples;
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::InvalidTreeCount`] if `n_trees < 1` and
    /// [`BosqueError::InvalidHyperparameter`] if `leaf_size` or
    /// `split_samples` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.n_trees < 1 {
            return Err(BosqueError::InvalidTreeCount {
                n_trees: self.n_trees,
            });
        }
        if self.leaf_size < 1 {
            return Err(BosqueError::invalid_hyperparameter(
                "leaf_size",
                self.leaf_size,
                ">= 1",
            ));
        }
        if self.split_samples < 1 {
            return Err(BosqueError::invalid_hyperparameter(
                "split_samples",
                self.split_samples,
                ">= 1",
            ));
        }
        Ok(())
    }
}

/// Default query parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of neighbors to return
    pub k: usize,
    /// Candidate budget; `None` means `k * n_trees`
    pub max_candidates: Option<usize>,
    /// Cap on node expansions per query
    pub max_nodes: Option<usize>,
    /// Wall-clock cap per query in milliseconds
    pub deadline_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 1,
            max_candidates: None,
            max_nodes: None,
            deadline_ms: None,
        }
    }
}

impl SearchConfig {
    /// Builds the per-query budget described by this configuration.
    #[must_use]
    pub fn budget(&self) -> SearchBudget {
        let mut budget = SearchBudget::new();
        if let Some(max_candidates) = self.max_candidates {
            budget = budget.with_max_candidates(max_candidates);
        }
        if let Some(max_nodes) = self.max_nodes {
            budget = budget.with_max_nodes(max_nodes);
        }
        if let Some(ms) = self.deadline_ms {
            budget = budget.with_deadline(Duration::from_millis(ms));
        }
        budget
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `BOSQUE_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BosqueConfig::default();
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.leaf_size, 8);
        assert_eq!(config.forest.metric, Metric::Angular);
        assert_eq!(config.forest.seed, None);
        assert_eq!(config.search.k, 1);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BosqueConfig::from_toml_str(
            r#"
            [search]
            k = 5
            max_candidates = 100
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.search.k, 5);
        assert_eq!(config.search.max_candidates, Some(100));
        assert_eq!(config.forest, ForestConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = BosqueConfig::from_toml_str("[forest\nn_trees = ").unwrap_err();
        assert!(matches!(err, BosqueError::Config(_)));
    }

    #[test]
    fn test_unknown_metric_is_config_error() {
        let err = BosqueConfig::from_toml_str("[forest]\nmetric = \"hamming\"").unwrap_err();
        assert!(matches!(err, BosqueError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = BosqueConfig::default();
        config.forest = config.forest.with_seed(99).with_n_trees(3);
        config.search.deadline_ms = Some(250);
        let text = config.to_toml_string().expect("serializable");
        let parsed = BosqueConfig::from_toml_str(&text).expect("parsable");
        assert_eq!(parsed, config);
    }

    #[test]
    #[serial_test::serial]
    fn test_load_missing_file_uses_defaults() {
        let config =
            BosqueConfig::load(Some(Path::new("/nonexistent/bosque.toml"))).expect("defaults");
        assert_eq!(config.forest.split_samples, 3);
    }

    #[test]
    #[serial_test::serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bosque.toml");
        std::fs::write(&path, "[forest]\nleaf_size = 2\n").expect("write config");
        let config = BosqueConfig::load(Some(&path)).expect("loads");
        assert_eq!(config.forest.leaf_size, 2);
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bosque.toml");
        std::fs::write(&path, "[forest]\nn_trees = 4\nleaf_size = 2\n").expect("write config");

        std::env::set_var("BOSQUE__FOREST__N_TREES", "25");
        std::env::set_var("BOSQUE__FOREST__METRIC", "euclidean");
        std::env::set_var("BOSQUE__SEARCH__MAX_CANDIDATES", "300");
        std::env::set_var("BOSQUE__LOGGING__LEVEL", "debug");
        let config = BosqueConfig::load(Some(&path));
        std::env::remove_var("BOSQUE__FOREST__N_TREES");
        std::env::remove_var("BOSQUE__FOREST__METRIC");
        std::env::remove_var("BOSQUE__SEARCH__MAX_CANDIDATES");
        std::env::remove_var("BOSQUE__LOGGING__LEVEL");

        let config = config.expect("loads");
        assert_eq!(config.forest.n_trees, 25);
        assert_eq!(config.forest.metric, Metric::Euclidean);
        assert_eq!(config.forest.leaf_size, 2);
        assert_eq!(config.search.max_candidates, Some(300));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    #[serial_test::serial]
    fn test_unparsable_env_value_is_ignored() {
        std::env::set_var("BOSQUE__FOREST__LEAF_SIZE", "many");
        let config = BosqueConfig::load(None);
        std::env::remove_var("BOSQUE__FOREST__LEAF_SIZE");

        assert_eq!(config.expect("defaults").forest.leaf_size, 8);
    }

    #[test]
    fn test_validate_rejects_zero_trees() {
        let err = ForestConfig::new().with_n_trees(0).validate().unwrap_err();
        assert!(matches!(err, BosqueError::InvalidTreeCount { n_trees: 0 }));
    }

    #[test]
    fn test_validate_rejects_zero_leaf_size() {
        let err = ForestConfig::new().with_leaf_size(0).validate().unwrap_err();
        assert!(matches!(err, BosqueError::InvalidHyperparameter { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_split_samples() {
        let err = ForestConfig::new()
            .with_split_samples(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, BosqueError::InvalidHyperparameter { .. }));
    }

    #[test]
    fn test_search_config_budget() {
        let search = SearchConfig {
            k: 3,
            max_candidates: Some(40),
            max_nodes: Some(10),
            deadline_ms: Some(5),
        };
        let budget = search.budget();
        assert_eq!(budget.max_candidates(), Some(40));
        assert_eq!(budget.max_nodes(), Some(10));
        assert_eq!(budget.deadline(), Some(Duration::from_millis(5)));
    }
}
