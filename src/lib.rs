//! Bosque: approximate nearest neighbor search with random projection forests.
//!
//! A forest of independently seeded trees recursively bisects the vector set
//! with random two-point hyperplanes. Queries probe every tree best-first,
//! crossing split boundaries in order of margin, and re-rank the pooled
//! candidates by exact distance.
//!
//! # Quick Start
//!
//! ```
//! use bosque::prelude::*;
//!
//! let vectors = vec![
//!     vec![0.0, 0.0],
//!     vec![10.0, 0.0],
//!     vec![0.0, 10.0],
//!     vec![10.0, 10.0],
//! ];
//!
//! let forest = build_index(vectors, 5, 1, Metric::Euclidean).expect("valid input");
//! let results = query(&forest, &[1.0, 1.0], 1, &SearchBudget::new()).expect("valid query");
//!
//! assert_eq!(results[0].id, 0);
//! assert!((results[0].distance - 1.414).abs() < 1e-3);
//! ```
//!
//! # Modules
//!
//! - [`store`]: Immutable dense vector storage
//! - [`distance`]: Angular and Euclidean metrics
//! - [`index`]: Tree building, forest, multi-probe search, exact search and persistence
//! - [`classification`]: Labeled nearest-neighbor classifier and evaluation
//! - [`config`]: TOML and environment configuration
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: Error types

pub mod classification;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod logging;
pub mod prelude;
pub mod store;

pub use classification::{Evaluation, ForestClassifier};
pub use config::{BosqueConfig, ForestConfig, SearchConfig};
pub use distance::Metric;
pub use error::{BosqueError, Result};
pub use index::{Forest, Neighbor, SearchBudget, SearchStats};
pub use store::VectorStore;

/// Builds a forest of `num_trees` trees over `vectors`.
///
/// Uses a fresh random seed; build through [`Forest::build`] with
/// [`ForestConfig::with_seed`] for reproducible trees.
///
/// # Errors
///
/// Returns [`BosqueError::EmptyStore`] for no vectors,
/// [`BosqueError::DimensionMismatch`] for inconsistent lengths,
/// [`BosqueError::InvalidTreeCount`] if `num_trees < 1` and
/// [`BosqueError::InvalidHyperparameter`] if `leaf_threshold < 1`.
pub fn build_index(
    vectors: Vec<Vec<f32>>,
    num_trees: usize,
    leaf_threshold: usize,
    metric: Metric,
) -> Result<Forest> {
    let store = VectorStore::new(vectors)?;
    let config = ForestConfig::new()
        .with_n_trees(num_trees)
        .with_leaf_size(leaf_threshold)
        .with_metric(metric);
    Forest::build(store, &config)
}

/// Approximate `k` nearest neighbors of `query_vector`, closest first.
///
/// # Errors
///
/// Returns [`BosqueError::DimensionMismatch`] for a wrong-length query and
/// [`BosqueError::InvalidK`] if `k == 0`.
pub fn query(
    forest: &Forest,
    query_vector: &[f32],
    k: usize,
    budget: &SearchBudget,
) -> Result<Vec<Neighbor>> {
    forest.search(query_vector, k, budget)
}
