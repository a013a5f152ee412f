//! Forest of independently seeded random projection trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Instant;
use tracing::{info, warn};

use super::tree::{Tree, TreeParams};
use crate::config::ForestConfig;
use crate::distance::{norm, Metric};
use crate::error::{BosqueError, Result};
use crate::store::VectorStore;

/// A frozen forest of random projection trees over one vector store.
///
/// # Examples
///
/// ```
/// use bosque::config::ForestConfig;
/// use bosque::distance::Metric;
/// use bosque::index::{Forest, SearchBudget};
/// use bosque::store::VectorStore;
///
/// let store = VectorStore::new(vec![
///     vec![0.0, 0.0],
///     vec![10.0, 0.0],
///     vec![0.0, 10.0],
///     vec![10.0, 10.0],
/// ]).expect("consistent rows");
///
/// let config = ForestConfig::new()
///     .with_n_trees(5)
///     .with_leaf_size(1)
///     .with_metric(Metric::Euclidean)
///     .with_seed(42);
/// let forest = Forest::build(store, &config).expect("valid config");
///
/// let results = forest.search(&[1.0, 1.0], 1, &SearchBudget::exhaustive()).expect("valid query");
/// assert_eq!(results[0].id, 0);
/// assert!((results[0].distance - 2.0_f32.sqrt()).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    store: VectorStore,
    trees: Vec<Tree>,
    config: ForestConfig,
}

impl Forest {
    /// Builds `config.n_trees` trees over every vector in `store`.
    ///
    /// Trees are built in parallel when the `parallel` feature is enabled.
    /// The output depends only on the store and the seed, not on thread
    /// scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::EmptyStore`] for an empty store,
    /// [`BosqueError::InvalidTreeCount`] if `n_trees < 1` and
    /// [`BosqueError::InvalidHyperparameter`] for a zero leaf size or
    /// sample count.
    pub fn build(store: VectorStore, config: &ForestConfig) -> Result<Self> {
        if store.is_empty() {
            return Err(BosqueError::EmptyStore);
        }
        config.validate()?;

        let start = Instant::now();
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut seed_rng = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| seed_rng.gen()).collect();

        let points = split_space(&store, config.metric);
        let params = TreeParams {
            leaf_size: config.leaf_size,
            split_samples: config.split_samples,
        };

        let trees = build_trees(&points, params, tree_seeds);

        let mut resolved = config.clone();
        resolved.seed = Some(seed);

        let forest = Self {
            store,
            trees,
            config: resolved,
        };

        info!(
            n_items = forest.len(),
            dimension = forest.dimension(),
            n_trees = forest.n_trees(),
            nodes = forest.node_count(),
            metric = %forest.metric(),
            seed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "forest built"
        );

        Ok(forest)
    }

    /// The vectors this forest indexes.
    #[must_use]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// The trees, in build order.
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Metric used for splitting and ranking.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    /// Configuration the forest was built with; `seed` is always resolved.
    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Number of indexed vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the forest indexes no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Dimensionality of indexed vectors.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    /// Total number of nodes across all trees.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(Tree::node_count).sum()
    }

    /// Describes the first structural defect, if any. Used after decoding.
    pub(crate) fn structure_error(&self) -> Option<String> {
        if self.trees.is_empty() || self.trees.len() != self.config.n_trees {
            return Some(format!(
                "{} trees stored but config says {}",
                self.trees.len(),
                self.config.n_trees
            ));
        }
        self.trees.iter().enumerate().find_map(|(i, tree)| {
            tree.structure_error(self.len(), self.dimension())
                .map(|reason| format!("tree {i}: {reason}"))
        })
    }

    /// Check if the forest passes [`structure_error`](Self::structure_error).
    #[cfg(test)]
    pub(crate) fn is_well_formed(&self) -> bool {
        self.structure_error().is_none()
    }
}

/// Vectors in the space hyperplanes are computed in.
///
/// Angular forests split unit-normalized copies. Euclidean forests split the
/// stored rows directly.
pub(crate) fn split_space(store: &VectorStore, metric: Metric) -> Cow<'_, VectorStore> {
    match metric {
        Metric::Euclidean => Cow::Borrowed(store),
        Metric::Angular => {
            let zero_vectors = store.iter().filter(|(_, v)| norm(v) == 0.0).count();
            if zero_vectors > 0 {
                warn!(
                    zero_vectors,
                    "all-zero vectors have no direction under the angular metric; their distances are maximal"
                );
            }
            Cow::Owned(store.map_rows(|row| metric.project(row)))
        }
    }
}

#[cfg(feature = "parallel")]
fn build_trees(points: &VectorStore, params: TreeParams, seeds: Vec<u64>) -> Vec<Tree> {
    seeds
        .into_par_iter()
        .map(|seed| Tree::build(points, params, seed))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_trees(points: &VectorStore, params: TreeParams, seeds: Vec<u64>) -> Vec<Tree> {
    build_trees_sequential(points, params, seeds)
}

#[cfg(any(test, not(feature = "parallel")))]
fn build_trees_sequential(points: &VectorStore, params: TreeParams, seeds: Vec<u64>) -> Vec<Tree> {
    seeds
        .into_iter()
        .map(|seed| Tree::build(points, params, seed))
        .collect()
}

#[cfg(test)]
#[path = "forest_tests.rs"]
mod forest_tests;
