//! Labeled nearest-neighbor classification on top of a forest.
//!
//! [`ForestClassifier`] keeps one caller-supplied label per training vector.
//! A query is answered with the label of its approximate nearest neighbor.
//!
//! # Example
//!
//! ```
//! use bosque::classification::ForestClassifier;
//! use bosque::distance::Metric;
//!
//! let x = vec![
//!     vec![0.0, 0.0], // low
//!     vec![0.0, 1.0], // low
//!     vec![1.0, 0.0], // low
//!     vec![5.0, 5.0], // high
//!     vec![5.0, 6.0], // high
//!     vec![6.0, 5.0], // high
//! ];
//! let y = vec!["low", "low", "low", "high", "high", "high"];
//!
//! let mut clf = ForestClassifier::new()
//!     .with_n_trees(5)
//!     .with_leaf_size(2)
//!     .with_metric(Metric::Euclidean)
//!     .with_seed(3);
//! clf.fit(x, y).expect("one label per vector");
//!
//! let (label, _distance) = clf.closest(&[0.5, 0.5]).expect("fitted");
//! assert_eq!(label, "low");
//! ```

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::ForestConfig;
use crate::distance::Metric;
use crate::error::{BosqueError, Result};
use crate::index::{Forest, SearchBudget};
use crate::store::VectorStore;

/// Outcome of [`ForestClassifier::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// `(total - mislabeled) / total`, in `[0, 1]`
    pub accuracy: f32,
    /// Test samples whose predicted label differs from the expected one
    pub mislabeled: usize,
    /// Number of test samples
    pub total: usize,
    /// Wall-clock time spent answering the test queries
    pub elapsed: Duration,
}

impl Evaluation {
    fn from_counts(mislabeled: usize, total: usize, elapsed: Duration) -> Self {
        Self {
            accuracy: (total - mislabeled) as f32 / total as f32,
            mislabeled,
            total,
            elapsed,
        }
    }

    /// Accuracy as a percentage.
    #[must_use]
    pub fn accuracy_percent(&self) -> f32 {
        self.accuracy * 100.0
    }
}

/// Approximate 1-NN classifier backed by a random projection forest.
#[derive(Debug, Clone)]
pub struct ForestClassifier<L> {
    config: ForestConfig,
    budget: SearchBudget,
    forest: Option<Forest>,
    labels: Vec<L>,
}

impl<L: Clone + PartialEq> Default for ForestClassifier<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Clone + PartialEq> ForestClassifier<L> {
    /// Creates an unfitted classifier with the default forest configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ForestConfig::default(),
            budget: SearchBudget::new(),
            forest: None,
            labels: Vec::new(),
        }
    }

    /// Replaces the whole forest configuration.
    #[must_use]
    pub fn with_config(mut self, config: ForestConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.config.n_trees = n_trees;
        self
    }

    /// Sets the maximum leaf size.
    #[must_use]
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.config.leaf_size = leaf_size;
        self
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Fixes the build seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Budget applied to every query.
    #[must_use]
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Builds the forest over `vectors`; `labels[i]` belongs to `vectors[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::DimensionMismatch`] if the counts differ or the
    /// vectors have inconsistent lengths, plus any forest build error.
    pub fn fit(&mut self, vectors: Vec<Vec<f32>>, labels: Vec<L>) -> Result<()> {
        if vectors.len() != labels.len() {
            return Err(BosqueError::DimensionMismatch {
                expected: vectors.len(),
                actual: labels.len(),
            });
        }
        let store = VectorStore::new(vectors)?;
        let forest = Forest::build(store, &self.config)?;
        self.forest = Some(forest);
        self.labels = labels;
        Ok(())
    }

    /// Label and distance of the nearest neighbor found for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::NotFitted`] before [`fit`](Self::fit),
    /// [`BosqueError::DimensionMismatch`] for a wrong-length query and
    /// [`BosqueError::InvalidHyperparameter`] if the budget stops the search
    /// before any candidate is reached.
    pub fn closest(&self, query: &[f32]) -> Result<(L, f32)> {
        let forest = self.forest.as_ref().ok_or(BosqueError::NotFitted)?;
        let hits = forest.search(query, 1, &self.budget)?;
        let best = hits.first().ok_or_else(|| {
            BosqueError::invalid_hyperparameter(
                "budget",
                format!("{:?}", self.budget),
                "must allow reaching at least one leaf",
            )
        })?;
        Ok((self.labels[best.id].clone(), best.distance))
    }

    /// Predicted label for each query.
    ///
    /// # Errors
    ///
    /// Same as [`closest`](Self::closest).
    pub fn predict(&self, queries: &[Vec<f32>]) -> Result<Vec<L>> {
        queries
            .iter()
            .map(|q| self.closest(q).map(|(label, _)| label))
            .collect()
    }

    /// Classifies every test vector and compares against `test_y`.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::InvalidHyperparameter`] for an empty test set,
    /// [`BosqueError::DimensionMismatch`] if the counts differ, and any error
    /// from [`closest`](Self::closest).
    pub fn evaluate(&self, test_x: &[Vec<f32>], test_y: &[L]) -> Result<Evaluation> {
        if test_x.is_empty() {
            return Err(BosqueError::invalid_hyperparameter(
                "test_x",
                0,
                "at least one test sample",
            ));
        }
        if test_x.len() != test_y.len() {
            return Err(BosqueError::DimensionMismatch {
                expected: test_x.len(),
                actual: test_y.len(),
            });
        }

        let start = Instant::now();
        let mut mislabeled = 0;
        for (query, expected) in test_x.iter().zip(test_y) {
            let (label, _) = self.closest(query)?;
            if label != *expected {
                mislabeled += 1;
            }
        }
        let evaluation = Evaluation::from_counts(mislabeled, test_x.len(), start.elapsed());

        info!(
            total = evaluation.total,
            mislabeled = evaluation.mislabeled,
            accuracy = evaluation.accuracy,
            elapsed_ms = evaluation.elapsed.as_millis() as u64,
            "evaluation complete"
        );
        Ok(evaluation)
    }

    /// Check if [`fit`](Self::fit) has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.forest.is_some()
    }

    /// The fitted forest, if any.
    #[must_use]
    pub fn forest(&self) -> Option<&Forest> {
        self.forest.as_ref()
    }

    /// Training labels in id order.
    #[must_use]
    pub fn labels(&self) -> &[L] {
        &self.labels
    }
}

#[cfg(test)]
mod tests;
