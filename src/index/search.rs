//! Multi-probe best-first search over a forest.
//!
//! # Algorithm
//!
//! - A max-heap of unexplored subtrees is seeded with every tree root.
//! - The best entry is popped and followed greedily to a leaf. At each split
//!   the search continues on the query's side and pushes the other side
//!   with priority `min(parent, -|margin|)`, so subtrees just across a
//!   boundary are probed before distant ones.
//! - Leaf ids are collected into a deduplicated candidate set until the
//!   candidate budget, node cap or deadline is reached.
//! - Candidates are re-ranked by exact distance and the best `k` returned.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::forest::Forest;
use super::tree::{Node, NodeId};
use crate::error::{BosqueError, Result};

/// A search hit: vector id and its exact distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Vector id in the store
    pub id: usize,
    /// Exact distance under the forest's metric
    pub distance: f32,
}

/// Limits on the work a single query may do.
///
/// # Examples
///
/// ```
/// use bosque::index::SearchBudget;
/// use std::time::Duration;
///
/// let budget = SearchBudget::new()
///     .with_max_candidates(200)
///     .with_max_nodes(1_000)
///     .with_deadline(Duration::from_millis(5));
/// assert_eq!(budget.max_candidates(), Some(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchBudget {
    max_candidates: Option<usize>,
    max_nodes: Option<usize>,
    deadline: Option<Duration>,
}

impl SearchBudget {
    /// Default budget: `k * n_trees` candidates, no node or time cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget that visits every node of every tree.
    #[must_use]
    pub fn exhaustive() -> Self {
        Self {
            max_candidates: Some(usize::MAX),
            max_nodes: None,
            deadline: None,
        }
    }

    /// Stop once this many distinct candidates have been collected.
    #[must_use]
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = Some(max_candidates);
        self
    }

    /// Stop after expanding this many tree nodes.
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Stop expanding nodes once this much wall-clock time has elapsed.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Configured candidate budget, if any.
    #[must_use]
    pub fn max_candidates(&self) -> Option<usize> {
        self.max_candidates
    }

    /// Configured node cap, if any.
    #[must_use]
    pub fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    /// Configured deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Candidate limit for a query; never below `k`.
    fn candidate_limit(&self, k: usize, n_trees: usize) -> usize {
        self.max_candidates
            .unwrap_or_else(|| k.saturating_mul(n_trees))
            .max(k)
    }
}

/// Work counters for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Tree nodes expanded (split and leaf)
    pub nodes_expanded: usize,
    /// Leaves reached
    pub leaves_reached: usize,
    /// Distinct candidate ids re-ranked
    pub candidates: usize,
    /// Search ended with unexplored subtrees remaining
    pub budget_exhausted: bool,
}

/// Heap entry: a subtree still to explore.
#[derive(Debug, Clone, Copy)]
struct Probe {
    priority: f32,
    tree: usize,
    node: NodeId,
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Probe {}

impl PartialOrd for Probe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Probe {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower tree/node indices win ties so traversal order is deterministic.
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.tree.cmp(&self.tree))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// One bit per vector id.
struct VisitedSet {
    data: Vec<u64>,
}

impl VisitedSet {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.div_ceil(64)],
        }
    }

    /// Marks `index`; returns `true` if it was not yet marked.
    #[inline]
    fn insert(&mut self, index: usize) -> bool {
        let slot = &mut self.data[index / 64];
        let bit = 1u64 << (index % 64);
        let fresh = *slot & bit == 0;
        *slot |= bit;
        fresh
    }
}

struct Limits {
    candidates: usize,
    nodes: usize,
    deadline: Option<Instant>,
}

impl Limits {
    fn node_budget_hit(&self, stats: &SearchStats) -> bool {
        stats.nodes_expanded >= self.nodes || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Forest {
    /// Approximate `k` nearest neighbors of `query`, closest first.
    ///
    /// Returns fewer than `k` results when fewer candidates were reached.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::DimensionMismatch`] if `query.len()` differs
    /// from the store dimension and [`BosqueError::InvalidK`] if `k == 0`.
    pub fn search(&self, query: &[f32], k: usize, budget: &SearchBudget) -> Result<Vec<Neighbor>> {
        self.search_with_stats(query, k, budget)
            .map(|(neighbors, _)| neighbors)
    }

    /// Like [`Forest::search`], also returning work counters.
    ///
    /// # Errors
    ///
    /// Same as [`Forest::search`].
    pub fn search_with_stats(
        &self,
        query: &[f32],
        k: usize,
        budget: &SearchBudget,
    ) -> Result<(Vec<Neighbor>, SearchStats)> {
        self.validate_query(query, k)?;

        let started = Instant::now();
        let limits = Limits {
            candidates: budget.candidate_limit(k, self.n_trees()),
            nodes: budget.max_nodes.unwrap_or(usize::MAX),
            deadline: budget.deadline.and_then(|d| started.checked_add(d)),
        };

        let (candidates, stats) = self.collect_candidates(query, &limits);
        let neighbors = self.rank(query, &candidates, k);

        debug!(
            k,
            candidates = stats.candidates,
            nodes_expanded = stats.nodes_expanded,
            leaves = stats.leaves_reached,
            budget_exhausted = stats.budget_exhausted,
            "search complete"
        );

        Ok((neighbors, stats))
    }

    pub(crate) fn validate_query(&self, query: &[f32], k: usize) -> Result<()> {
        if query.len() != self.dimension() {
            return Err(BosqueError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if k < 1 {
            return Err(BosqueError::InvalidK { k });
        }
        Ok(())
    }

    fn collect_candidates(&self, query: &[f32], limits: &Limits) -> (Vec<usize>, SearchStats) {
        let projected = self.metric().project(query);
        let mut stats = SearchStats::default();
        let mut visited = VisitedSet::new(self.len());
        let mut candidates = Vec::new();

        let mut heap: BinaryHeap<Probe> = self
            .trees()
            .iter()
            .enumerate()
            .map(|(tree, t)| Probe {
                priority: f32::INFINITY,
                tree,
                node: t.root(),
            })
            .collect();

        'probe: while candidates.len() < limits.candidates {
            let Some(probe) = heap.pop() else { break };
            let tree = &self.trees()[probe.tree];
            let mut current = probe.node;
            let priority = probe.priority;

            loop {
                if limits.node_budget_hit(&stats) {
                    heap.push(Probe {
                        priority,
                        tree: probe.tree,
                        node: current,
                    });
                    break 'probe;
                }
                stats.nodes_expanded += 1;

                match tree.node(current) {
                    Node::Leaf { ids } => {
                        stats.leaves_reached += 1;
                        for &id in ids {
                            if visited.insert(id) {
                                candidates.push(id);
                            }
                        }
                        break;
                    }
                    Node::Split {
                        hyperplane,
                        left,
                        right,
                    } => {
                        let margin = hyperplane.margin(&projected);
                        let (near, far) = if margin >= 0.0 {
                            (*left, *right)
                        } else {
                            (*right, *left)
                        };
                        heap.push(Probe {
                            priority: priority.min(-margin.abs()),
                            tree: probe.tree,
                            node: far,
                        });
                        current = near;
                    }
                }
            }
        }

        stats.candidates = candidates.len();
        stats.budget_exhausted = !heap.is_empty();
        (candidates, stats)
    }

    fn rank(&self, query: &[f32], candidates: &[usize], k: usize) -> Vec<Neighbor> {
        let metric = self.metric();
        let store = self.store();
        let mut scored: Vec<Neighbor> = candidates
            .iter()
            .map(|&id| Neighbor {
                id,
                distance: metric.distance(query, store.row(id)),
            })
            .collect();
        sort_neighbors(&mut scored);
        scored.truncate(k);
        scored
    }
}

/// Sorts ascending by distance, ties by id.
pub(crate) fn sort_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_unstable_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
