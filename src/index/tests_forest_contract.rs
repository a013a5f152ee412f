// =========================================================================
// FALSIFY-RPF: random projection forest contract
//
// Each test states a property that must hold for every build and query,
// and fails with a FALSIFIED message naming the property it breaks.
// =========================================================================

use super::*;
use crate::config::ForestConfig;
use crate::distance::Metric;
use crate::store::VectorStore;

fn store(n: usize, dim: usize) -> VectorStore {
    let rows = (0..n)
        .map(|i| {
            (0..dim)
                .map(|d| (((i + 1) * (d + 3)) as f32 * 0.37).sin() * 5.0)
                .collect()
        })
        .collect();
    VectorStore::new(rows).expect("rows")
}

fn build(metric: Metric, n: usize, seed: u64) -> Forest {
    let config = ForestConfig::new()
        .with_n_trees(6)
        .with_leaf_size(4)
        .with_metric(metric)
        .with_seed(seed);
    Forest::build(store(n, 4), &config).expect("valid")
}

/// FALSIFY-RPF-001: every tree partitions the full id range
#[test]
fn falsify_rpf_001_partition_complete() {
    for metric in [Metric::Angular, Metric::Euclidean] {
        let forest = build(metric, 180, 1);
        for (t, tree) in forest.trees().iter().enumerate() {
            let mut ids: Vec<usize> = tree.leaves().flatten().copied().collect();
            ids.sort_unstable();
            assert_eq!(
                ids,
                (0..180).collect::<Vec<_>>(),
                "FALSIFIED RPF-001: tree {t} ({metric}) does not hold every id exactly once"
            );
        }
    }
}

/// FALSIFY-RPF-002: split nodes have two non-empty children
#[test]
fn falsify_rpf_002_no_empty_leaves() {
    let forest = build(Metric::Euclidean, 150, 2);
    for tree in forest.trees() {
        for (i, ids) in tree.leaves().enumerate() {
            assert!(!ids.is_empty(), "FALSIFIED RPF-002: leaf {i} is empty");
        }
    }
}

/// FALSIFY-RPF-003: results are sorted ascending by distance
#[test]
fn falsify_rpf_003_sorted_results() {
    let forest = build(Metric::Angular, 200, 3);
    let results = forest
        .search(&[1.0, 0.5, -0.5, 2.0], 15, &SearchBudget::new())
        .expect("valid query");
    for w in results.windows(2) {
        assert!(
            w[0].distance <= w[1].distance,
            "FALSIFIED RPF-003: {} before {}",
            w[0].distance,
            w[1].distance
        );
    }
}

/// FALSIFY-RPF-004: result count never exceeds min(k, N)
#[test]
fn falsify_rpf_004_result_bound() {
    let forest = build(Metric::Euclidean, 12, 4);
    for k in 1..=20 {
        let results = forest
            .search(&[0.0; 4], k, &SearchBudget::exhaustive())
            .expect("valid query");
        assert_eq!(
            results.len(),
            k.min(12),
            "FALSIFIED RPF-004: k={k} gave {} results",
            results.len()
        );
    }
}

/// FALSIFY-RPF-005: a stored vector is its own nearest neighbor at distance 0
#[test]
fn falsify_rpf_005_self_query() {
    let forest = build(Metric::Euclidean, 100, 5);
    for id in [0, 17, 58, 99] {
        let query = forest.store().row(id).to_vec();
        let results = forest
            .search(&query, 1, &SearchBudget::new())
            .expect("valid query");
        assert_eq!(results[0].id, id, "FALSIFIED RPF-005: id {id} not found first");
        assert_eq!(results[0].distance, 0.0, "FALSIFIED RPF-005: nonzero self distance");
    }
}

/// FALSIFY-RPF-006: exhaustive search equals brute force
#[test]
fn falsify_rpf_006_exhaustive_is_exact() {
    for metric in [Metric::Angular, Metric::Euclidean] {
        let forest = build(metric, 160, 6);
        let query = [0.2, -1.3, 0.8, 0.1];
        let approx = forest
            .search(&query, 8, &SearchBudget::exhaustive())
            .expect("valid query");
        let exact = exact_search(forest.store(), metric, &query, 8).expect("valid");
        assert_eq!(approx, exact, "FALSIFIED RPF-006: {metric} exhaustive differs");
    }
}

/// FALSIFY-RPF-007: identical seed and data give an identical forest
#[test]
fn falsify_rpf_007_seed_determinism() {
    let a = build(Metric::Angular, 120, 77);
    let b = build(Metric::Angular, 120, 77);
    assert!(a == b, "FALSIFIED RPF-007: same seed produced different forests");
}
