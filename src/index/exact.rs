//! Exact brute-force k-NN, the ground truth for recall measurements.

use super::search::{sort_neighbors, Neighbor};
use crate::distance::Metric;
use crate::error::{BosqueError, Result};
use crate::store::VectorStore;

/// Exact `k` nearest neighbors of `query` by linear scan, closest first.
///
/// # Errors
///
/// Returns [`BosqueError::DimensionMismatch`] if `query.len()` differs from
/// the store dimension and [`BosqueError::InvalidK`] if `k == 0`.
///
/// # Examples
///
/// ```
/// use bosque::distance::Metric;
/// use bosque::index::exact_search;
/// use bosque::store::VectorStore;
///
/// let store = VectorStore::new(vec![vec![0.0], vec![5.0], vec![9.0]]).expect("rows");
/// let hits = exact_search(&store, Metric::Euclidean, &[6.0], 2).expect("valid query");
/// assert_eq!(hits.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub fn exact_search(
    store: &VectorStore,
    metric: Metric,
    query: &[f32],
    k: usize,
) -> Result<Vec<Neighbor>> {
    if query.len() != store.dimension() {
        return Err(BosqueError::DimensionMismatch {
            expected: store.dimension(),
            actual: query.len(),
        });
    }
    if k < 1 {
        return Err(BosqueError::InvalidK { k });
    }

    let mut scored: Vec<Neighbor> = store
        .iter()
        .map(|(id, v)| Neighbor {
            id,
            distance: metric.distance(query, v),
        })
        .collect();
    sort_neighbors(&mut scored);
    scored.truncate(k);
    Ok(scored)
}

/// Fraction of `exact` ids that also appear in `approx`.
///
/// Returns 1.0 when `exact` is empty.
#[must_use]
pub fn recall(approx: &[Neighbor], exact: &[Neighbor]) -> f32 {
    if exact.is_empty() {
        return 1.0;
    }
    let hits = exact
        .iter()
        .filter(|truth| approx.iter().any(|n| n.id == truth.id))
        .count();
    hits as f32 / exact.len() as f32
}
