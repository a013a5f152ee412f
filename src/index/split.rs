//! Random two-point hyperplane splits.
//!
//! A split samples a few random pairs from the id set, keeps the pair that is
//! farthest apart and partitions the set by the perpendicular bisector of that
//! pair. Points lying exactly on the hyperplane are assigned by id parity so
//! that repeated splits of the same set cannot loop.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distance::{dot, norm, squared_l2};
use crate::store::VectorStore;

/// Oriented hyperplane `{x : dot(normal, x) = offset}` with a unit normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperplane {
    normal: Vec<f32>,
    offset: f32,
}

impl Hyperplane {
    /// Perpendicular bisector of `p` and `q`, oriented so `p` lies on the
    /// positive side. Returns `None` when the points coincide.
    #[must_use]
    pub fn bisecting(p: &[f32], q: &[f32]) -> Option<Self> {
        let diff: Vec<f32> = p.iter().zip(q.iter()).map(|(a, b)| a - b).collect();
        let len = norm(&diff);
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        let normal: Vec<f32> = diff.iter().map(|d| d / len).collect();
        let midpoint: Vec<f32> = p.iter().zip(q.iter()).map(|(a, b)| (a + b) * 0.5).collect();
        let offset = dot(&normal, &midpoint);
        Some(Self { normal, offset })
    }

    /// Signed distance from `v` to the hyperplane along the normal.
    #[inline]
    #[must_use]
    pub fn margin(&self, v: &[f32]) -> f32 {
        dot(&self.normal, v) - self.offset
    }

    /// Unit normal vector.
    #[must_use]
    pub fn normal(&self) -> &[f32] {
        &self.normal
    }

    /// Scalar offset along the normal.
    #[must_use]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Which child an id belongs to: `true` for left (positive side).
    #[inline]
    pub(crate) fn goes_left(&self, id: usize, v: &[f32]) -> bool {
        let margin = self.margin(v);
        if margin > 0.0 {
            true
        } else if margin < 0.0 {
            false
        } else {
            id % 2 == 0
        }
    }
}

/// All sampled points coincide; the caller turns the set into a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("degenerate split: every point in the set is identical")]
pub(crate) struct DegenerateSplit;

/// Result of a successful split. Both halves are non-empty.
#[derive(Debug)]
pub(crate) struct Split {
    pub(crate) hyperplane: Hyperplane,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Partitions `ids` (at least two of them) with a random bisecting hyperplane.
///
/// `points` must already be projected into split space (unit vectors for the
/// angular metric). `samples` pairs are drawn and the farthest one is used.
pub(crate) fn split<R: Rng + ?Sized>(
    ids: &[usize],
    points: &VectorStore,
    samples: usize,
    rng: &mut R,
) -> Result<Split, DegenerateSplit> {
    if ids.len() < 2 {
        return Err(DegenerateSplit);
    }

    let (p, q) = farthest_sampled_pair(ids, points, samples, rng)
        .or_else(|| first_distinct_pair(ids, points))
        .ok_or(DegenerateSplit)?;

    let hyperplane =
        Hyperplane::bisecting(points.row(p), points.row(q)).ok_or(DegenerateSplit)?;

    let mut left = Vec::with_capacity(ids.len() / 2 + 1);
    let mut right = Vec::with_capacity(ids.len() / 2 + 1);
    for &id in ids {
        if hyperplane.goes_left(id, points.row(id)) {
            left.push(id);
        } else {
            right.push(id);
        }
    }

    if left.is_empty() || right.is_empty() {
        return Err(DegenerateSplit);
    }

    Ok(Split {
        hyperplane,
        left,
        right,
    })
}

/// Draws `samples` random distinct pairs and returns the one farthest apart,
/// or `None` if every sampled pair coincides.
fn farthest_sampled_pair<R: Rng + ?Sized>(
    ids: &[usize],
    points: &VectorStore,
    samples: usize,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let n = ids.len();
    let mut best: Option<(usize, usize, f32)> = None;

    for _ in 0..samples.max(1) {
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        let (p, q) = (ids[i], ids[j]);
        let d = squared_l2(points.row(p), points.row(q));
        if d > 0.0 && best.map_or(true, |(_, _, best_d)| d > best_d) {
            best = Some((p, q, d));
        }
    }

    best.map(|(p, q, _)| (p, q))
}

/// Deterministic fallback when sampling only hit duplicates.
fn first_distinct_pair(ids: &[usize], points: &VectorStore) -> Option<(usize, usize)> {
    let anchor = ids[0];
    let anchor_row = points.row(anchor);
    ids[1..]
        .iter()
        .copied()
        .find(|&id| points.row(id) != anchor_row)
        .map(|id| (anchor, id))
}
