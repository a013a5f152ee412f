//! Distance metrics for vector comparison.
//!
//! The same metric drives both hyperplane construction during tree builds and
//! exact re-ranking of candidates during queries.
//!
//! # Examples
//!
//! ```
//! use bosque::distance::Metric;
//!
//! let d = Metric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
//! assert!((d - 5.0).abs() < 1e-6);
//!
//! let d = Metric::Angular.distance(&[1.0, 0.0], &[0.0, 2.0]);
//! assert!((d - 1.0).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BosqueError;

/// Distance metric chosen once per forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 - cos(a, b)`. Range: 0.0 to 2.0
    ///
    /// All-zero vectors have no direction; any distance involving one is
    /// reported as the maximum, 2.0.
    #[default]
    Angular,
    /// L2 distance. Range: 0.0 to infinity
    Euclidean,
}

impl Metric {
    /// Computes the distance between two vectors.
    ///
    /// Lower distance means more similar for both metrics.
    #[must_use]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Angular => angular_distance(a, b),
            Metric::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Maps a point into the space hyperplanes are computed in.
    ///
    /// Angular splits operate on the unit sphere, Euclidean splits on raw
    /// coordinates.
    #[must_use]
    pub(crate) fn project(&self, v: &[f32]) -> Vec<f32> {
        match self {
            Metric::Angular => normalized(v),
            Metric::Euclidean => v.to_vec(),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Angular => write!(f, "angular"),
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = BosqueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "angular" | "cosine" => Ok(Metric::Angular),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            other => Err(BosqueError::invalid_hyperparameter(
                "metric",
                other,
                "angular or euclidean",
            )),
        }
    }
}

/// Dot product of two equal-length slices.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Squared L2 distance.
#[inline]
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean (L2) distance.
#[inline]
#[must_use]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_l2(a, b).sqrt()
}

/// Cosine distance (1 - cosine similarity).
///
/// Returns values in [0, 2]:
/// - 0: identical direction
/// - 1: orthogonal
/// - 2: opposite direction, or either vector is all zeros
#[must_use]
pub fn angular_distance(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }
    let cos_sim = dot(a, b) / (norm_a * norm_b);
    1.0 - cos_sim.clamp(-1.0, 1.0)
}

/// Returns `v` scaled to unit length. Zero vectors are returned unchanged.
#[must_use]
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let n = norm(v);
    if n == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / n).collect()
}
