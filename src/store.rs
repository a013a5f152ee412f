//! Immutable dense storage for the reference vectors.

use crate::error::{BosqueError, Result};
use serde::{Deserialize, Serialize};

/// A dense table of `len` vectors of fixed dimension (row-major storage).
///
/// Each vector is identified by its row index in `[0, len)`. The store never
/// changes after construction.
///
/// # Examples
///
/// ```
/// use bosque::store::VectorStore;
///
/// let store = VectorStore::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).expect("consistent rows");
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.dimension(), 2);
/// assert_eq!(store.get(1).expect("id in range"), &[3.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreParts")]
pub struct VectorStore {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

/// Wire form of [`VectorStore`], checked on the way in.
#[derive(Deserialize)]
struct StoreParts {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

impl TryFrom<StoreParts> for VectorStore {
    type Error = BosqueError;

    fn try_from(parts: StoreParts) -> Result<Self> {
        let store = Self::from_flat(parts.dim, parts.data)?;
        if store.rows != parts.rows {
            return Err(BosqueError::DimensionMismatch {
                expected: parts.rows.saturating_mul(parts.dim),
                actual: store.data.len(),
            });
        }
        Ok(store)
    }
}

impl VectorStore {
    /// Creates a store from a sequence of vectors.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::EmptyStore`] if `vectors` is empty and
    /// [`BosqueError::DimensionMismatch`] if the vectors have different
    /// lengths or are zero-dimensional.
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let first = vectors.first().ok_or(BosqueError::EmptyStore)?;
        let dim = first.len();
        if dim == 0 {
            return Err(BosqueError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dim);
        for vector in &vectors {
            if vector.len() != dim {
                return Err(BosqueError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { data, rows, dim })
    }

    /// Creates a store from row-major data with the given dimension.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::EmptyStore`] if `data` is empty and
    /// [`BosqueError::DimensionMismatch`] if `data.len()` is not a multiple
    /// of `dim`.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(BosqueError::EmptyStore);
        }
        if dim == 0 || data.len() % dim != 0 {
            return Err(BosqueError::DimensionMismatch {
                expected: dim,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows: data.len() / dim,
            data,
            dim,
        })
    }

    /// Returns the vector with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`BosqueError::IndexOutOfRange`] if `id >= len()`.
    pub fn get(&self, id: usize) -> Result<&[f32]> {
        if id >= self.rows {
            return Err(BosqueError::index_out_of_range(id, self.rows));
        }
        Ok(self.row(id))
    }

    /// Returns the vector with the given id without a range check result.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[must_use]
    pub fn row(&self, id: usize) -> &[f32] {
        let start = id * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Returns the dimensionality shared by every vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Returns the number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Check if the store is empty.
    ///
    /// Always `false` for a successfully constructed store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Iterates over `(id, vector)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f32])> + '_ {
        self.data.chunks_exact(self.dim).enumerate()
    }

    /// Store of the same shape with every row replaced by `f(row)`.
    ///
    /// `f` must return exactly `dimension()` values.
    pub(crate) fn map_rows<F: Fn(&[f32]) -> Vec<f32>>(&self, f: F) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(self.dim) {
            data.extend(f(row));
        }
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            data,
            rows: self.rows,
            dim: self.dim,
        }
    }

    /// Returns the underlying row-major data.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
