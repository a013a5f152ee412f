//! Error types for bosque operations.
//!
//! Build-time configuration errors abort the build call, query-time errors
//! abort only the offending query. Degenerate geometry during tree
//! construction is recovered inside the builder and never reaches callers.

use thiserror::Error;

/// Main error type for index construction, search and persistence.
///
/// # Examples
///
/// ```
/// use bosque::error::BosqueError;
///
/// let err = BosqueError::DimensionMismatch { expected: 128, actual: 64 };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Error, Debug)]
pub enum BosqueError {
    /// Vector length does not match the store dimension.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension required by the store or index
        expected: usize,
        /// Dimension actually supplied
        actual: usize,
    },

    /// No vectors were supplied.
    #[error("Cannot build an index over an empty vector store")]
    EmptyStore,

    /// Forest must contain at least one tree.
    #[error("Invalid tree count: {n_trees}, expected at least 1")]
    InvalidTreeCount {
        /// Requested number of trees
        n_trees: usize,
    },

    /// Number of requested neighbors must be positive.
    #[error("Invalid k: {k}, expected at least 1")]
    InvalidK {
        /// Requested neighbor count
        k: usize,
    },

    /// Direct store access outside `[0, len)`.
    #[error("Vector id {index} out of range (len={len})")]
    IndexOutOfRange {
        /// Requested id
        index: usize,
        /// Number of stored vectors
        len: usize,
    },

    /// Invalid hyperparameter value provided.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Query issued before the model was fitted.
    #[error("Model not fitted: call fit() before querying")]
    NotFitted,

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid or corrupt index file.
    #[error("Invalid index format: {message}")]
    FormatError {
        /// Error description
        message: String,
    },

    /// Unsupported format version.
    #[error(
        "Unsupported format version: found {}.{}, max supported {}.{}",
        .found.0, .found.1, .supported.0, .supported.1
    )]
    UnsupportedVersion {
        /// Version found
        found: (u8, u8),
        /// Maximum supported version
        supported: (u8, u8),
    },

    /// Checksum verification failed.
    #[error("Checksum mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch {
        /// Checksum stored in the file
        expected: u32,
        /// Checksum computed over the file contents
        actual: u32,
    },

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BosqueError {
    /// Create an invalid hyperparameter error with descriptive context
    #[must_use]
    pub fn invalid_hyperparameter(
        param: &str,
        value: impl std::fmt::Display,
        constraint: &str,
    ) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create an index out of range error
    #[must_use]
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

impl From<bincode::Error> for BosqueError {
    fn from(err: bincode::Error) -> Self {
        BosqueError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BosqueError {
    fn from(err: toml::de::Error) -> Self {
        BosqueError::Config(err.to_string())
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, BosqueError>;
