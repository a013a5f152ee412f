//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use bosque::prelude::*;
//! ```

pub use crate::classification::{Evaluation, ForestClassifier};
pub use crate::config::{BosqueConfig, ForestConfig, SearchConfig};
pub use crate::distance::Metric;
pub use crate::error::BosqueError;
pub use crate::index::{exact_search, recall, Forest, Neighbor, SearchBudget, SearchStats};
pub use crate::store::VectorStore;
pub use crate::{build_index, query};
