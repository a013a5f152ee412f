//! Random projection forest for approximate nearest neighbor search.
//!
//! # Algorithms
//!
//! - **Build**: each tree recursively bisects the vector set with the
//!   perpendicular bisector of two distant sampled points until leaves hold
//!   at most `leaf_size` ids
//! - **Search**: best-first multi-probe traversal across all trees, followed
//!   by exact re-ranking of the collected candidates
//! - **Exact**: brute-force scan, used as ground truth for recall
//!
//! # Quick Start
//!
//! ```
//! use bosque::config::ForestConfig;
//! use bosque::index::{Forest, SearchBudget};
//! use bosque::store::VectorStore;
//!
//! let store = VectorStore::new(vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![1.0, 1.0, 0.0],
//!     vec![0.0, 1.0, 0.0],
//! ]).expect("consistent rows");
//!
//! // Angular metric by default
//! let forest = Forest::build(store, &ForestConfig::new().with_seed(7)).expect("valid config");
//!
//! let results = forest.search(&[0.9, 0.1, 0.0], 2, &SearchBudget::new()).expect("valid query");
//! assert_eq!(results[0].id, 0);
//! assert!(results[0].distance <= results[1].distance);
//! ```

pub mod exact;
pub mod forest;
pub mod persist;
pub mod search;
pub mod split;
pub mod tree;

#[cfg(test)]
mod tests_forest_contract;

pub use exact::{exact_search, recall};
pub use forest::Forest;
pub use search::{Neighbor, SearchBudget, SearchStats};
pub use split::Hyperplane;
pub use tree::{Node, NodeId, Tree};
