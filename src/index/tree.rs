//! Random projection tree stored as a flat node arena.
//!
//! Nodes reference their children by index into the arena. Construction uses
//! an explicit work-list rather than recursion, so tree depth never touches
//! the call stack.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::split::{split, Hyperplane};
use crate::store::VectorStore;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// A node in a random projection tree (either split node or leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Interior node: ids on the positive side of the hyperplane go left.
    Split {
        /// Separating hyperplane
        hyperplane: Hyperplane,
        /// Child holding the positive side
        left: NodeId,
        /// Child holding the negative side
        right: NodeId,
    },
    /// Terminal node holding the ids that landed in this partition.
    Leaf {
        /// Vector ids in this leaf
        ids: Vec<usize>,
    },
}

/// One tree of the forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    seed: u64,
}

/// Parameters shared by every tree build in a forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) leaf_size: usize,
    pub(crate) split_samples: usize,
}

impl Tree {
    /// Builds a tree over every id in `points`.
    ///
    /// `points` holds the vectors in split space. The same `seed` always
    /// yields the same tree.
    pub(crate) fn build(points: &VectorStore, params: TreeParams, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut nodes = vec![Node::Leaf { ids: Vec::new() }];
        let mut work: Vec<(NodeId, Vec<usize>)> = vec![(0, (0..points.len()).collect())];
        let mut oversized_leaves = 0usize;

        while let Some((slot, ids)) = work.pop() {
            if ids.len() <= params.leaf_size {
                nodes[slot] = Node::Leaf { ids };
                continue;
            }

            match split(&ids, points, params.split_samples, &mut rng) {
                Ok(split) => {
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { ids: Vec::new() });
                    nodes.push(Node::Leaf { ids: Vec::new() });
                    nodes[slot] = Node::Split {
                        hyperplane: split.hyperplane,
                        left,
                        right,
                    };
                    // Right first so the left subtree is built first.
                    work.push((right, split.right));
                    work.push((left, split.left));
                }
                Err(_) => {
                    oversized_leaves += 1;
                    nodes[slot] = Node::Leaf { ids };
                }
            }
        }

        if oversized_leaves > 0 {
            warn!(
                seed,
                oversized_leaves, "identical vectors left unsplit; kept as oversized leaves"
            );
        }

        let tree = Self {
            nodes,
            root: 0,
            seed,
        };
        debug!(
            seed,
            nodes = tree.node_count(),
            depth = tree.depth(),
            "tree built"
        );
        tree
    }

    /// Handle of the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a node of this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes (split and leaf).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Seed this tree was built from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Iterates over the id sets of every leaf.
    pub fn leaves(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::Leaf { ids } => Some(ids.as_slice()),
            Node::Split { .. } => None,
        })
    }

    /// Returns the depth of the tree.
    ///
    /// A tree consisting of a single leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[id] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Describes the first structural defect, if any.
    ///
    /// A sound tree reaches every arena node exactly once from the root,
    /// its hyperplanes have `dim` components, and its leaves partition
    /// `[0, n_items)`.
    pub(crate) fn structure_error(&self, n_items: usize, dim: usize) -> Option<&'static str> {
        if self.root >= self.nodes.len() {
            return Some("root handle outside the node arena");
        }

        let mut reached = vec![false; self.nodes.len()];
        let mut placed = vec![false; n_items];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if reached[id] {
                return Some("node reached twice (cycle or shared child)");
            }
            reached[id] = true;

            match &self.nodes[id] {
                Node::Split {
                    hyperplane,
                    left,
                    right,
                } => {
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Some("child handle outside the node arena");
                    }
                    if hyperplane.normal().len() != dim {
                        return Some("hyperplane dimension differs from the store");
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
                Node::Leaf { ids } => {
                    for &item in ids {
                        if item >= n_items {
                            return Some("leaf id outside the store");
                        }
                        if placed[item] {
                            return Some("id stored in more than one leaf");
                        }
                        placed[item] = true;
                    }
                }
            }
        }

        if reached.iter().any(|r| !r) {
            return Some("node unreachable from the root");
        }
        if placed.iter().any(|p| !p) {
            return Some("id missing from every leaf");
        }
        None
    }

    /// Check if the tree passes [`structure_error`](Self::structure_error).
    #[cfg(test)]
    pub(crate) fn is_well_formed(&self, n_items: usize, dim: usize) -> bool {
        self.structure_error(n_items, dim).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(leaf_size: usize) -> TreeParams {
        TreeParams {
            leaf_size,
            split_samples: 3,
        }
    }

    fn line_store(n: usize) -> VectorStore {
        VectorStore::new((0..n).map(|i| vec![i as f32, (i % 7) as f32]).collect())
            .expect("line store")
    }

    fn collected_ids(tree: &Tree) -> Vec<usize> {
        let mut ids: Vec<usize> = tree.leaves().flatten().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_small_set_is_single_leaf() {
        let store = line_store(4);
        let tree = Tree::build(&store, params(8), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 0);
        assert!(matches!(tree.node(tree.root()), Node::Leaf { ids } if ids.len() == 4));
    }

    #[test]
    fn test_every_id_in_exactly_one_leaf() {
        let store = line_store(200);
        let tree = Tree::build(&store, params(5), 42);
        assert_eq!(collected_ids(&tree), (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_leaves_respect_threshold_for_distinct_points() {
        let store = line_store(100);
        let tree = Tree::build(&store, params(4), 9);
        assert!(tree.leaves().all(|ids| ids.len() <= 4));
        assert!(tree.leaves().all(|ids| !ids.is_empty()));
    }

    #[test]
    fn test_duplicates_become_oversized_leaf() {
        let store = VectorStore::new(vec![vec![3.0, 3.0]; 20]).expect("duplicates");
        let tree = Tree::build(&store, params(2), 5);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(collected_ids(&tree).len(), 20);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let store = line_store(150);
        let a = Tree::build(&store, params(3), 1234);
        let b = Tree::build(&store, params(3), 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let store = line_store(150);
        let a = Tree::build(&store, params(3), 1);
        let b = Tree::build(&store, params(3), 2);
        assert_ne!(a.nodes(), b.nodes());
    }

    #[test]
    fn test_depth_is_logarithmic_in_expectation() {
        let store = line_store(1024);
        let tree = Tree::build(&store, params(4), 77);
        // log2(1024 / 4) = 8; random splits are unbalanced, allow generous slack.
        assert!(tree.depth() < 40, "depth {} too large", tree.depth());
    }

    #[test]
    fn test_well_formed() {
        let store = line_store(64);
        let tree = Tree::build(&store, params(2), 3);
        assert!(tree.is_well_formed(64, 2));
        assert!(!tree.is_well_formed(10, 2));
        assert!(!tree.is_well_formed(65, 2));
        assert!(!tree.is_well_formed(64, 3));
    }

    fn plane() -> Hyperplane {
        Hyperplane::bisecting(&[1.0, 0.0], &[0.0, 0.0]).expect("distinct points")
    }

    fn leaf(ids: &[usize]) -> Node {
        Node::Leaf { ids: ids.to_vec() }
    }

    fn hand_built(nodes: Vec<Node>) -> Tree {
        Tree {
            nodes,
            root: 0,
            seed: 0,
        }
    }

    #[test]
    fn test_self_referencing_split_rejected() {
        let tree = hand_built(vec![
            Node::Split {
                hyperplane: plane(),
                left: 0,
                right: 1,
            },
            leaf(&[0, 1]),
        ]);
        assert_eq!(
            tree.structure_error(2, 2),
            Some("node reached twice (cycle or shared child)")
        );
    }

    #[test]
    fn test_shared_child_rejected() {
        let tree = hand_built(vec![
            Node::Split {
                hyperplane: plane(),
                left: 1,
                right: 1,
            },
            leaf(&[0, 1]),
        ]);
        assert!(!tree.is_well_formed(2, 2));
    }

    #[test]
    fn test_duplicate_leaf_id_rejected() {
        let tree = hand_built(vec![leaf(&[1, 1])]);
        assert_eq!(tree.structure_error(2, 2), Some("id stored in more than one leaf"));
    }

    #[test]
    fn test_missing_id_rejected() {
        let tree = hand_built(vec![leaf(&[0])]);
        assert_eq!(tree.structure_error(2, 2), Some("id missing from every leaf"));
    }

    #[test]
    fn test_unreachable_node_rejected() {
        let tree = hand_built(vec![leaf(&[0, 1]), leaf(&[])]);
        assert_eq!(tree.structure_error(2, 2), Some("node unreachable from the root"));
    }

    #[test]
    fn test_out_of_arena_child_rejected() {
        let tree = hand_built(vec![
            Node::Split {
                hyperplane: plane(),
                left: 1,
                right: 7,
            },
            leaf(&[0, 1]),
        ]);
        assert_eq!(
            tree.structure_error(2, 2),
            Some("child handle outside the node arena")
        );
    }
}
