//! Regression tree structures for GBDT inference.
//!
//! Integer-only nodes and traversal. Feature values, thresholds, and leaf
//! values are all micro-scaled fixed-point integers.

use serde::{Deserialize, Serialize};

/// A regression tree node (internal or leaf).
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the encoded feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` holds the prediction value in log-severity micros
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    /// Node ID (slot index; for reference, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold (micro-scaled integer)
    pub threshold: i64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<i64>,
}

impl Node {
    /// Create a new internal (split) node.
    pub fn internal(id: i32, feature_idx: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node.
    pub fn leaf(id: i32, value: i64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0,
            leaf: Some(value),
        }
    }

    /// Check if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    /// Get the leaf value if this is a leaf node.
    pub fn leaf_value(&self) -> Option<i64> {
        self.leaf
    }
}

/// A single regression tree with integer-only nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Tree weight for ensemble aggregation (micro-scaled; the boosting
    /// learning rate is stored here so training and serving share one
    /// accumulation formula)
    pub weight: i64,
}

impl Tree {
    /// Create a new tree with the given nodes and weight.
    pub fn new(nodes: Vec<Node>, weight: i64) -> Self {
        Self { nodes, weight }
    }

    /// Evaluate this tree on an encoded feature vector.
    ///
    /// Traversal goes left when `feature <= threshold`. Unseen-category
    /// sentinel codes sit below every fitted threshold and therefore take
    /// the left branch.
    pub fn evaluate(&self, features: &[i64]) -> i64 {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut idx = 0usize;

        loop {
            if idx >= self.nodes.len() {
                return 0; // Invalid tree structure
            }

            let node = &self.nodes[idx];

            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0);
            }

            let feature_idx = node.feature_idx as usize;
            if feature_idx >= features.len() {
                return 0; // Invalid feature index
            }

            idx = if features[feature_idx] <= node.threshold {
                if node.left < 0 || node.left as usize >= self.nodes.len() {
                    return 0;
                }
                node.left as usize
            } else {
                if node.right < 0 || node.right as usize >= self.nodes.len() {
                    return 0;
                }
                node.right as usize
            };
        }
    }

    /// Number of leaf nodes.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.is_leaf() {
                if node.left < 0 || node.left as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid left child: {}", i, node.left));
                }

                if node.right < 0 || node.right as usize >= self.nodes.len() {
                    return Err(format!(
                        "Node {} has invalid right child: {}",
                        i, node.right
                    ));
                }

                if node.feature_idx < 0 {
                    return Err(format!(
                        "Internal node {} has invalid feature index: {}",
                        i, node.feature_idx
                    ));
                }
            } else if node.leaf.is_none() {
                return Err(format!("Leaf node {i} has no leaf value"));
            }
        }

        Ok(())
    }
}
