//! Deterministic GBDT (Gradient Boosted Decision Tree) inference engine.
//!
//! Integer-only regression ensemble used for claim severity prediction:
//!
//! - **Zero floating-point operations**: all computation is fixed-point
//! - **Deterministic across platforms**: same input, same output
//! - **Canonical serialization**: sorted JSON keys for reproducible hashing
//! - **Blake3 hashing**: fast artifact verification
//!
//! Scores are log-severity values at micro scale; the boosting learning
//! rate is baked into each tree's `weight`, so serving accumulates
//! `bias + sum(leaf * weight / scale)` with no trainer-specific state.
//!
//! ```rust,no_run
//! use claimsev_core::gbdt::{Model, Node, Tree};
//! use claimsev_core::fixed::SCALE;
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 50 * SCALE, 1, 2),
//!         Node::leaf(1, 100 * SCALE),
//!         Node::leaf(2, 200 * SCALE),
//!     ],
//!     SCALE,
//! );
//!
//! let model = Model::new(vec![tree], 0);
//! let score = model.score(&[30 * SCALE, 40 * SCALE]);
//! let hash = model.hash_hex().unwrap();
//! ```

pub mod model;
pub mod tree;

pub use model::{Model, ModelError};
pub use tree::{Node, Tree};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::fixed::SCALE;

    #[test]
    fn test_two_tree_model_inference() {
        let tree1 = Tree::new(
            vec![
                Node::internal(0, 0, 50_000_000, 1, 2),
                Node::leaf(1, 100_000_000),
                Node::leaf(2, 200_000_000),
            ],
            1_000_000,
        );

        let tree2 = Tree::new(
            vec![
                Node::internal(0, 1, 30_000_000, 1, 2),
                Node::leaf(1, -50_000_000),
                Node::leaf(2, 50_000_000),
            ],
            1_000_000,
        );

        let model = Model::new(vec![tree1, tree2], 0);

        // Both trees go left: 100M - 50M = 50M
        assert_eq!(model.score(&[30_000_000, 20_000_000]), 50_000_000);

        // Both trees go right: 200M + 50M = 250M
        assert_eq!(model.score(&[60_000_000, 40_000_000]), 250_000_000);
    }

    #[test]
    fn test_canonical_json_roundtrip() {
        let tree = Tree::new(
            vec![
                Node::internal(0, 0, 50 * SCALE, 1, 2),
                Node::leaf(1, 100 * SCALE),
                Node::leaf(2, 200 * SCALE),
            ],
            SCALE,
        );

        let original = Model::new(vec![tree], 12345);

        let json = original.to_canonical_json().unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
        assert_eq!(original.hash_hex().unwrap(), restored.hash_hex().unwrap());

        let features = vec![30 * SCALE];
        assert_eq!(original.score(&features), restored.score(&features));
    }

    #[test]
    fn test_deterministic_inference_repeated() {
        let tree = Tree::new(
            vec![
                Node::internal(0, 0, 50 * SCALE, 1, 2),
                Node::leaf(1, 100 * SCALE),
                Node::leaf(2, 200 * SCALE),
            ],
            SCALE,
        );

        let model = Model::new(vec![tree], 0);
        let features = vec![30 * SCALE, 40 * SCALE, 50 * SCALE];

        let first = model.score(&features);
        for _ in 0..100 {
            assert_eq!(model.score(&features), first);
        }
    }
}
