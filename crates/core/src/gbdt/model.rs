//! GBDT ensemble with deterministic inference.
//!
//! Fixed-point-only regression model with canonical JSON serialization
//! and Blake3 hashing. Scores are log-severity values in micro units.

use super::tree::Tree;
use crate::fixed::SCALE;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// GBDT model errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    CanonicalError(#[from] CanonicalError),
}

/// GBDT regression model with integer-only representation.
///
/// All values are fixed-point integers scaled by `scale` (micro units).
/// Serialization uses canonical JSON with sorted keys so the model hash
/// is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version (always 1 for now)
    pub version: i32,

    /// Fixed-point scale factor (1_000_000 for micro precision)
    pub scale: i64,

    /// Regression trees in boosting order
    pub trees: Vec<Tree>,

    /// Bias term: the mean log-severity of the training targets (micros)
    pub bias: i64,
}

impl Model {
    /// Create a new model at micro scale.
    pub fn new(trees: Vec<Tree>, bias: i64) -> Self {
        Self {
            version: 1,
            scale: SCALE,
            trees,
            bias,
        }
    }

    /// Validate model structure.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != 1 {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid scale: {}",
                self.scale
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Perform deterministic inference on an encoded feature vector.
    ///
    /// Returns the predicted log-severity in micro units:
    /// `bias + sum(leaf * tree_weight / scale)`.
    pub fn score(&self, features: &[i64]) -> i64 {
        let mut sum = self.bias;

        for tree in &self.trees {
            let leaf_value = tree.evaluate(features);

            let weighted = leaf_value.checked_mul(tree.weight).unwrap_or(0);
            let contribution = weighted / self.scale;
            sum = sum.saturating_add(contribution);
        }

        sum
    }

    /// Serialize to canonical JSON (sorted keys, no whitespace).
    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute the model hash as a hex string.
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save the model to a JSON file with canonical serialization.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let json = self.to_canonical_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    /// Number of trees in the ensemble.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}
