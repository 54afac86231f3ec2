//! Gradient boosted regression trainer.
//!
//! Deterministic GBDT over squared-error loss with fixed-point
//! arithmetic. The learning rate is stored as each tree's weight, so the
//! update applied during training is exactly the accumulation the model
//! performs at serving time.

use anyhow::Result;
use claimsev_core::fixed::SCALE;
use claimsev_core::gbdt::{Model, Tree};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;

/// Per-sample hessian for squared-error loss, scaled to keep precision
/// in the -G/H leaf values.
pub const HESSIAN_UNIT: i64 = 1000;

/// GBDT training configuration.
#[derive(Clone, Debug)]
pub struct TrainingParams {
    pub num_trees: usize,
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: i64, // Fixed-point micros, 100_000 = 0.1
    pub quant_step: i64,
    pub seed: i64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_leaf_nodes: 63,
            min_samples_leaf: 50,
            learning_rate: 100_000, // 0.1
            quant_step: 1000,
            seed: 42,
        }
    }
}

/// GBDT trainer.
pub struct GbdtTrainer {
    params: TrainingParams,
}

impl GbdtTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    /// Train a model on the full dataset (no train/validation split).
    pub fn train(&self, dataset: &Dataset) -> Result<Model> {
        if dataset.is_empty() {
            anyhow::bail!("cannot train on an empty dataset");
        }

        let n_samples = dataset.len();

        let bias = Self::calculate_bias(&dataset.targets);
        let mut predictions = vec![bias; n_samples];

        let mut trees = Vec::with_capacity(self.params.num_trees);

        for tree_idx in 0..self.params.num_trees {
            let (gradients, hessians) =
                self.calculate_gradients_hessians(&dataset.targets, &predictions);

            let tree_config = TreeConfig {
                max_leaf_nodes: self.params.max_leaf_nodes,
                min_samples_leaf: self.params.min_samples_leaf,
                quant_step: self.params.quant_step,
            };

            let builder =
                CartBuilder::new(&dataset.features, &gradients, &hessians, tree_config);
            let tree = Tree::new(builder.build(), self.params.learning_rate);

            tracing::debug!(
                "Tree {}/{} grown with {} leaves",
                tree_idx + 1,
                self.params.num_trees,
                tree.leaf_count()
            );

            self.update_predictions(&tree, &dataset.features, &mut predictions);

            trees.push(tree);
        }

        Ok(Model::new(trees, bias))
    }

    /// Initial bias: mean of the log-space targets.
    fn calculate_bias(targets: &[i64]) -> i64 {
        if targets.is_empty() {
            return 0;
        }

        let sum: i128 = targets.iter().map(|&t| t as i128).sum();
        (sum / targets.len() as i128) as i64
    }

    /// Gradients and hessians for squared-error loss:
    /// gradient = prediction - target, hessian constant.
    fn calculate_gradients_hessians(
        &self,
        targets: &[i64],
        predictions: &[i64],
    ) -> (Vec<i64>, Vec<i64>) {
        let n = targets.len();
        let mut gradients = Vec::with_capacity(n);
        let mut hessians = Vec::with_capacity(n);

        for i in 0..n {
            gradients.push(predictions[i].saturating_sub(targets[i]));
            hessians.push(HESSIAN_UNIT);
        }

        (gradients, hessians)
    }

    /// Apply one tree's contribution, mirroring `Model::score` exactly.
    fn update_predictions(&self, tree: &Tree, features: &[Vec<i64>], predictions: &mut [i64]) {
        for (prediction, feature_vec) in predictions.iter_mut().zip(features) {
            let leaf_value = tree.evaluate(feature_vec);
            let weighted = leaf_value.checked_mul(tree.weight).unwrap_or(0);
            *prediction = prediction.saturating_add(weighted / SCALE);
        }
    }
}
