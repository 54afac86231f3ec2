//! CART regression tree builder.
//!
//! Deterministic exact-greedy construction with fixed-point arithmetic
//! only. Trees grow best-first under a leaf budget: the open leaf whose
//! best split has the highest gain is split next, until `max_leaf_nodes`
//! is reached or no remaining split has positive gain. There is no depth
//! limit.

use claimsev_core::gbdt::Node;
use std::collections::BTreeMap;

use crate::deterministic::SplitTieBreaker;

/// Training parameters for a single tree.
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
    pub quant_step: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_nodes: 63,
            min_samples_leaf: 50,
            quant_step: 1000,
        }
    }
}

/// Split candidate with gain and tie-breaker.
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: i64, gain: i64, node_slot: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold, node_slot),
        }
    }
}

/// A not-yet-split leaf in the growing tree.
struct OpenLeaf {
    slot: usize,
    indices: Vec<usize>,
    split: Option<SplitCandidate>,
}

/// Builds one regression tree from gradients and hessians.
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    gradients: &'a [i64],
    hessians: &'a [i64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<i64>],
        gradients: &'a [i64],
        hessians: &'a [i64],
        config: TreeConfig,
    ) -> Self {
        assert_eq!(features.len(), gradients.len());
        assert_eq!(features.len(), hessians.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    /// Grow the tree and return its node vector (root at index 0).
    pub fn build(&self) -> Vec<Node> {
        let all_indices: Vec<usize> = (0..self.features.len()).collect();

        let mut nodes = vec![Node::leaf(0, self.calculate_leaf_value(&all_indices))];
        let root_split = self.find_best_split(&all_indices, 0);
        let mut open = vec![OpenLeaf {
            slot: 0,
            indices: all_indices,
            split: root_split,
        }];
        let mut leaf_count = 1usize;

        while leaf_count < self.config.max_leaf_nodes {
            // Pick the open leaf with the best positive-gain split
            let mut best: Option<(usize, i64, SplitTieBreaker)> = None;
            for (pos, leaf) in open.iter().enumerate() {
                let Some(split) = &leaf.split else { continue };
                if split.gain <= 0 {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((_, gain, tie)) => {
                        split.gain > *gain || (split.gain == *gain && split.tie_breaker < *tie)
                    }
                };
                if better {
                    best = Some((pos, split.gain, split.tie_breaker));
                }
            }

            let Some((pos, _, _)) = best else { break };
            let leaf = open.swap_remove(pos);
            let Some(split) = leaf.split else { break };

            let (left_indices, right_indices) =
                self.split_samples(&leaf.indices, split.feature_idx, split.threshold);

            let left_slot = nodes.len();
            let right_slot = left_slot + 1;
            nodes.push(Node::leaf(
                left_slot as i32,
                self.calculate_leaf_value(&left_indices),
            ));
            nodes.push(Node::leaf(
                right_slot as i32,
                self.calculate_leaf_value(&right_indices),
            ));
            nodes[leaf.slot] = Node::internal(
                leaf.slot as i32,
                split.feature_idx as i32,
                split.threshold,
                left_slot as i32,
                right_slot as i32,
            );

            let left_split = self.find_best_split(&left_indices, left_slot);
            open.push(OpenLeaf {
                slot: left_slot,
                indices: left_indices,
                split: left_split,
            });
            let right_split = self.find_best_split(&right_indices, right_slot);
            open.push(OpenLeaf {
                slot: right_slot,
                indices: right_indices,
                split: right_split,
            });

            leaf_count += 1;
        }

        nodes
    }

    /// Find the best split for one leaf using exact-greedy search.
    fn find_best_split(&self, indices: &[usize], node_slot: usize) -> Option<SplitCandidate> {
        if indices.len() < 2 * self.config.min_samples_leaf {
            return None;
        }

        let mut best_split: Option<SplitCandidate> = None;

        for feature_idx in 0..self.feature_count {
            let thresholds = self.get_quantized_thresholds(indices, feature_idx);

            for threshold in thresholds {
                let (left_indices, right_indices) =
                    self.split_samples(indices, feature_idx, threshold);

                if left_indices.len() < self.config.min_samples_leaf
                    || right_indices.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let gain = self.calculate_split_gain(&left_indices, &right_indices, indices);

                let candidate = SplitCandidate::new(feature_idx, threshold, gain, node_slot);

                best_split = match best_split {
                    None => Some(candidate),
                    Some(current) => {
                        // Deterministic tie-breaking
                        if gain > current.gain
                            || (gain == current.gain
                                && candidate.tie_breaker < current.tie_breaker)
                        {
                            Some(candidate)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
        }

        best_split
    }

    /// Get quantized threshold values for a feature.
    fn get_quantized_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<i64> {
        let mut values = BTreeMap::new();

        for &idx in indices {
            let val = self.features[idx][feature_idx];
            let quantized = (val / self.config.quant_step) * self.config.quant_step;
            values.insert(quantized, ());
        }

        values.into_keys().collect()
    }

    /// Partition samples on a threshold.
    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: i64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();

        for &idx in indices {
            if self.features[idx][feature_idx] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }

        (left, right)
    }

    /// Split gain in fixed-point arithmetic:
    /// G_left²/H_left + G_right²/H_right - G_parent²/H_parent
    fn calculate_split_gain(&self, left: &[usize], right: &[usize], parent: &[usize]) -> i64 {
        let (g_left, h_left) = self.sum_gradients_hessians(left);
        let (g_right, h_right) = self.sum_gradients_hessians(right);
        let (g_parent, h_parent) = self.sum_gradients_hessians(parent);

        let gain_term = |g: i64, h: i64| -> i64 {
            if h > 0 {
                ((g as i128 * g as i128) / h as i128) as i64
            } else {
                0
            }
        };

        gain_term(g_left, h_left)
            .saturating_add(gain_term(g_right, h_right))
            .saturating_sub(gain_term(g_parent, h_parent))
    }

    /// Sum gradients and hessians for a set of samples.
    fn sum_gradients_hessians(&self, indices: &[usize]) -> (i64, i64) {
        let mut sum_g = 0i64;
        let mut sum_h = 0i64;

        for &idx in indices {
            sum_g = sum_g.saturating_add(self.gradients[idx]);
            sum_h = sum_h.saturating_add(self.hessians[idx]);
        }

        (sum_g, sum_h)
    }

    /// Optimal leaf value: -G/H, scaled to keep micro precision.
    fn calculate_leaf_value(&self, indices: &[usize]) -> i64 {
        let (sum_g, sum_h) = self.sum_gradients_hessians(indices);

        if sum_h == 0 {
            return 0;
        }

        -((sum_g as i128 * crate::trainer::HESSIAN_UNIT as i128) / sum_h as i128) as i64
    }
}
