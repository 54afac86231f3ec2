//! Deterministic offline GBDT trainer for claim severity.
//!
//! Loads the claims CSV, log-transforms the target, fits the ordinal
//! encoder, and boosts regression trees with exact-greedy CART splits,
//! producing a reproducible model artifact.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod trainer;

use claimsev_core::ModelArtifact;
use std::path::Path;

pub use dataset::Dataset;
pub use deterministic::{xxhash64_i64, SplitTieBreaker};
pub use errors::TrainerError;
pub use trainer::{GbdtTrainer, TrainingParams};

/// Train a fitted artifact directly from a CSV file.
pub fn train_artifact_from_csv(
    path: &Path,
    params: TrainingParams,
) -> Result<ModelArtifact, TrainerError> {
    let dataset = Dataset::from_csv(path).map_err(|err| TrainerError::Dataset(err.to_string()))?;
    let trainer = GbdtTrainer::new(params);
    let model = trainer
        .train(&dataset)
        .map_err(|err| TrainerError::Training(err.to_string()))?;
    Ok(ModelArtifact::new(dataset.schema, dataset.encoder, model))
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
