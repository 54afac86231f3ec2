//! Claim severity trainer CLI.
//!
//! Deterministic offline trainer producing the model artifact consumed
//! by the prediction service.

use anyhow::{Context, Result};
use clap::Parser;
use claimsev_core::{ModelArtifact, ARTIFACT_DIR, ARTIFACT_FILE_NAME, ARTIFACT_HASH_FILE_NAME};
use claimsev_trainer::{Dataset, GbdtTrainer, TrainingParams};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "claimsev-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic GBDT trainer for claim severity prediction", long_about = None)]
struct Args {
    /// Input CSV dataset path
    #[arg(short, long, default_value = "allstate-claims-severity/train.csv")]
    input: PathBuf,

    /// Output directory for the artifact and its hash
    #[arg(short, long, default_value = ARTIFACT_DIR)]
    output: PathBuf,

    /// Number of boosting trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum leaf nodes per tree
    #[arg(long, default_value = "63")]
    max_leaf_nodes: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "50")]
    min_samples_leaf: usize,

    /// Learning rate (fixed-point micros, 100000 = 0.1)
    #[arg(long, default_value = "100000")]
    learning_rate: i64,

    /// Quantization step for split thresholds
    #[arg(long, default_value = "1000")]
    quant_step: i64,

    /// Random seed for deterministic row shuffling
    #[arg(long, default_value = "42")]
    seed: i64,

    /// Skip dataset shuffling
    #[arg(long)]
    no_shuffle: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Claim severity trainer v{}", env!("CARGO_PKG_VERSION"));

    info!("Loading dataset from: {}", args.input.display());
    let mut dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;

    info!(
        "Loaded {} samples ({} categorical + {} continuous columns)",
        dataset.len(),
        dataset.schema.categorical.len(),
        dataset.schema.continuous.len()
    );

    if !args.no_shuffle {
        info!("Shuffling dataset with seed: {}", args.seed);
        dataset.shuffle(args.seed);
    }

    let params = TrainingParams {
        num_trees: args.trees,
        max_leaf_nodes: args.max_leaf_nodes,
        min_samples_leaf: args.min_samples_leaf,
        learning_rate: args.learning_rate,
        quant_step: args.quant_step,
        seed: args.seed,
    };

    info!("Training configuration:");
    info!("  Trees: {}", params.num_trees);
    info!("  Max leaf nodes: {}", params.max_leaf_nodes);
    info!("  Min samples per leaf: {}", params.min_samples_leaf);
    info!("  Learning rate: {} (fixed-point)", params.learning_rate);
    info!("  Quantization step: {}", params.quant_step);

    info!("Starting training...");
    let trainer = GbdtTrainer::new(params);
    let model = trainer.train(&dataset)?;

    info!("Training complete!");
    info!("  Bias: {}", model.bias);
    info!("  Trees: {}", model.trees.len());

    let artifact = ModelArtifact::new(dataset.schema.clone(), dataset.encoder.clone(), model);

    // Write only after a successful fit, overwriting any previous artifact
    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let canonical_json = artifact
        .to_canonical_json()
        .context("Failed to serialize artifact")?;

    let artifact_path = args.output.join(ARTIFACT_FILE_NAME);
    info!("Saving artifact to: {}", artifact_path.display());
    std::fs::write(&artifact_path, &canonical_json).context("Failed to write artifact file")?;

    let hash = blake3::hash(canonical_json.as_bytes());
    let hash_hex = hex::encode(hash.as_bytes());

    let hash_path = args.output.join(ARTIFACT_HASH_FILE_NAME);
    std::fs::write(&hash_path, &hash_hex).context("Failed to write hash file")?;

    info!("✓ Training completed successfully");
    info!("  Artifact: {}", artifact_path.display());
    info!("  Hash: {} ({})", hash_path.display(), hash_hex);

    Ok(())
}
