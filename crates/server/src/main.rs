//! Claim severity prediction service CLI.
//!
//! Loads the trained artifact exactly once and serves predictions until
//! shutdown. Refuses to start when the artifact is absent.

use anyhow::{Context, Result};
use clap::Parser;
use claimsev_core::{default_artifact_path, ModelArtifact};
use claimsev_server::server::{start_server, AppState};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "claimsev-serve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP prediction service for the claim severity model", long_about = None)]
struct Args {
    /// Path to the trained model artifact
    #[arg(long, default_value_os_t = default_artifact_path())]
    artifact: PathBuf,

    /// Bind address for the HTTP API
    #[arg(long, default_value = "0.0.0.0:8000")]
    addr: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
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

    info!("Claim severity prediction service v{}", env!("CARGO_PKG_VERSION"));

    let artifact =
        ModelArtifact::load_required(&args.artifact).context("Failed to load model artifact")?;

    info!("Loaded artifact from: {}", args.artifact.display());
    info!(
        "  Features: {} categorical + {} continuous",
        artifact.schema.categorical.len(),
        artifact.schema.continuous.len()
    );
    info!("  Trees: {}", artifact.model.num_trees());
    info!(
        "  Hash: {}",
        artifact.hash_hex().context("Failed to hash artifact")?
    );

    let state = AppState::new(artifact);

    info!("Listening on {}", args.addr);
    start_server(state, &args.addr).await
}
