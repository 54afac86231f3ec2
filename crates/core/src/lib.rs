//! Shared core for the claim severity pipeline.
//!
//! Provides the deterministic model representation and the pieces both
//! the trainer and the prediction service depend on:
//!
//! - `fixed`: micro-precision fixed-point conversions and the
//!   `log1p`/`expm1` target transform
//! - `gbdt`: integer-only regression tree ensemble
//! - `schema`: `cat*`/`cont*` column classification from CSV headers
//! - `encoder`: ordinal encoding with an unseen-value sentinel
//! - `artifact`: the persisted fitted pipeline (schema + encoder + model)
//! - `serde_canon`: canonical JSON and Blake3 hashing

pub mod artifact;
pub mod encoder;
pub mod fixed;
pub mod gbdt;
pub mod schema;
pub mod serde_canon;

pub use artifact::{
    default_artifact_path, ArtifactError, EncodeError, FeatureValue, ModelArtifact,
    ARTIFACT_DIR, ARTIFACT_FILE_NAME, ARTIFACT_HASH_FILE_NAME,
};
pub use encoder::OrdinalEncoder;
pub use gbdt::{Model, ModelError, Node, Tree};
pub use schema::{FeatureSchema, UNSEEN_CATEGORY_CODE};

/// Crate version string for logs and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
