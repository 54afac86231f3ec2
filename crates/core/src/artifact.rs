//! Fitted-pipeline artifact: schema + encoder + model in one document.
//!
//! The trainer writes the artifact once (canonical JSON plus a Blake3
//! hash sidecar); the prediction service loads it once at startup and
//! never mutates it. Request rows are encoded by column *name*, so the
//! key order of an incoming feature map is irrelevant.

use crate::encoder::OrdinalEncoder;
use crate::fixed::{micros_from_code, micros_from_f64};
use crate::gbdt::{Model, ModelError};
use crate::schema::{FeatureSchema, UNSEEN_CATEGORY_CODE};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory the trainer writes into by default.
pub const ARTIFACT_DIR: &str = "artifacts";

/// Artifact file name.
pub const ARTIFACT_FILE_NAME: &str = "claim_severity_model.json";

/// Hash sidecar file name.
pub const ARTIFACT_HASH_FILE_NAME: &str = "claim_severity_model.hash";

/// Default artifact path relative to the working directory.
pub fn default_artifact_path() -> PathBuf {
    Path::new(ARTIFACT_DIR).join(ARTIFACT_FILE_NAME)
}

/// Artifact lifecycle errors.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error(
        "model artifact not found at {path}; run the trainer (`claimsev-train`) to create it"
    )]
    Missing { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("Artifact validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Request-row encoding errors.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("missing feature column `{0}`")]
    MissingColumn(String),

    #[error("non-numeric value for continuous column `{0}`")]
    NonNumeric(String),
}

/// A single feature value from a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

/// The persisted fitted pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    /// Feature columns, in encoded-matrix order
    pub schema: FeatureSchema,

    /// Fitted ordinal vocabularies for the categorical block
    pub encoder: OrdinalEncoder,

    /// The regression ensemble
    pub model: Model,
}

impl ModelArtifact {
    pub fn new(schema: FeatureSchema, encoder: OrdinalEncoder, model: Model) -> Self {
        Self {
            schema,
            encoder,
            model,
        }
    }

    /// Validate the artifact: model structure plus encoder coverage of
    /// every categorical column.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.model.validate()?;

        for column in &self.schema.categorical {
            if !self.encoder.has_column(column) {
                return Err(ArtifactError::Validation(format!(
                    "no fitted vocabulary for categorical column `{column}`"
                )));
            }
        }

        Ok(())
    }

    /// Encode one request row into the model's feature order.
    ///
    /// Lookups are by column name; keys that match no schema column are
    /// ignored. Unseen categorical values (and JSON numbers sent for a
    /// categorical column, which can never match the string vocabulary)
    /// encode to the sentinel code. A missing schema column or a string
    /// in a continuous column is an error.
    pub fn encode_row(
        &self,
        features: &HashMap<String, FeatureValue>,
    ) -> Result<Vec<i64>, EncodeError> {
        let mut encoded = Vec::with_capacity(self.schema.feature_count());

        for column in &self.schema.categorical {
            let value = features
                .get(column)
                .ok_or_else(|| EncodeError::MissingColumn(column.clone()))?;

            let code = match value {
                FeatureValue::Text(text) => self.encoder.encode(column, text),
                FeatureValue::Number(_) => UNSEEN_CATEGORY_CODE,
            };
            encoded.push(micros_from_code(code));
        }

        for column in &self.schema.continuous {
            let value = features
                .get(column)
                .ok_or_else(|| EncodeError::MissingColumn(column.clone()))?;

            match value {
                FeatureValue::Number(number) => encoded.push(micros_from_f64(*number)),
                FeatureValue::Text(_) => return Err(EncodeError::NonNumeric(column.clone())),
            }
        }

        Ok(encoded)
    }

    /// Encode a row and score it, returning log-severity micros.
    pub fn predict_log_micros(
        &self,
        features: &HashMap<String, FeatureValue>,
    ) -> Result<i64, EncodeError> {
        let encoded = self.encode_row(features)?;
        Ok(self.model.score(&encoded))
    }

    /// Serialize to canonical JSON (sorted keys, no whitespace).
    pub fn to_canonical_json(&self) -> Result<String, ArtifactError> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute the artifact hash as a hex string.
    pub fn hash_hex(&self) -> Result<String, ArtifactError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save the artifact with canonical serialization, overwriting any
    /// previous artifact at the path.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let json = self.to_canonical_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate an artifact from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let json = fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load an artifact that must already exist.
    ///
    /// Distinguishes the absent-file case so callers can surface the
    /// expected path and the remedy before refusing to start.
    pub fn load_required<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            });
        }
        Self::load_json(path)
    }
}
