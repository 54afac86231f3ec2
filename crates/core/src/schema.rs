//! Feature schema derived from dataset headers.
//!
//! Columns are classified by pure string-prefix matching: `cat*` columns
//! are categorical, `cont*` columns are continuous. There is no schema
//! file; the CSV header is the source of truth. The encoded feature
//! matrix lays out the categorical block first, then the continuous
//! block, and all lookups are by column name.

use serde::{Deserialize, Serialize};

/// Prefix identifying categorical columns.
pub const CATEGORICAL_PREFIX: &str = "cat";

/// Prefix identifying continuous columns.
pub const CONTINUOUS_PREFIX: &str = "cont";

/// Row identifier column, dropped before fitting.
pub const ID_COLUMN: &str = "id";

/// Raw target column (claim cost in original units).
pub const TARGET_COLUMN: &str = "loss";

/// Derived log-space target column name, stripped from requests.
pub const LOG_TARGET_COLUMN: &str = "log_loss";

/// Ordinal code assigned to categorical values unseen during fitting.
pub const UNSEEN_CATEGORY_CODE: i64 = -1;

/// Ordered feature columns for one fitted pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureSchema {
    /// Categorical column names, in header order
    pub categorical: Vec<String>,

    /// Continuous column names, in header order
    pub continuous: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from CSV header names.
    ///
    /// `id`, `loss`, and `log_loss` are reserved and never become
    /// features; any column matching neither prefix is ignored.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut categorical = Vec::new();
        let mut continuous = Vec::new();

        for header in headers {
            let name = header.as_ref();
            if name == ID_COLUMN || name == TARGET_COLUMN || name == LOG_TARGET_COLUMN {
                continue;
            }
            if name.starts_with(CATEGORICAL_PREFIX) {
                categorical.push(name.to_string());
            } else if name.starts_with(CONTINUOUS_PREFIX) {
                continuous.push(name.to_string());
            }
        }

        Self {
            categorical,
            continuous,
        }
    }

    /// Total number of encoded feature columns.
    pub fn feature_count(&self) -> usize {
        self.categorical.len() + self.continuous.len()
    }

    /// Feature columns in encoded-matrix order: categorical block first.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .chain(self.continuous.iter())
            .map(String::as_str)
    }

    /// Whether the schema has no feature columns at all.
    pub fn is_empty(&self) -> bool {
        self.categorical.is_empty() && self.continuous.is_empty()
    }
}
