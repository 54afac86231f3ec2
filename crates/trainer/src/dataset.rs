//! CSV dataset loading and preprocessing.
//!
//! Reads the raw claims CSV (header row, `cat*` string columns, `cont*`
//! numeric columns, `id`, `loss`), log-transforms the target, fits the
//! ordinal encoder, and encodes the feature matrix into micro-scaled
//! integers. Row order can be shuffled deterministically by seed.

use anyhow::{Context, Result};
use claimsev_core::encoder::OrdinalEncoder;
use claimsev_core::fixed::{log_micros_from_loss, micros_from_code, micros_from_f64};
use claimsev_core::schema::{FeatureSchema, TARGET_COLUMN};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::deterministic::xxhash64_i64;

/// Training dataset with encoded features and log-space targets.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub encoder: OrdinalEncoder,
    pub features: Vec<Vec<i64>>,
    pub targets: Vec<i64>,
}

impl Dataset {
    /// Load and encode a dataset from a CSV file.
    ///
    /// Columns are classified by the `cat`/`cont` name prefixes; `id` is
    /// dropped; `loss` is required and must parse as a non-negative
    /// number. Any malformed row fails the load.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let schema = FeatureSchema::from_headers(&headers);
        if schema.is_empty() {
            anyhow::bail!("Dataset header has no cat*/cont* feature columns");
        }

        let target_idx = headers
            .iter()
            .position(|h| h == TARGET_COLUMN)
            .with_context(|| format!("Dataset has no `{TARGET_COLUMN}` column"))?;

        let column_index = |name: &String| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("Header lost column `{name}`"))
        };
        let cat_indices: Vec<usize> = schema
            .categorical
            .iter()
            .map(column_index)
            .collect::<Result<_>>()?;
        let cont_indices: Vec<usize> = schema
            .continuous
            .iter()
            .map(column_index)
            .collect::<Result<_>>()?;

        // First pass over rows: raw categorical strings, encoded
        // continuous values, log-space targets, and per-column value sets
        // for the encoder fit.
        let mut raw_categorical: Vec<Vec<String>> = Vec::new();
        let mut continuous_rows: Vec<Vec<i64>> = Vec::new();
        let mut targets: Vec<i64> = Vec::new();
        let mut observed: BTreeMap<String, BTreeSet<String>> = schema
            .categorical
            .iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();

        for (row_idx, record) in reader.records().enumerate() {
            let line = row_idx + 2; // header is line 1
            let record =
                record.with_context(|| format!("Line {line}: failed to parse CSV record"))?;

            let loss_field = record
                .get(target_idx)
                .with_context(|| format!("Line {line}: missing `{TARGET_COLUMN}` field"))?;
            let loss: f64 = loss_field
                .trim()
                .parse()
                .with_context(|| format!("Line {line}: invalid `{TARGET_COLUMN}` value"))?;
            if !loss.is_finite() || loss < 0.0 {
                anyhow::bail!("Line {line}: `{TARGET_COLUMN}` must be a non-negative number");
            }
            targets.push(log_micros_from_loss(loss));

            let mut cat_row = Vec::with_capacity(cat_indices.len());
            for (name, &idx) in schema.categorical.iter().zip(&cat_indices) {
                let value = record
                    .get(idx)
                    .with_context(|| format!("Line {line}: missing `{name}` field"))?
                    .trim()
                    .to_string();
                if let Some(values) = observed.get_mut(name) {
                    values.insert(value.clone());
                }
                cat_row.push(value);
            }
            raw_categorical.push(cat_row);

            let mut cont_row = Vec::with_capacity(cont_indices.len());
            for (name, &idx) in schema.continuous.iter().zip(&cont_indices) {
                let field = record
                    .get(idx)
                    .with_context(|| format!("Line {line}: missing `{name}` field"))?;
                let value: f64 = field
                    .trim()
                    .parse()
                    .with_context(|| format!("Line {line}: invalid numeric value in `{name}`"))?;
                cont_row.push(micros_from_f64(value));
            }
            continuous_rows.push(cont_row);
        }

        if targets.is_empty() {
            anyhow::bail!("Dataset is empty");
        }

        let encoder = OrdinalEncoder::fit(&observed);

        // Encoded matrix order: categorical block, then continuous block.
        let features = raw_categorical
            .into_iter()
            .zip(continuous_rows)
            .map(|(cat_row, cont_row)| {
                let mut row = Vec::with_capacity(schema.feature_count());
                for (name, value) in schema.categorical.iter().zip(&cat_row) {
                    row.push(micros_from_code(encoder.encode(name, value)));
                }
                row.extend(cont_row);
                row
            })
            .collect();

        Ok(Self {
            schema,
            encoder,
            features,
            targets,
        })
    }

    /// Deterministically shuffle row order using the seed.
    pub fn shuffle(&mut self, seed: i64) {
        let n = self.features.len();

        let mut indices: Vec<(i64, usize)> = (0..n)
            .map(|i| (xxhash64_i64(&self.features[i], seed), i))
            .collect();

        indices.sort_by_key(|&(hash, idx)| (hash, idx));

        let mut new_features = Vec::with_capacity(n);
        let mut new_targets = Vec::with_capacity(n);

        for (_, idx) in indices {
            new_features.push(self.features[idx].clone());
            new_targets.push(self.targets[idx]);
        }

        self.features = new_features;
        self.targets = new_targets;
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of encoded feature columns.
    pub fn feature_count(&self) -> usize {
        self.schema.feature_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "id,cat1,cat2,cont1,cont2,loss")?;
        writeln!(file, "1,A,X,0.5,1.0,10.0")?;
        writeln!(file, "2,B,Y,1.5,2.0,20.0")?;
        writeln!(file, "3,A,Y,2.5,3.0,30.0")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_csv() -> Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.feature_count(), 4);
        assert_eq!(dataset.schema.categorical, vec!["cat1", "cat2"]);
        assert_eq!(dataset.schema.continuous, vec!["cont1", "cont2"]);

        // Row 0: cat1=A (code 0), cat2=X (code 0), cont1=0.5, cont2=1.0
        assert_eq!(dataset.features[0], vec![0, 0, 500_000, 1_000_000]);
        // Row 1: cat1=B (code 1), cat2=Y (code 1)
        assert_eq!(dataset.features[1], vec![1_000_000, 1_000_000, 1_500_000, 2_000_000]);

        // Targets are log1p(loss) in micros
        assert_eq!(dataset.targets[0], 2_397_895);

        Ok(())
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(Dataset::from_csv("no/such/file.csv").is_err());
    }

    #[test]
    fn test_missing_target_column_fails() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "id,cat1,cont1")?;
        writeln!(file, "1,A,0.5")?;
        file.flush()?;

        assert!(Dataset::from_csv(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_malformed_loss_fails() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "id,cat1,cont1,loss")?;
        writeln!(file, "1,A,0.5,not-a-number")?;
        file.flush()?;

        assert!(Dataset::from_csv(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_negative_loss_fails() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "id,cat1,cont1,loss")?;
        writeln!(file, "1,A,0.5,-3.0")?;
        file.flush()?;

        assert!(Dataset::from_csv(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_empty_dataset_fails() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "id,cat1,cont1,loss")?;
        file.flush()?;

        assert!(Dataset::from_csv(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_shuffle_determinism() -> Result<()> {
        let file = create_test_csv()?;
        let mut ds1 = Dataset::from_csv(file.path())?;
        let mut ds2 = ds1.clone();

        ds1.shuffle(42);
        ds2.shuffle(42);

        assert_eq!(ds1.features, ds2.features);
        assert_eq!(ds1.targets, ds2.targets);

        Ok(())
    }

    #[test]
    fn test_shuffle_keeps_rows_aligned() -> Result<()> {
        let file = create_test_csv()?;
        let original = Dataset::from_csv(file.path())?;
        let mut shuffled = original.clone();
        shuffled.shuffle(7);

        for (features, target) in shuffled.features.iter().zip(&shuffled.targets) {
            let position = original
                .features
                .iter()
                .position(|row| row == features)
                .expect("shuffled row must exist in the original");
            assert_eq!(original.targets[position], *target);
        }

        Ok(())
    }
}
