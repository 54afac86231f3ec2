//! Ordinal encoding of categorical feature values.
//!
//! Each categorical column gets its own vocabulary mapping distinct
//! string values to integer codes, assigned in lexicographic order so the
//! fitted encoder is deterministic. Values unseen during fitting map to
//! the fixed sentinel code, never an error.

use crate::schema::UNSEEN_CATEGORY_CODE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-column ordinal vocabularies, keyed by column name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrdinalEncoder {
    vocab: BTreeMap<String, BTreeMap<String, i64>>,
}

impl OrdinalEncoder {
    /// Fit vocabularies from the distinct values observed per column.
    ///
    /// Codes are assigned in sorted order of the values, starting at 0.
    pub fn fit(observed: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut vocab = BTreeMap::new();

        for (column, values) in observed {
            let codes: BTreeMap<String, i64> = values
                .iter()
                .enumerate()
                .map(|(code, value)| (value.clone(), code as i64))
                .collect();
            vocab.insert(column.clone(), codes);
        }

        Self { vocab }
    }

    /// Encode one categorical value by column name.
    ///
    /// Unknown columns and unseen values both yield the sentinel code.
    pub fn encode(&self, column: &str, value: &str) -> i64 {
        self.vocab
            .get(column)
            .and_then(|codes| codes.get(value))
            .copied()
            .unwrap_or(UNSEEN_CATEGORY_CODE)
    }

    /// Whether a vocabulary exists for the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.vocab.contains_key(column)
    }

    /// Number of distinct values fitted for a column, if known.
    pub fn cardinality(&self, column: &str) -> Option<usize> {
        self.vocab.get(column).map(BTreeMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit_single(column: &str, values: &[&str]) -> OrdinalEncoder {
        let mut observed = BTreeMap::new();
        observed.insert(
            column.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        OrdinalEncoder::fit(&observed)
    }

    #[test]
    fn test_codes_assigned_in_sorted_order() {
        let encoder = fit_single("cat1", &["B", "A", "C"]);

        assert_eq!(encoder.encode("cat1", "A"), 0);
        assert_eq!(encoder.encode("cat1", "B"), 1);
        assert_eq!(encoder.encode("cat1", "C"), 2);
    }

    #[test]
    fn test_unseen_value_maps_to_sentinel() {
        let encoder = fit_single("cat1", &["A", "B"]);
        assert_eq!(encoder.encode("cat1", "ZZZ"), UNSEEN_CATEGORY_CODE);
    }

    #[test]
    fn test_unknown_column_maps_to_sentinel() {
        let encoder = fit_single("cat1", &["A"]);
        assert_eq!(encoder.encode("cat99", "A"), UNSEEN_CATEGORY_CODE);
        assert!(!encoder.has_column("cat99"));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let encoder1 = fit_single("cat1", &["D", "B", "A", "C"]);
        let encoder2 = fit_single("cat1", &["A", "C", "D", "B"]);
        assert_eq!(encoder1, encoder2);
    }

    #[test]
    fn test_cardinality() {
        let encoder = fit_single("cat1", &["A", "B", "C"]);
        assert_eq!(encoder.cardinality("cat1"), Some(3));
        assert_eq!(encoder.cardinality("cat2"), None);
    }
}
