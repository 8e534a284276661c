// ============================================================
// Layer 4 - Categorical Encoder (one-hot, first level dropped)
// ============================================================
// Learns, per categorical column, the sorted set of distinct
// values seen at training time. The first (smallest) value is
// the reference level and gets no output column; every other
// value gets one, named "<column>_<value>".
//
// Example: crop_type ∈ {maize, rice, wheat}
//   outputs:  crop_type_rice, crop_type_wheat
//   maize  →  [0, 0]     (reference)
//   rice   →  [1, 0]
//   wheat  →  [0, 1]
//   sorghum → [0, 0]     (never seen: no signal, no error)
//
// An unseen or absent value produces the same all-zero block
// as the reference level. That ambiguity is part of the model
// contract and is kept as is.
//
// The encoder is built by `fit` and is read-only afterwards.

use std::collections::HashSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::{AgriError, FeatureRow};

/// Learned layout of a single categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub column: String,
    /// All distinct values seen in training, sorted. Index 0 is dropped.
    pub categories: Vec<String>,
}

impl EncodedColumn {
    pub fn reference(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    fn levels(&self) -> &[String] {
        self.categories.get(1..).unwrap_or_default()
    }

    /// Output column names, one per non-reference category.
    pub fn output_names(&self) -> impl Iterator<Item = String> + '_ {
        self.levels()
            .iter()
            .map(move |c| format!("{}_{}", self.column, c))
    }

    pub fn width(&self) -> usize {
        self.levels().len()
    }

    /// Offset inside this column's block, or None for reference/unseen.
    fn slot(&self, value: &str) -> Option<usize> {
        self.levels().binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// A fitted layout has at least one level and strictly ascending levels.
    fn check(&self) -> Result<(), AgriError> {
        if self.categories.is_empty() {
            return Err(AgriError::InconsistentBundle(format!(
                "encoder column '{}' has no categories",
                self.column
            )));
        }
        if self.categories.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AgriError::InconsistentBundle(format!(
                "encoder column '{}' categories are not sorted and unique",
                self.column
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    columns: Vec<EncodedColumn>,
}

impl CategoricalEncoder {
    /// Learn categories for `columns` from the training rows.
    ///
    /// Missing cells are skipped. A column with no text value at all is
    /// rejected since it cannot define a reference level.
    pub fn fit(rows: &[FeatureRow], columns: &[String]) -> Result<Self, AgriError> {
        let mut encoded = Vec::with_capacity(columns.len());
        for column in columns {
            let mut categories: Vec<String> = rows
                .iter()
                .filter_map(|r| r.category(column))
                .map(str::to_string)
                .collect();
            categories.sort();
            categories.dedup();

            if categories.is_empty() {
                return Err(AgriError::InvalidInput(format!(
                    "categorical column '{column}' has no values to encode"
                )));
            }
            tracing::debug!(
                "Encoder: '{}' has {} levels, reference '{}'",
                column,
                categories.len(),
                categories[0]
            );
            encoded.push(EncodedColumn { column: column.clone(), categories });
        }
        Ok(Self { columns: encoded })
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    /// Reject a deserialized layout `fit` could not have produced.
    pub fn check(&self) -> Result<(), AgriError> {
        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.column.as_str()) {
                return Err(AgriError::InconsistentBundle(format!(
                    "encoder lists column '{}' twice",
                    col.column
                )));
            }
            col.check()?;
        }
        Ok(())
    }

    /// Every output column, grouped by source column in fit order.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns.iter().flat_map(EncodedColumn::output_names).collect()
    }

    pub fn n_outputs(&self) -> usize {
        self.columns.iter().map(EncodedColumn::width).sum()
    }

    /// One-hot encode rows into an `(rows.len(), n_outputs)` matrix.
    ///
    /// Unseen, absent and non-text values all give an all-zero block.
    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((rows.len(), self.n_outputs()));
        let mut unseen = 0usize;

        for (i, row) in rows.iter().enumerate() {
            let mut offset = 0;
            for col in &self.columns {
                match row.category(&col.column) {
                    Some(value) => match col.slot(value) {
                        Some(slot) => out[[i, offset + slot]] = 1.0,
                        None if Some(value) != col.reference() => unseen += 1,
                        None => {}
                    },
                    None if row.contains(&col.column) => unseen += 1,
                    None => {}
                }
                offset += col.width();
            }
        }

        if unseen > 0 {
            tracing::warn!("Encoder: {} unseen categorical value(s) encoded as zeros", unseen);
        }
        out
    }
}
