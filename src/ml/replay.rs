// ============================================================
// Layer 5 - Pipeline Replay
// ============================================================
// The one routine that turns raw feature rows into the matrix
// a trained model reads. Training builds its design matrix
// with it, and prediction, optimization and explanation all
// go through it, so the layout can never drift between them.
//
//   raw rows
//       │  encoder.transform        (read-only, learned levels)
//       ▼
//   one-hot block + numeric cells
//       │  reindex to feature_order (absent → 0.0, extra dropped)
//       ▼
//   unscaled matrix
//       │  scaler.transform         (read-only, learned stats)
//       ▼
//   model input, width == feature_order.len()
//
// Replay holds no mutable state: the same rows always give a
// bit-identical matrix.

use std::collections::HashMap;

use ndarray::Array2;

use crate::data::encoder::CategoricalEncoder;
use crate::data::scaler::FeatureScaler;
use crate::domain::{AgriError, FeatureRow, FeatureValue};
use crate::ml::bundle::{ArtifactBundle, FeatureOrder};

/// Where a feature-order column gets its value from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Encoded(usize),
    Numeric,
}

pub struct PipelineReplay<'a> {
    feature_order: &'a FeatureOrder,
    encoder: &'a CategoricalEncoder,
    scaler: &'a FeatureScaler,
    sources: Vec<Source>,
}

impl<'a> PipelineReplay<'a> {
    pub fn new<M>(bundle: &'a ArtifactBundle<M>) -> Self {
        Self::from_parts(&bundle.feature_order, &bundle.encoder, &bundle.scaler)
    }

    pub fn from_parts(
        feature_order: &'a FeatureOrder,
        encoder: &'a CategoricalEncoder,
        scaler: &'a FeatureScaler,
    ) -> Self {
        let encoded: HashMap<String, usize> = encoder
            .output_columns()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        let sources = feature_order
            .columns()
            .iter()
            .map(|c| encoded.get(c).map_or(Source::Numeric, |&i| Source::Encoded(i)))
            .collect();
        Self { feature_order, encoder, scaler, sources }
    }

    pub fn width(&self) -> usize {
        self.feature_order.len()
    }

    /// Required numeric columns: every feature that is not a one-hot output.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.feature_order
            .columns()
            .iter()
            .zip(&self.sources)
            .filter(|(_, s)| matches!(s, Source::Numeric))
            .map(|(c, _)| c.as_str())
    }

    /// Reject a row that lacks a required numeric feature.
    ///
    /// Categorical features may be absent; they replay as an all-zero block.
    pub fn validate_row(&self, row: &FeatureRow) -> Result<(), AgriError> {
        for column in self.numeric_columns() {
            match row.get(column) {
                Some(FeatureValue::Numeric(v)) if v.is_finite() => {}
                Some(FeatureValue::Numeric(v)) => {
                    return Err(AgriError::InvalidInput(format!(
                        "feature '{column}' is not finite ({v})"
                    )))
                }
                Some(FeatureValue::Categorical(s)) => {
                    return Err(AgriError::InvalidInput(format!(
                        "feature '{column}' must be numeric, got '{s}'"
                    )))
                }
                None => {
                    return Err(AgriError::InvalidInput(format!(
                        "required feature '{column}' is missing"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Encode and reindex to the feature order, without scaling.
    pub fn unscaled(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let encoded = self.encoder.transform(rows);
        let mut out = Array2::<f64>::zeros((rows.len(), self.width()));

        for (i, row) in rows.iter().enumerate() {
            for (j, (column, source)) in
                self.feature_order.columns().iter().zip(&self.sources).enumerate()
            {
                out[[i, j]] = match source {
                    Source::Encoded(k) => encoded[[i, *k]],
                    Source::Numeric => row.numeric(column).unwrap_or(0.0),
                };
            }
        }
        out
    }

    /// Full replay: encode, reindex, scale.
    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Array2<f64>, AgriError> {
        self.scaler.transform(&self.unscaled(rows))
    }
}
