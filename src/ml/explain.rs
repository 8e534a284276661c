// ============================================================
// Layer 5 - Explainer (per-feature contributions)
// ============================================================
// Model-agnostic attribution on the replayed design matrix.
//
// For row r and feature j:
//
//   contribution[r][j] = f(x_r) - f(x_r with feature j set to 0)
//
// In standardised space 0 is the training mean, so the value
// reads as "how much this feature moves the prediction away
// from an average field". For a linear model it is exactly
// w_j · x_rj.
//
//   summary   one entry per row: prediction + contribution map
//   bar       mean |contribution| per feature, largest first
//
// Rows go through the same replay as prediction does, with its
// zero-fill for absent columns; no row is rejected.

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::traits::RegressionModel;
use crate::domain::{AgriError, FeatureRow};
use crate::ml::bundle::ArtifactBundle;
use crate::ml::replay::PipelineReplay;

#[derive(Debug, Clone, Serialize)]
pub struct RowExplanation {
    pub prediction: f64,
    pub contributions: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub mean_abs_contribution: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub summary: Vec<RowExplanation>,
    pub bar: Vec<FeatureImportance>,
}

pub struct Explainer<'a, M> {
    bundle: &'a ArtifactBundle<M>,
}

impl<'a, M: RegressionModel> Explainer<'a, M> {
    pub fn new(bundle: &'a ArtifactBundle<M>) -> Self {
        Self { bundle }
    }

    pub fn explain(&self, rows: &[FeatureRow]) -> Result<Explanation, AgriError> {
        if rows.is_empty() {
            return Err(AgriError::InvalidInput("no rows to explain".to_string()));
        }
        let names = self.bundle.feature_order.columns();
        let x = PipelineReplay::new(self.bundle).transform(rows)?;
        let full = self.bundle.model.predict(&x)?;

        let mut contributions = vec![vec![0.0; names.len()]; rows.len()];
        for j in 0..names.len() {
            let mut masked = x.clone();
            masked.column_mut(j).fill(0.0);
            let without = self.bundle.model.predict(&masked)?;
            for (r, row) in contributions.iter_mut().enumerate() {
                row[j] = full[r] - without[r];
            }
        }

        let mut bar: Vec<FeatureImportance> = names
            .iter()
            .enumerate()
            .map(|(j, name)| FeatureImportance {
                feature: name.clone(),
                mean_abs_contribution: contributions.iter().map(|c| c[j].abs()).sum::<f64>()
                    / rows.len() as f64,
            })
            .collect();
        bar.sort_by(|a, b| b.mean_abs_contribution.total_cmp(&a.mean_abs_contribution));

        let summary = contributions
            .into_iter()
            .zip(full.iter())
            .map(|(c, &prediction)| RowExplanation {
                prediction,
                contributions: names.iter().cloned().zip(c).collect(),
            })
            .collect();

        tracing::debug!("Explained {} row(s) over {} features", rows.len(), names.len());
        Ok(Explanation { summary, bar })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::CategoricalEncoder;
    use crate::data::scaler::FeatureScaler;
    use crate::ml::bundle::{BundleMeta, FeatureOrder};
    use crate::ml::model::LinearRegressor;
    use crate::ml::trainer::TrainConfig;
    use ndarray::array;

    fn bundle() -> ArtifactBundle {
        // y = 3·a + 0·b + 1 on the identity scale
        let x = array![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0], [3.0, 1.0]];
        let mut model = LinearRegressor::new(0.0);
        model.fit(&x, &array![1.0, 4.0, 7.0, 10.0]).unwrap();
        ArtifactBundle {
            meta: BundleMeta::new(TrainConfig::default(), 1.0),
            feature_order: FeatureOrder::new(vec!["a".into(), "b".into()]),
            encoder: CategoricalEncoder::default(),
            scaler: FeatureScaler::identity(2),
            model,
        }
    }

    #[test]
    fn test_linear_contributions_are_weight_times_value() {
        let b = bundle();
        let rows = vec![FeatureRow::new().with("a", 2.0).with("b", 5.0)];
        let e = Explainer::new(&b).explain(&rows).unwrap();
        let c = &e.summary[0].contributions;
        assert!((c["a"] - 6.0).abs() < 1e-9);
        assert!(c["b"].abs() < 1e-9);
        assert!((e.summary[0].prediction - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_bar_is_sorted_descending() {
        let b = bundle();
        let rows = vec![
            FeatureRow::new().with("a", 1.0).with("b", 1.0),
            FeatureRow::new().with("a", -1.0).with("b", 0.0),
        ];
        let e = Explainer::new(&b).explain(&rows).unwrap();
        assert_eq!(e.bar[0].feature, "a");
        assert!((e.bar[0].mean_abs_contribution - 3.0).abs() < 1e-9);
        assert!(e.bar[0].mean_abs_contribution >= e.bar[1].mean_abs_contribution);
    }

    #[test]
    fn test_empty_rows_rejected() {
        let b = bundle();
        assert!(Explainer::new(&b).explain(&[]).is_err());
    }
}
