// ============================================================
// Layer 5 - Model Trainer
// ============================================================
// Turns a labelled dataset into a complete artifact bundle.
//
//   Step 1: separate the target column           (InvalidTarget)
//   Step 2: fit the encoder on categorical cols
//   Step 3: capture the feature order            numeric columns in
//                                                dataset order, then
//                                                one-hot outputs
//   Step 4: build the unscaled design matrix     via PipelineReplay
//   Step 5: fit + apply the scaler               whole matrix
//   Step 6: seeded train / test split
//   Step 7: fit the model on train, score on test
//   Step 8: publish the bundle                   via ArtifactStore
//
// Steps 4 and 5 reuse the exact replay routine prediction uses,
// so the training layout and the serving layout are one code
// path. Training is deterministic for a deterministic model:
// same data and config give the same split and the same score.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::dataset::{ColumnKind, Dataset};
use crate::data::encoder::CategoricalEncoder;
use crate::data::scaler::FeatureScaler;
use crate::data::splitter::{split_train_test, SPLIT_SEED};
use crate::domain::inputs::DEFAULT_TARGET;
use crate::domain::traits::RegressionModel;
use crate::domain::{AgriError, FeatureValue};
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::bundle::{ArtifactBundle, BundleMeta, FeatureOrder};
use crate::ml::replay::PipelineReplay;

// ─── Training Configuration ──────────────────────────────────────────────────
// Stored inside every bundle's metadata so a run can be traced
// back to the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub target: String,
    pub test_fraction: f64,
    pub ridge_alpha: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            test_fraction: 0.2,
            ridge_alpha: 1e-3,
            seed: SPLIT_SEED,
        }
    }
}

/// What a finished training run reports back.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub version: Uuid,
    pub created_at: DateTime<Utc>,
    pub accuracy: f64,
    pub rows: usize,
    pub features: usize,
}

pub struct ModelTrainer {
    config: TrainConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Fit every artifact and publish the bundle to `store`.
    pub fn train<M>(
        &self,
        dataset: Dataset,
        model: M,
        store: &ArtifactStore,
    ) -> Result<TrainReport, AgriError>
    where
        M: RegressionModel + Serialize,
    {
        let rows = dataset.n_rows();
        let bundle = self.fit(dataset, model)?;
        store.save(&bundle)?;

        tracing::info!(
            "Published bundle {} (R² = {:.4}, {} features)",
            bundle.meta.version,
            bundle.meta.accuracy,
            bundle.feature_order.len()
        );
        Ok(TrainReport {
            version: bundle.meta.version,
            created_at: bundle.meta.created_at,
            accuracy: bundle.meta.accuracy,
            rows,
            features: bundle.feature_order.len(),
        })
    }

    /// Fit every artifact without persisting anything.
    pub fn fit<M: RegressionModel>(
        &self,
        dataset: Dataset,
        mut model: M,
    ) -> Result<ArtifactBundle<M>, AgriError> {
        // ── Step 1: target ───────────────────────────────────────────────────
        let (features, target) = dataset.take_column(&self.config.target)?;
        let y = target_vector(&self.config.target, target)?;

        // ── Steps 2-3: encoder and feature order ─────────────────────────────
        let categorical = features.names_of_kind(ColumnKind::Categorical);
        let encoder = CategoricalEncoder::fit(features.rows(), &categorical)?;

        let mut order = features.names_of_kind(ColumnKind::Numeric);
        order.extend(encoder.output_columns());
        let feature_order = FeatureOrder::new(order);
        tracing::info!(
            "Feature layout: {} numeric + {} one-hot = {} columns",
            feature_order.len() - encoder.n_outputs(),
            encoder.n_outputs(),
            feature_order.len()
        );

        // ── Steps 4-5: design matrix, scaled ─────────────────────────────────
        let identity = FeatureScaler::identity(feature_order.len());
        let replay = PipelineReplay::from_parts(&feature_order, &encoder, &identity);
        for (i, row) in features.rows().iter().enumerate() {
            replay.validate_row(row).map_err(|e| {
                AgriError::InvalidInput(format!("row {}: {}", i + 1, error_detail(&e)))
            })?;
        }
        let (scaler, x) = FeatureScaler::fit_transform(&replay.unscaled(features.rows()))?;

        // ── Step 6: split ────────────────────────────────────────────────────
        let split = split_train_test(x.nrows(), self.config.test_fraction, self.config.seed)?;
        let (x_train, y_train) = select(&x, &y, &split.train);
        let (x_test, y_test) = select(&x, &y, &split.test);

        // ── Step 7: fit and score ────────────────────────────────────────────
        model.fit(&x_train, &y_train)?;
        let accuracy = model.score(&x_test, &y_test)?;
        tracing::info!(
            "Trained on {} rows, held-out R² = {:.4} on {} rows",
            y_train.len(),
            accuracy,
            y_test.len()
        );

        let bundle = ArtifactBundle {
            meta: BundleMeta::new(self.config.clone(), accuracy),
            feature_order,
            encoder,
            scaler,
            model,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}

fn target_vector(name: &str, values: Vec<Option<FeatureValue>>) -> Result<Array1<f64>, AgriError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v {
            Some(FeatureValue::Numeric(y)) if y.is_finite() => Ok(y),
            Some(FeatureValue::Numeric(_)) | None => Err(AgriError::InvalidInput(format!(
                "row {}: target '{name}' is missing",
                i + 1
            ))),
            Some(FeatureValue::Categorical(s)) => Err(AgriError::InvalidInput(format!(
                "target '{name}' must be numeric, found '{s}'"
            ))),
        })
        .collect()
}

fn select(x: &Array2<f64>, y: &Array1<f64>, idx: &[usize]) -> (Array2<f64>, Array1<f64>) {
    (x.select(Axis(0), idx), y.select(Axis(0), idx))
}

fn error_detail(e: &AgriError) -> String {
    match e {
        AgriError::InvalidInput(msg) => msg.clone(),
        other => other.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::CsvLoader;
    use crate::ml::model::LinearRegressor;

    fn dataset() -> Dataset {
        let mut csv = String::from("rain,crop,yield_kg_per_ha\n");
        for i in 0..20 {
            let crop = if i % 2 == 0 { "wheat" } else { "rice" };
            let bonus = if crop == "rice" { 50.0 } else { 0.0 };
            let rain = 100.0 + 10.0 * i as f64;
            csv.push_str(&format!("{rain},{crop},{}\n", 2.0 * rain + bonus));
        }
        CsvLoader::new().load_str(&csv).unwrap()
    }

    #[test]
    fn test_feature_order_numeric_then_one_hot() {
        let bundle = ModelTrainer::new(TrainConfig::default())
            .fit(dataset(), LinearRegressor::default())
            .unwrap();
        assert_eq!(bundle.feature_order.columns(), &["rain", "crop_wheat"]);
        assert_eq!(bundle.scaler.n_features(), 2);
        assert!(bundle.meta.accuracy > 0.99);
    }

    #[test]
    fn test_missing_target_is_invalid_target() {
        let config = TrainConfig { target: "harvest".into(), ..TrainConfig::default() };
        let err = ModelTrainer::new(config)
            .fit(dataset(), LinearRegressor::default())
            .unwrap_err();
        assert!(matches!(err, AgriError::InvalidTarget(_)));
    }

    #[test]
    fn test_missing_numeric_feature_is_invalid_input() {
        let ds = CsvLoader::new()
            .load_str("rain,yield_kg_per_ha\n1,2\n,4\n3,6\n4,8\n5,10\n")
            .unwrap();
        let err = ModelTrainer::new(TrainConfig::default())
            .fit(ds, LinearRegressor::default())
            .unwrap_err();
        assert!(matches!(err, AgriError::InvalidInput(_)));
    }

    #[test]
    fn test_training_is_deterministic() {
        let trainer = ModelTrainer::new(TrainConfig::default());
        let a = trainer.fit(dataset(), LinearRegressor::default()).unwrap();
        let b = trainer.fit(dataset(), LinearRegressor::default()).unwrap();
        assert_eq!(a.meta.accuracy.to_bits(), b.meta.accuracy.to_bits());
        assert_eq!(a.model, b.model);
    }

    #[test]
    fn test_train_publishes_bundle() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let report = ModelTrainer::new(TrainConfig::default())
            .train(dataset(), LinearRegressor::default(), &store)
            .unwrap();
        assert_eq!(report.rows, 20);
        assert_eq!(report.features, 2);
        let loaded: ArtifactBundle = store.load().unwrap();
        assert_eq!(loaded.meta.version, report.version);
    }
}
