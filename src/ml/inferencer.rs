// ============================================================
// Layer 5 - Prediction Engine
// ============================================================
// Loads one published bundle and predicts yield for single
// feature rows: validate → replay → model.predict.
//
// The engine owns its bundle, so every prediction it makes
// uses artifacts from the same training run.

use serde::de::DeserializeOwned;

use crate::domain::traits::RegressionModel;
use crate::domain::{AgriError, FeatureRow};
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::bundle::ArtifactBundle;
use crate::ml::model::LinearRegressor;
use crate::ml::replay::PipelineReplay;

pub struct PredictionEngine<M = LinearRegressor> {
    bundle: ArtifactBundle<M>,
}

impl<M: RegressionModel> PredictionEngine<M> {
    pub fn new(bundle: ArtifactBundle<M>) -> Self {
        Self { bundle }
    }

    pub fn from_store(store: &ArtifactStore) -> Result<Self, AgriError>
    where
        M: DeserializeOwned,
    {
        let bundle = store.load()?;
        tracing::info!("Prediction engine ready (bundle {})", bundle.meta.version);
        Ok(Self::new(bundle))
    }

    pub fn replay(&self) -> PipelineReplay<'_> {
        PipelineReplay::new(&self.bundle)
    }

    /// Predicted yield for one row.
    pub fn predict(&self, row: &FeatureRow) -> Result<f64, AgriError> {
        let replay = self.replay();
        replay.validate_row(row)?;
        let x = replay.transform(std::slice::from_ref(row))?;
        let y = self.bundle.model.predict(&x)?;
        y.get(0).copied().ok_or_else(|| {
            AgriError::Numerical("model returned no prediction".to_string())
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::CsvLoader;
    use crate::ml::trainer::{ModelTrainer, TrainConfig};

    fn engine() -> PredictionEngine {
        let mut csv = String::from("rain,crop,yield_kg_per_ha\n");
        for i in 0..30 {
            let crop = ["maize", "rice", "wheat"][i % 3];
            let rain = 200.0 + 7.0 * i as f64;
            let bonus = [0.0, 40.0, -25.0][i % 3];
            csv.push_str(&format!("{rain},{crop},{}\n", 3.0 * rain + bonus));
        }
        let ds = CsvLoader::new().load_str(&csv).unwrap();
        let bundle = ModelTrainer::new(TrainConfig::default())
            .fit(ds, LinearRegressor::default())
            .unwrap();
        PredictionEngine::new(bundle)
    }

    #[test]
    fn test_predicts_learned_relation() {
        let e = engine();
        let y = e
            .predict(&FeatureRow::new().with("rain", 250.0).with("crop", "rice"))
            .unwrap();
        assert!((y - 790.0).abs() < 1.0, "got {y}");
    }

    #[test]
    fn test_unseen_category_predicts_like_reference() {
        let e = engine();
        let unseen = e
            .predict(&FeatureRow::new().with("rain", 250.0).with("crop", "sorghum"))
            .unwrap();
        let reference = e
            .predict(&FeatureRow::new().with("rain", 250.0).with("crop", "maize"))
            .unwrap();
        assert!(unseen.is_finite());
        assert_eq!(unseen.to_bits(), reference.to_bits());
    }

    #[test]
    fn test_missing_numeric_feature_is_invalid_input() {
        let e = engine();
        let err = e.predict(&FeatureRow::new().with("crop", "rice")).unwrap_err();
        assert!(matches!(err, AgriError::InvalidInput(_)));
    }

    #[test]
    fn test_from_empty_store_is_artifact_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = PredictionEngine::<LinearRegressor>::from_store(&ArtifactStore::new(dir.path()));
        assert!(matches!(result, Err(AgriError::ArtifactMissing)));
    }
}
