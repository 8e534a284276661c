// ============================================================
// Layer 5 - Artifact Bundle
// ============================================================
// The four artifacts one training run produces, kept together
// in a single value so they can only be saved, loaded and
// replayed as a unit:
//
//   feature_order   column names, in the exact order the model
//                   reads them (captured before scaling)
//   encoder         learned one-hot layout
//   scaler          per-column mean / scale
//   model           the fitted regression function
//
// `meta` records which run produced them. `validate` is run
// after every load and rejects a bundle whose parts disagree
// on the feature layout.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::encoder::CategoricalEncoder;
use crate::data::scaler::FeatureScaler;
use crate::domain::traits::RegressionModel;
use crate::domain::AgriError;
use crate::ml::model::LinearRegressor;
use crate::ml::trainer::TrainConfig;

/// Ordered feature column names, fixed at training time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureOrder(Vec<String>);

impl FeatureOrder {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

}

/// Provenance of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub version: Uuid,
    pub created_at: DateTime<Utc>,
    pub target: String,
    pub train_config: TrainConfig,
    /// Held-out goodness of fit reported by the run.
    pub accuracy: f64,
}

impl BundleMeta {
    pub fn new(train_config: TrainConfig, accuracy: f64) -> Self {
        Self {
            version: Uuid::new_v4(),
            created_at: Utc::now(),
            target: train_config.target.clone(),
            train_config,
            accuracy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBundle<M = LinearRegressor> {
    pub meta: BundleMeta,
    pub feature_order: FeatureOrder,
    pub encoder: CategoricalEncoder,
    pub scaler: FeatureScaler,
    pub model: M,
}

impl<M: RegressionModel> ArtifactBundle<M> {
    /// Check that all four parts describe the same feature layout.
    pub fn validate(&self) -> Result<(), AgriError> {
        self.encoder.check()?;
        let order = self.feature_order.columns();

        let mut seen = HashSet::with_capacity(order.len());
        if let Some(dup) = order.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(AgriError::InconsistentBundle(format!(
                "feature order lists '{dup}' twice"
            )));
        }
        if let Some(missing) = self
            .encoder
            .output_columns()
            .into_iter()
            .find(|c| !seen.contains(c.as_str()))
        {
            return Err(AgriError::InconsistentBundle(format!(
                "encoder output '{missing}' is not in the feature order"
            )));
        }
        if self.scaler.n_features() != order.len() {
            return Err(AgriError::InconsistentBundle(format!(
                "scaler covers {} features, feature order has {}",
                self.scaler.n_features(),
                order.len()
            )));
        }
        if self.model.n_features() != order.len() {
            return Err(AgriError::InconsistentBundle(format!(
                "model expects {} features, feature order has {}",
                self.model.n_features(),
                order.len()
            )));
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureRow;
    use ndarray::array;

    fn bundle() -> ArtifactBundle {
        let rows = vec![
            FeatureRow::new().with("crop", "rice"),
            FeatureRow::new().with("crop", "wheat"),
        ];
        let encoder = CategoricalEncoder::fit(&rows, &["crop".to_string()]).unwrap();
        let x = array![[1.0, 0.0], [2.0, 1.0], [4.0, 0.0]];
        let scaler = FeatureScaler::fit(&x).unwrap();
        let mut model = LinearRegressor::default();
        model.fit(&x, &array![1.0, 2.0, 3.0]).unwrap();
        ArtifactBundle {
            meta: BundleMeta::new(TrainConfig::default(), 0.5),
            feature_order: FeatureOrder::new(vec!["a".into(), "crop_wheat".into()]),
            encoder,
            scaler,
            model,
        }
    }

    #[test]
    fn test_consistent_bundle_validates() {
        bundle().validate().unwrap();
    }

    #[test]
    fn test_encoder_output_outside_order() {
        let mut b = bundle();
        b.feature_order = FeatureOrder::new(vec!["a".into(), "b".into()]);
        assert!(matches!(b.validate(), Err(AgriError::InconsistentBundle(_))));
    }

    #[test]
    fn test_width_mismatch() {
        let mut b = bundle();
        b.scaler = FeatureScaler::fit(&array![[1.0], [2.0]]).unwrap();
        assert!(matches!(b.validate(), Err(AgriError::InconsistentBundle(_))));
    }

    #[test]
    fn test_duplicate_feature_name() {
        let mut b = bundle();
        b.feature_order = FeatureOrder::new(vec!["crop_wheat".into(), "crop_wheat".into()]);
        assert!(matches!(b.validate(), Err(AgriError::InconsistentBundle(_))));
    }

    #[test]
    fn test_meta_target_follows_config() {
        let b = bundle();
        assert_eq!(b.meta.target, "yield_kg_per_ha");
        assert_eq!(b.feature_order.columns().iter().position(|c| c == "crop_wheat"), Some(1));
    }
}
