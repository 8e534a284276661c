// ============================================================
// Layer 2 - Predict Use Case
// ============================================================
// Typed payload → feature row → published bundle → yield.

use anyhow::{Context, Result};

use crate::application::config::AppConfig;
use crate::domain::inputs::PredictionInput;
use crate::ml::inferencer::PredictionEngine;

pub struct PredictUseCase<'a> {
    config: &'a AppConfig,
}

impl<'a> PredictUseCase<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, input: PredictionInput) -> Result<f64> {
        let row = input.into_row()?;
        let engine: PredictionEngine = PredictionEngine::from_store(&self.config.artifact_store())?;
        let y = engine.predict(&row).context("Prediction failed")?;
        tracing::info!("Predicted yield: {:.2}", y);
        Ok(y)
    }
}
