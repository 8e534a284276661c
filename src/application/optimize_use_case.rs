// ============================================================
// Layer 2 - Optimize Use Case
// ============================================================
// Fixed field description → best fertilizer / irrigation /
// pesticide levels under the configured limits.
//
// The caller must check `found()` (or compare the yield with
// NO_FEASIBLE_YIELD) before reading the result as a real
// prediction.

use anyhow::{Context, Result};

use crate::application::config::AppConfig;
use crate::domain::inputs::OptimizationBase;
use crate::ml::bundle::ArtifactBundle;
use crate::ml::optimizer::{OptimizationResult, Optimizer, OptimizerConfig};

pub struct OptimizeUseCase<'a> {
    config: &'a AppConfig,
    optimizer: Optimizer,
}

impl<'a> OptimizeUseCase<'a> {
    pub fn new(config: &'a AppConfig, optimizer: OptimizerConfig) -> Self {
        Self { config, optimizer: Optimizer::new(optimizer) }
    }

    pub fn execute(&self, base: OptimizationBase) -> Result<OptimizationResult> {
        let row = base.into_row()?;
        let bundle: ArtifactBundle = self.config.artifact_store().load()?;
        tracing::info!("Optimizing inputs with bundle {}", bundle.meta.version);
        let result = self
            .optimizer
            .optimize(&bundle, &row)
            .context("Optimization failed")?;
        Ok(result)
    }
}
