// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Resolve the latest processed CSV   (Layer 6 - infra)
//   Step 2: Load it as a typed dataset         (Layer 4 - data)
//   Step 3: Fit encoder, scaler and model      (Layer 5 - ml)
//   Step 4: Publish the artifact bundle        (Layer 6 - infra)
//   Step 5: Append the run to metrics.csv and  (Layer 6 - infra)
//           compare it with the previous run
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};

use crate::application::config::AppConfig;
use crate::data::loader::CsvLoader;
use crate::infra::metrics::{MetricsLogger, RunMetrics};
use crate::infra::workspace::latest_csv;
use crate::ml::model::LinearRegressor;
use crate::ml::trainer::{ModelTrainer, TrainConfig, TrainReport};

pub struct TrainUseCase<'a> {
    app: &'a AppConfig,
    config: TrainConfig,
}

impl<'a> TrainUseCase<'a> {
    pub fn new(app: &'a AppConfig, config: TrainConfig) -> Self {
        Self { app, config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        // ── Step 1-2: load training data ─────────────────────────────────────
        let path = latest_csv(&self.app.processed_dir)?;
        tracing::info!("Training on '{}' (target '{}')", path.display(), self.config.target);
        let dataset = CsvLoader::new()
            .load(&path)
            .with_context(|| format!("Failed to load '{}'", path.display()))?;

        // ── Step 3-4: fit and publish ────────────────────────────────────────
        let store = self.app.artifact_store();
        let trainer = ModelTrainer::new(self.config.clone());
        let report = trainer
            .train(dataset, LinearRegressor::new(self.config.ridge_alpha), &store)
            .context("Training failed")?;

        // ── Step 5: history ──────────────────────────────────────────────────
        let logger = MetricsLogger::new(&self.app.model_dir)?;
        let previous = logger.history().context("Cannot read metrics history")?.pop();
        let run = RunMetrics {
            version: report.version,
            created_at: report.created_at,
            rows: report.rows,
            features: report.features,
            r2: report.accuracy,
        };
        logger.log(&run)?;
        match previous {
            Some(prev) if run.is_improvement(&prev) => {
                tracing::info!("R² improved: {:.4} → {:.4}", prev.r2, run.r2)
            }
            Some(prev) => tracing::info!("R² {:.4} (previous run {:.4})", run.r2, prev.r2),
            None => tracing::info!("First recorded run, R² {:.4}", run.r2),
        }

        Ok(report)
    }
}
