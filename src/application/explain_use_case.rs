// ============================================================
// Layer 2 - Explain Use Case
// ============================================================
// Feature contributions over the latest processed dataset,
// with the target column dropped if it is there.

use anyhow::{Context, Result};

use crate::application::config::AppConfig;
use crate::data::loader::CsvLoader;
use crate::infra::workspace::latest_csv;
use crate::ml::bundle::ArtifactBundle;
use crate::ml::explain::{Explainer, Explanation};

pub struct ExplainUseCase<'a> {
    config: &'a AppConfig,
}

impl<'a> ExplainUseCase<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Explain the first `limit` rows, or every row when `None`.
    pub fn execute(&self, limit: Option<usize>) -> Result<Explanation> {
        let bundle: ArtifactBundle = self.config.artifact_store().load()?;
        let path = latest_csv(&self.config.processed_dir)?;
        let dataset = CsvLoader::new()
            .load(&path)
            .with_context(|| format!("Failed to load '{}'", path.display()))?
            .without_column(&bundle.meta.target);

        let rows = dataset.rows();
        let rows = &rows[..limit.unwrap_or(rows.len()).min(rows.len())];
        tracing::info!("Explaining {} row(s) of '{}'", rows.len(), path.display());

        let explanation = Explainer::new(&bundle)
            .explain(rows)
            .context("Explanation failed")?;
        Ok(explanation)
    }
}
