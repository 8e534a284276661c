// ============================================================
// Layer 2 - Dataset Use Cases
// ============================================================
// The three steps that get a CSV ready for training:
//
//   ingest      copy a CSV into the upload directory
//   profile     descriptive report on the latest upload
//   preprocess  latest upload → date features + imputation
//               → <stem>_<strategy>.csv in the processed dir
//
// Training always reads the latest processed file, so
// preprocess must run at least once before train.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::config::AppConfig;
use crate::data::loader::CsvLoader;
use crate::data::preprocessor::{ImputeStrategy, Preprocessor};
use crate::data::profile::DatasetProfile;
use crate::infra::workspace::{latest_csv, store_upload};

pub struct IngestUseCase<'a> {
    config: &'a AppConfig,
}

impl<'a> IngestUseCase<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, source: &Path) -> Result<PathBuf> {
        // parse once so a malformed file is rejected at the door
        CsvLoader::new()
            .load(source)
            .with_context(|| format!("'{}' is not a readable CSV", source.display()))?;
        let dest = store_upload(source, &self.config.upload_dir)
            .with_context(|| format!("Failed to store upload '{}'", source.display()))?;
        Ok(dest)
    }
}

pub struct ProfileUseCase<'a> {
    config: &'a AppConfig,
}

impl<'a> ProfileUseCase<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<DatasetProfile> {
        let path = latest_csv(&self.config.upload_dir)?;
        tracing::info!("Profiling '{}'", path.display());
        let dataset = CsvLoader::new()
            .load(&path)
            .with_context(|| format!("Failed to load '{}'", path.display()))?;
        Ok(DatasetProfile::of(&dataset))
    }
}

pub struct PreprocessUseCase<'a> {
    config: &'a AppConfig,
    strategy: ImputeStrategy,
}

impl<'a> PreprocessUseCase<'a> {
    pub fn new(config: &'a AppConfig, strategy: ImputeStrategy) -> Self {
        Self { config, strategy }
    }

    pub fn execute(&self) -> Result<PathBuf> {
        let source = latest_csv(&self.config.upload_dir)?;
        tracing::info!("Preprocessing '{}' with {} imputation", source.display(), self.strategy);

        let dataset = CsvLoader::new()
            .load(&source)
            .with_context(|| format!("Failed to load '{}'", source.display()))?;
        let processed = Preprocessor::new(self.strategy).process(dataset);

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        std::fs::create_dir_all(&self.config.processed_dir)?;
        let out = self
            .config
            .processed_dir
            .join(format!("{stem}_{}.csv", self.strategy));
        processed
            .write_csv(&out)
            .with_context(|| format!("Failed to write '{}'", out.display()))?;

        tracing::info!("Wrote {} rows to '{}'", processed.n_rows(), out.display());
        Ok(out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgriError;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AppConfig) {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::new(dir.path().join("data"), dir.path().join("models"));
        (dir, cfg)
    }

    #[test]
    fn test_profile_without_upload_is_no_dataset() {
        let (_dir, cfg) = setup();
        let err = ProfileUseCase::new(&cfg).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<AgriError>(), Some(AgriError::NoDataset(_))));
    }

    #[test]
    fn test_ingest_then_preprocess() {
        let (dir, cfg) = setup();
        let src = dir.path().join("farm.csv");
        fs::write(&src, "date,rain,crop\n2024-05-01,10,rice\n2024-05-02,,wheat\n2024-05-03,30,rice\n")
            .unwrap();

        IngestUseCase::new(&cfg).execute(&src).unwrap();
        let profile = ProfileUseCase::new(&cfg).execute().unwrap();
        assert_eq!(profile.missing["rain"], 1);

        let out = PreprocessUseCase::new(&cfg, ImputeStrategy::Median).execute().unwrap();
        assert_eq!(out.file_name().unwrap(), "farm_median.csv");

        let processed = CsvLoader::new().load(&out).unwrap();
        assert_eq!(processed.rows()[1].numeric("rain"), Some(20.0));
        assert_eq!(processed.column_names(), vec!["rain", "crop", "year", "month", "day_of_year"]);
    }
}
