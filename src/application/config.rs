// ============================================================
// Layer 2 - Application Configuration
// ============================================================
// Every directory the use cases touch, built once by the CLI
// and handed down explicitly. No use case reads a global path.
//
//   <data_dir>/uploads     raw CSV uploads
//   <data_dir>/processed   preprocessed CSVs (training input)
//   <model_dir>            artifact bundles + metrics.csv

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::infra::artifact_store::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl AppConfig {
    pub fn new(data_dir: impl AsRef<Path>, model_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            upload_dir: data_dir.join("uploads"),
            processed_dir: data_dir.join("processed"),
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.model_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new("data", "models")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.upload_dir, PathBuf::from("data/uploads"));
        assert_eq!(cfg.processed_dir, PathBuf::from("data/processed"));
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
    }
}
