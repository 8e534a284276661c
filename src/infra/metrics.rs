// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one row per training run to <model_dir>/metrics.csv,
// giving a permanent history of every bundle ever published.
//
// Columns:
//   version     bundle id (matches bundles/bundle-<id>.json)
//   created_at  RFC 3339 timestamp of the run
//   rows        labelled rows the run consumed
//   features    width of the feature order
//   r2          held-out coefficient of determination
//
// Example:
//   version,created_at,rows,features,r2
//   0b6c…,2026-03-14T09:12:44.120Z,1200,17,0.842113
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::AgriError;

const HEADER: &str = "version,created_at,rows,features,r2";

/// One row of the training history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub version: Uuid,
    pub created_at: DateTime<Utc>,
    pub rows: usize,
    pub features: usize,
    pub r2: f64,
}

impl RunMetrics {
    /// True if this run scored a higher held-out R² than `previous`.
    pub fn is_improvement(&self, previous: &RunMetrics) -> bool {
        self.r2 > previous.r2
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open the log in `dir`, writing the header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, AgriError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &RunMetrics) -> Result<(), AgriError> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{},{},{:.6}",
            m.version,
            m.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            m.rows,
            m.features,
            m.r2,
        )?;
        tracing::debug!("Logged run {} (r2={:.4})", m.version, m.r2);
        Ok(())
    }

    /// Every run logged so far, oldest first.
    pub fn history(&self) -> Result<Vec<RunMetrics>, AgriError> {
        let mut reader = csv::Reader::from_path(&self.csv_path)?;
        let mut runs = Vec::new();
        for record in reader.deserialize() {
            runs.push(record?);
        }
        Ok(runs)
    }
}
