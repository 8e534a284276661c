// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// One subcommand per use case, in the order a user runs them:
//
//   ingest → profile → preprocess → train → predict / optimize / explain
//
// clap's derive macros generate help text, error messages for
// missing args and type conversion (string → f64, enums, ...).
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::de::DeserializeOwned;

use crate::data::preprocessor::ImputeStrategy;
use crate::domain::inputs::DEFAULT_TARGET;
use crate::ml::optimizer::OptimizerConfig;
use crate::ml::trainer::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a CSV dataset into the upload directory
    Ingest(IngestArgs),

    /// Print descriptive statistics of the latest upload as JSON
    Profile,

    /// Expand dates and fill missing values of the latest upload
    Preprocess(PreprocessArgs),

    /// Train on the latest processed dataset and publish a bundle
    Train(TrainArgs),

    /// Predict yield for one feature row
    Predict(RowArgs),

    /// Search fertilizer / irrigation / pesticide levels for maximum yield
    Optimize(OptimizeArgs),

    /// Per-feature contributions over the latest processed dataset
    Explain(ExplainArgs),
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// CSV file to ingest
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Missing-value strategy: mean, median or mode
    #[arg(long, default_value = "mean")]
    pub strategy: ImputeStrategy,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Column to predict
    #[arg(long, default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Share of rows held out for scoring, in (0, 1)
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// L2 penalty of the ridge regressor
    #[arg(long, default_value_t = 1e-3)]
    pub alpha: f64,

    /// Seed of the train / test shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the ML-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            target: a.target,
            test_fraction: a.test_fraction,
            ridge_alpha: a.alpha,
            seed: a.seed,
        }
    }
}

/// A JSON feature row, inline or from a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RowArgs {
    /// Feature row as a JSON object
    #[arg(long)]
    pub row: Option<String>,

    /// Path to a JSON file holding the feature row
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl RowArgs {
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T> {
        let text = match (&self.row, &self.input) {
            (Some(row), _) => row.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?,
            (None, None) => anyhow::bail!("either --row or --input is required"),
        };
        serde_json::from_str(&text).context("Feature row is not valid for this command")
    }
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub row: RowArgs,

    /// Upper bound on total input cost
    #[arg(long, default_value_t = 12_000.0)]
    pub max_cost: f64,

    /// Upper bound on environmental score
    #[arg(long, default_value_t = 10_000.0)]
    pub max_environment: f64,
}

impl OptimizeArgs {
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            max_cost: self.max_cost,
            max_environment: self.max_environment,
            ..OptimizerConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Only explain the first N rows
    #[arg(long)]
    pub limit: Option<usize>,
}
