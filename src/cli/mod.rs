// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction. Parses arguments
// with clap, builds the AppConfig once, hands off to one use
// case and prints its result (JSON for structured output).
// All business logic lives in Layer 2 and below.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::application::config::AppConfig;
use crate::application::dataset_use_case::{IngestUseCase, PreprocessUseCase, ProfileUseCase};
use crate::application::explain_use_case::ExplainUseCase;
use crate::application::optimize_use_case::OptimizeUseCase;
use crate::application::predict_use_case::PredictUseCase;
use crate::application::train_use_case::TrainUseCase;
use crate::domain::inputs::{OptimizationBase, PredictionInput};
use crate::domain::AgriError;
use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "agri-yield",
    version,
    about = "Predict crop yield and find the farm inputs that maximise it."
)]
pub struct Cli {
    /// Root of the uploads/ and processed/ dataset directories
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding artifact bundles and metrics.csv
    #[arg(long, global = true, default_value = "models")]
    pub model_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        let config = AppConfig::new(&self.data_dir, &self.model_dir);

        match self.command {
            Commands::Ingest(args) => {
                let dest = IngestUseCase::new(&config).execute(&args.file)?;
                println!("Stored {}", dest.display());
            }
            Commands::Profile => {
                print_json(&ProfileUseCase::new(&config).execute()?)?;
            }
            Commands::Preprocess(args) => {
                let out = PreprocessUseCase::new(&config, args.strategy).execute()?;
                println!("Processed dataset written to {}", out.display());
            }
            Commands::Train(args) => {
                tracing::info!("Starting training (target '{}')", args.target);
                let report = TrainUseCase::new(&config, args.into()).execute()?;
                print_json(&report)?;
            }
            Commands::Predict(args) => {
                let input: PredictionInput = args.parse_payload()?;
                let y = PredictUseCase::new(&config).execute(input)?;
                print_json(&serde_json::json!({ "predicted_yield": y }))?;
            }
            Commands::Optimize(args) => {
                let base: OptimizationBase = args.row.parse_payload()?;
                let result = OptimizeUseCase::new(&config, args.optimizer_config()).execute(base)?;
                if !result.found() {
                    eprintln!("No feasible input combination under the given limits.");
                }
                print_json(&result)?;
            }
            Commands::Explain(args) => {
                print_json(&ExplainUseCase::new(&config).execute(args.limit)?)?;
            }
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A user-facing line for the "run setup first" errors, if `err` is one.
pub fn precondition_message(err: &anyhow::Error) -> Option<String> {
    let err = err
        .chain()
        .find_map(|e| e.downcast_ref::<AgriError>())
        .filter(|e| e.is_missing_precondition())?;
    Some(match err {
        AgriError::NoDataset(detail) => format!("{detail} - run `ingest` and `preprocess` first"),
        _ => "model not trained yet - run `train` first".to_string(),
    })
}
