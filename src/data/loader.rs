// ============================================================
// Layer 4 - CSV Dataset Loader
// ============================================================
// Loads a headed CSV file into a typed Dataset.
//
// Type inference happens per column, after the whole file has
// been read:
//   - every non-empty cell parses as f64  → numeric column
//   - anything else                       → categorical column
// Empty cells become missing values (absent keys).
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;

use crate::data::dataset::Dataset;
use crate::domain::{AgriError, FeatureRow, FeatureValue};

/// Reads CSV files into Datasets.
pub struct CsvLoader;

impl CsvLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file from disk.
    pub fn load(&self, path: &Path) -> Result<Dataset, AgriError> {
        let dataset = self.load_str(&fs::read_to_string(path)?)?;
        tracing::info!(
            "Loaded '{}': {} rows × {} columns",
            path.display(),
            dataset.n_rows(),
            dataset.columns().len()
        );
        Ok(dataset)
    }

    /// Parse CSV text held in memory.
    pub fn load_str(&self, text: &str) -> Result<Dataset, AgriError> {
        let reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        self.read(reader)
    }

    fn read<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> Result<Dataset, AgriError> {
        let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw.push(record.iter().map(str::to_string).collect());
        }

        // A column is numeric only if every present cell parses
        let numeric: Vec<bool> = (0..names.len())
            .map(|c| {
                raw.iter()
                    .filter_map(|r| r.get(c))
                    .filter(|cell| !cell.is_empty())
                    .all(|cell| cell.parse::<f64>().is_ok())
            })
            .collect();

        let rows: Vec<FeatureRow> = raw
            .iter()
            .map(|record| {
                names
                    .iter()
                    .enumerate()
                    .filter_map(|(c, name)| {
                        let cell = record.get(c).filter(|cell| !cell.is_empty())?;
                        let value = if numeric[c] {
                            FeatureValue::Numeric(cell.parse().ok()?)
                        } else {
                            FeatureValue::Categorical(cell.clone())
                        };
                        Some((name.clone(), value))
                    })
                    .fold(FeatureRow::new(), |row, (name, value)| row.with(name, value))
            })
            .collect();

        tracing::debug!("Parsed {} records with {} header columns", rows.len(), names.len());
        Ok(Dataset::from_rows(names, rows))
    }
}
