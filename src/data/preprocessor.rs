// ============================================================
// Layer 4 - Dataset Preprocessor
// ============================================================
// Prepares an uploaded dataset for training. Two steps, in
// this order:
//
//   1. Date expansion: a `date` column (YYYY-MM-DD) is replaced
//      by numeric `year`, `month` and `day_of_year` columns,
//      appended at the end. Unparsable dates become missing.
//   2. Missing-value imputation with one strategy:
//        mean    numeric columns ← column mean
//        median  numeric columns ← column median
//        mode    every column    ← most frequent value
//                (ties go to the smallest value)
//
// No encoding or scaling happens here; that belongs to the
// training pipeline so it can be replayed at inference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::data::dataset::{Column, ColumnKind, Dataset};
use crate::domain::{AgriError, FeatureValue};

pub const DATE_COLUMN: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
}

impl FromStr for ImputeStrategy {
    type Err = AgriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(AgriError::InvalidInput(format!(
                "unknown imputation strategy '{other}' (expected mean, median or mode)"
            ))),
        }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        };
        f.write_str(name)
    }
}

pub struct Preprocessor {
    strategy: ImputeStrategy,
}

impl Preprocessor {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    /// Run date expansion followed by imputation.
    pub fn process(&self, dataset: Dataset) -> Dataset {
        let dataset = expand_dates(dataset);
        self.impute(dataset)
    }

    fn impute(&self, mut dataset: Dataset) -> Dataset {
        let columns = dataset.columns().to_vec();
        for column in &columns {
            let fill = match (self.strategy, column.kind) {
                (ImputeStrategy::Mean, ColumnKind::Numeric) => {
                    mean(&present(&dataset, &column.name)).map(FeatureValue::Numeric)
                }
                (ImputeStrategy::Median, ColumnKind::Numeric) => {
                    median(&present(&dataset, &column.name)).map(FeatureValue::Numeric)
                }
                (ImputeStrategy::Mode, _) => mode(&dataset, column),
                _ => None,
            };
            let Some(fill) = fill else { continue };

            let mut filled = 0usize;
            for row in dataset.rows_mut() {
                if !row.contains(&column.name) {
                    row.insert(column.name.clone(), fill.clone());
                    filled += 1;
                }
            }
            if filled > 0 {
                tracing::debug!("Imputed {} cell(s) in '{}' ({})", filled, column.name, self.strategy);
            }
        }
        dataset
    }
}

/// Replace a `date` column by year / month / day_of_year.
fn expand_dates(mut dataset: Dataset) -> Dataset {
    if !dataset.has_column(DATE_COLUMN) {
        return dataset;
    }

    let mut unparsed = 0usize;
    for row in dataset.rows_mut() {
        let date = row.remove(DATE_COLUMN).and_then(|v| parse_date(&v));
        match date {
            Some(d) => {
                row.insert("year", f64::from(d.year()));
                row.insert("month", f64::from(d.month()));
                row.insert("day_of_year", f64::from(d.ordinal()));
            }
            None => unparsed += 1,
        }
    }
    if unparsed > 0 {
        tracing::warn!("{} row(s) had a missing or unparsable date", unparsed);
    }

    let mut columns: Vec<Column> = dataset
        .columns()
        .iter()
        .filter(|c| c.name != DATE_COLUMN)
        .cloned()
        .collect();
    for name in ["year", "month", "day_of_year"] {
        columns.retain(|c| c.name != name);
        columns.push(Column { name: name.to_string(), kind: ColumnKind::Numeric });
    }
    dataset.with_columns(columns)
}

fn parse_date(value: &FeatureValue) -> Option<NaiveDate> {
    let text = value.as_category()?;
    NaiveDate::parse_from_str(text.get(..10).unwrap_or(text), "%Y-%m-%d").ok()
}

fn present(dataset: &Dataset, name: &str) -> Vec<f64> {
    dataset.numeric_column(name).into_iter().flatten().collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Linear-interpolated quantile, matching the common "type 7" definition.
pub(crate) fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn mode(dataset: &Dataset, column: &Column) -> Option<FeatureValue> {
    match column.kind {
        ColumnKind::Numeric => {
            // Keyed on the bit pattern of the total order so floats can be counted
            let mut counts: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
            for v in present(dataset, &column.name) {
                counts.entry(total_order_key(v)).or_insert((v, 0)).1 += 1;
            }
            pick_most_frequent(counts.into_values()).map(FeatureValue::Numeric)
        }
        ColumnKind::Categorical => {
            let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
            for row in dataset.rows() {
                if let Some(c) = row.category(&column.name) {
                    counts.entry(c.to_string()).or_insert((c.to_string(), 0)).1 += 1;
                }
            }
            pick_most_frequent(counts.into_values()).map(FeatureValue::Categorical)
        }
    }
}

/// First entry with the highest count; inputs arrive in ascending order.
fn pick_most_frequent<T>(entries: impl Iterator<Item = (T, usize)>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (value, count) in entries {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v)
}

fn total_order_key(v: f64) -> i64 {
    let bits = v.to_bits() as i64;
    bits ^ (((bits >> 63) as u64) >> 1) as i64
}
