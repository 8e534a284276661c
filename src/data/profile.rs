// ============================================================
// Layer 4 - Dataset Profile
// ============================================================
// Descriptive statistics for an uploaded dataset, reported as
// JSON. Plot rendering is left to whoever consumes the report.
//
//   shape        (rows, columns)
//   missing      absent cells per column
//   dtypes       numeric / categorical
//   describe     count, mean, std (sample), min, quartiles, max
//   outlier_pct  share of rows whose value lies outside
//                Q1-1.5·IQR .. Q3+1.5·IQR (missing cells count
//                as rows, never as outliers)

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::dataset::{ColumnKind, Dataset};
use crate::data::preprocessor::{mean, quantile};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub missing: IndexMap<String, usize>,
    pub dtypes: IndexMap<String, ColumnKind>,
    pub describe: IndexMap<String, Describe>,
    pub outlier_pct: IndexMap<String, f64>,
}

impl DatasetProfile {
    pub fn of(dataset: &Dataset) -> Self {
        let columns: Vec<String> = dataset.column_names().iter().map(|s| s.to_string()).collect();
        let missing = dataset.missing_counts().into_iter().collect();
        let dtypes = dataset
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.kind))
            .collect();

        let mut describe = IndexMap::new();
        let mut outlier_pct = IndexMap::new();
        for name in dataset.names_of_kind(ColumnKind::Numeric) {
            let values: Vec<f64> = dataset.numeric_column(&name).into_iter().flatten().collect();
            if let Some(d) = describe_values(&values) {
                outlier_pct.insert(name.clone(), outlier_share(&values, dataset.n_rows(), d.q1, d.q3));
                describe.insert(name, d);
            }
        }

        Self {
            shape: (dataset.n_rows(), columns.len()),
            columns,
            missing,
            dtypes,
            describe,
            outlier_pct,
        }
    }
}

fn describe_values(values: &[f64]) -> Option<Describe> {
    let m = mean(values)?;
    let n = values.len();
    let std = if n > 1 {
        (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    Some(Describe {
        count: n,
        mean: m,
        std,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        q1: quantile(values, 0.25)?,
        median: quantile(values, 0.5)?,
        q3: quantile(values, 0.75)?,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Percentage of all `n_rows` rows outside the Tukey fences, rounded to 2 decimals.
fn outlier_share(values: &[f64], n_rows: usize, q1: f64, q3: f64) -> f64 {
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let outliers = values.iter().filter(|&&v| v < lower || v > upper).count();
    let pct = outliers as f64 / n_rows as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}
