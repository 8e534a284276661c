// ============================================================
// Layer 4 - Tabular Dataset
// ============================================================
// An ordered list of typed columns plus the rows that fill
// them. A missing cell is simply an absent key in the row.
//
// Column kinds are fixed when the dataset is built: a column
// is categorical as soon as one present cell is text.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{AgriError, FeatureRow, FeatureValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<FeatureRow>,
}

impl Dataset {
    /// Build a dataset from explicit column names, inferring each kind
    /// from the cells actually present.
    pub fn from_rows(names: Vec<String>, rows: Vec<FeatureRow>) -> Self {
        let columns = names
            .into_iter()
            .map(|name| {
                let categorical = rows
                    .iter()
                    .any(|r| matches!(r.get(&name), Some(FeatureValue::Categorical(_))));
                let kind = if categorical { ColumnKind::Categorical } else { ColumnKind::Numeric };
                Column { name, kind }
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.kind(name).is_some()
    }

    /// Names of columns of the given kind, in dataset order.
    pub fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Every cell of a numeric column; `None` marks a missing cell.
    pub fn numeric_column(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.numeric(name)).collect()
    }

    /// Count of absent cells per column, in dataset order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .map(|c| {
                let n = self.rows.iter().filter(|r| !r.contains(&c.name)).count();
                (c.name.clone(), n)
            })
            .collect()
    }

    /// Split off one column, returning the remaining dataset and its values.
    pub fn take_column(mut self, name: &str) -> Result<(Dataset, Vec<Option<FeatureValue>>), AgriError> {
        if !self.has_column(name) {
            return Err(AgriError::InvalidTarget(name.to_string()));
        }
        self.columns.retain(|c| c.name != name);
        let values = self.rows.iter_mut().map(|r| r.remove(name)).collect();
        Ok((self, values))
    }

    /// Drop a column if present; a no-op otherwise.
    pub fn without_column(mut self, name: &str) -> Dataset {
        self.columns.retain(|c| c.name != name);
        for row in &mut self.rows {
            row.remove(name);
        }
        self
    }

    /// Replace the column list (used when a step derives new columns).
    pub fn with_columns(self, columns: Vec<Column>) -> Dataset {
        Dataset { columns, rows: self.rows }
    }

    pub fn rows_mut(&mut self) -> &mut [FeatureRow] {
        &mut self.rows
    }

    /// Write the dataset as CSV with a header row. Missing cells are empty.
    pub fn write_csv(&self, path: &Path) -> Result<(), AgriError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in &self.rows {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|c| match row.get(&c.name) {
                    Some(FeatureValue::Numeric(v)) => v.to_string(),
                    Some(FeatureValue::Categorical(s)) => s.clone(),
                    None => String::new(),
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
