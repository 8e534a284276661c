// ============================================================
// Layer 3 - Feature Values and Rows
// ============================================================
// A dataset row is an ordered mapping from column name to a
// cell. Cells are either numeric or categorical; the encoder
// only ever looks at categorical cells and the scaler only at
// numeric ones.
//
// Column order is kept (IndexMap) so that "the numeric columns
// in dataset order" is a well defined sequence when the
// training layout is built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One cell of a tabular row.
///
/// Untagged so a JSON row such as
/// `{"soil_pH": 6.5, "crop_type": "wheat"}` deserialises directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s.as_str()),
            FeatureValue::Numeric(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Numeric(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Categorical(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Categorical(s)
    }
}

/// A named, ordered row of cells. Absent keys mean "missing".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow {
    cells: IndexMap<String, FeatureValue>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy in tests and fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or overwrite a cell. Overwriting keeps the original position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FeatureValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.cells.get(column)
    }

    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FeatureValue::as_numeric)
    }

    pub fn category(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(FeatureValue::as_category)
    }

    /// Remove a cell, preserving the order of the remaining ones.
    pub fn remove(&mut self, column: &str) -> Option<FeatureValue> {
        self.cells.shift_remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }
}
