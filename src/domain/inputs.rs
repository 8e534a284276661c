// ============================================================
// Layer 3 - Typed Request Payloads
// ============================================================
// The two payload shapes the outside world sends in:
//
//   PredictionInput    every schema field is required
//   OptimizationBase   same schema minus the five fields the
//                      optimizer owns (three decision variables
//                      and the two values derived from them)
//
// Both flatten into a FeatureRow before they reach the ML
// layer. Extra columns a dataset may carry travel in `extra`
// so the schema can grow without touching this file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::error::AgriError;
use crate::domain::feature_row::{FeatureRow, FeatureValue};

pub const FERTILIZER: &str = "fertilizer_kg_per_ha";
pub const IRRIGATION: &str = "irrigation_mm";
pub const PESTICIDE: &str = "pesticide_ml";
pub const INPUT_COST: &str = "input_cost_total";
pub const ENVIRONMENTAL_SCORE: &str = "environmental_score";
pub const CROP_TYPE: &str = "crop_type";
pub const DEFAULT_TARGET: &str = "yield_kg_per_ha";

/// Columns the optimizer fills in for every candidate.
pub const OPTIMIZER_OWNED: [&str; 5] =
    [FERTILIZER, IRRIGATION, PESTICIDE, INPUT_COST, ENVIRONMENTAL_SCORE];

/// What happens when a categorical feature is left out of a row.
///
/// The only policy is `ZeroFill`: the feature's whole one-hot block
/// is written as zeros, exactly as for a category never seen in
/// training. Numeric features have no such default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoricalAbsence {
    #[default]
    ZeroFill,
}

/// A full feature row for a single yield prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct PredictionInput {
    pub soil_pH: f64,
    pub soil_N: f64,
    pub soil_P: f64,
    pub rainfall_mm: f64,
    pub temp_avg: f64,
    pub fertilizer_kg_per_ha: f64,
    pub irrigation_mm: f64,
    pub pesticide_ml: f64,
    pub input_cost_total: f64,
    pub environmental_score: f64,
    pub month: u32,
    pub day_of_year: u32,
    pub crop_type: String,
    pub year: i32,
    #[serde(flatten, default)]
    pub extra: IndexMap<String, FeatureValue>,
}

impl PredictionInput {
    pub fn validate(&self) -> Result<(), AgriError> {
        check_calendar(self.month, self.day_of_year, self.year)?;
        let numeric = [
            ("soil_pH", self.soil_pH),
            ("soil_N", self.soil_N),
            ("soil_P", self.soil_P),
            ("rainfall_mm", self.rainfall_mm),
            ("temp_avg", self.temp_avg),
            (FERTILIZER, self.fertilizer_kg_per_ha),
            (IRRIGATION, self.irrigation_mm),
            (PESTICIDE, self.pesticide_ml),
            (INPUT_COST, self.input_cost_total),
            (ENVIRONMENTAL_SCORE, self.environmental_score),
        ];
        check_finite(&numeric)
    }

    /// Validate and flatten into a row in schema order.
    pub fn into_row(self) -> Result<FeatureRow, AgriError> {
        self.validate()?;
        let mut row = FeatureRow::new()
            .with("soil_pH", self.soil_pH)
            .with("soil_N", self.soil_N)
            .with("soil_P", self.soil_P)
            .with("rainfall_mm", self.rainfall_mm)
            .with("temp_avg", self.temp_avg)
            .with(FERTILIZER, self.fertilizer_kg_per_ha)
            .with(IRRIGATION, self.irrigation_mm)
            .with(PESTICIDE, self.pesticide_ml)
            .with(INPUT_COST, self.input_cost_total)
            .with(ENVIRONMENTAL_SCORE, self.environmental_score)
            .with("month", f64::from(self.month))
            .with("day_of_year", f64::from(self.day_of_year))
            .with(CROP_TYPE, self.crop_type)
            .with("year", f64::from(self.year));
        for (k, v) in self.extra {
            row.insert(k, v);
        }
        Ok(row)
    }
}

/// The fixed, non-optimizable part of an optimization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct OptimizationBase {
    pub soil_pH: f64,
    pub soil_N: f64,
    pub soil_P: f64,
    pub rainfall_mm: f64,
    pub temp_avg: f64,
    pub month: u32,
    pub day_of_year: u32,
    pub year: i32,
    /// Optional under `CategoricalAbsence::ZeroFill`.
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(flatten, default)]
    pub extra: IndexMap<String, FeatureValue>,
}

impl OptimizationBase {
    pub const CATEGORICAL_ABSENCE: CategoricalAbsence = CategoricalAbsence::ZeroFill;

    pub fn validate(&self) -> Result<(), AgriError> {
        check_calendar(self.month, self.day_of_year, self.year)?;
        check_finite(&[
            ("soil_pH", self.soil_pH),
            ("soil_N", self.soil_N),
            ("soil_P", self.soil_P),
            ("rainfall_mm", self.rainfall_mm),
            ("temp_avg", self.temp_avg),
        ])?;
        if let Some(owned) = self.extra.keys().find(|k| OPTIMIZER_OWNED.contains(&k.as_str())) {
            return Err(AgriError::InvalidInput(format!(
                "'{owned}' is chosen by the optimizer and must not be supplied"
            )));
        }
        Ok(())
    }

    /// Validate and flatten. A missing `crop_type` is simply left out.
    pub fn into_row(self) -> Result<FeatureRow, AgriError> {
        self.validate()?;
        let mut row = FeatureRow::new()
            .with("soil_pH", self.soil_pH)
            .with("soil_N", self.soil_N)
            .with("soil_P", self.soil_P)
            .with("rainfall_mm", self.rainfall_mm)
            .with("temp_avg", self.temp_avg)
            .with("month", f64::from(self.month))
            .with("day_of_year", f64::from(self.day_of_year))
            .with("year", f64::from(self.year));
        match (self.crop_type, Self::CATEGORICAL_ABSENCE) {
            (Some(crop), _) => row.insert(CROP_TYPE, crop),
            // leaving the key out yields an all-zero one-hot block on replay
            (None, CategoricalAbsence::ZeroFill) => {}
        }
        for (k, v) in self.extra {
            row.insert(k, v);
        }
        Ok(row)
    }
}

fn check_calendar(month: u32, day_of_year: u32, year: i32) -> Result<(), AgriError> {
    if !(1..=12).contains(&month) {
        return Err(AgriError::InvalidInput(format!("month {month} outside 1..=12")));
    }
    if !(1..=366).contains(&day_of_year) {
        return Err(AgriError::InvalidInput(format!(
            "day_of_year {day_of_year} outside 1..=366"
        )));
    }
    if !(2000..=2100).contains(&year) {
        return Err(AgriError::InvalidInput(format!("year {year} outside 2000..=2100")));
    }
    Ok(())
}

fn check_finite(fields: &[(&str, f64)]) -> Result<(), AgriError> {
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(AgriError::InvalidInput(format!("{name} is not finite ({v})"))),
        None => Ok(()),
    }
}
