// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the trainer, the prediction engine and the optimizer never
// name a particular regression algorithm. Any type offering
// the three operations below can be trained, persisted in a
// bundle and replayed.
//
//   LinearRegressor  → ridge regression in closed form
//   (tests)          → constant / hand-written models
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use ndarray::{Array1, Array2};

use crate::domain::error::AgriError;

// ─── RegressionModel ──────────────────────────────────────────────────────────
/// A regression function over a fixed-width standardised feature vector.
pub trait RegressionModel {
    /// Learn parameters from a design matrix and its targets.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), AgriError>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, AgriError>;

    /// Width of the feature vector the fitted model expects.
    fn n_features(&self) -> usize;

    /// Goodness of fit on held-out data. Defaults to R².
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64, AgriError> {
        let predicted = self.predict(x)?;
        r2_score(y, &predicted)
    }
}

/// Coefficient of determination, 1 - SS_res / SS_tot.
///
/// A constant target gives SS_tot = 0; the score is then 1.0 for a
/// perfect fit and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, AgriError> {
    if y_true.len() != y_pred.len() {
        return Err(AgriError::InvalidInput(format!(
            "r2_score: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(AgriError::InvalidInput("r2_score on empty data".to_string()));
    }
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_r2_perfect() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_r2_mean_predictor_is_zero() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert!(r2_score(&y, &p).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![4.0, 4.0];
        assert_eq!(r2_score(&y, &array![4.0, 4.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&y, &array![3.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_r2_length_mismatch() {
        assert!(r2_score(&array![1.0], &array![1.0, 2.0]).is_err());
    }
}
