// ============================================================
// Layer 5 - Linear Regressor (ridge, closed form)
// ============================================================
// ŷ = x·w + b
//
// Training solves the ridge normal equations on centred data
// so the intercept is never penalised:
//
//   x̄, ȳ           column means of the training partition
//   Xc = X - x̄     yc = y - ȳ
//   (Xcᵀ Xc + αI) w = Xcᵀ yc
//   b = ȳ - x̄·w
//
// The system is symmetric positive definite for α > 0, so
// Gaussian elimination with partial pivoting always succeeds.
// With α = 0 a singular system is reported as a numerical
// error instead of producing NaN weights.
//
// Training is fully deterministic: same data, same weights.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::traits::RegressionModel;
use crate::domain::AgriError;

const PIVOT_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    alpha: f64,
    coefficients: Array1<f64>,
    intercept: f64,
    fitted: bool,
}

impl LinearRegressor {
    /// Create an unfitted regressor with L2 penalty `alpha` (≥ 0).
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.max(0.0),
            coefficients: Array1::zeros(0),
            intercept: 0.0,
            fitted: false,
        }
    }

}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl RegressionModel for LinearRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), AgriError> {
        let (n, p) = x.dim();
        if n == 0 || n != y.len() {
            return Err(AgriError::InvalidInput(format!(
                "cannot fit on {} rows with {} targets",
                n,
                y.len()
            )));
        }

        let x_mean = x.sum_axis(Axis(0)) / n as f64;
        let y_mean = y.sum() / n as f64;
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for j in 0..p {
            gram[[j, j]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);

        let w = solve(gram, rhs)?;
        self.intercept = y_mean - x_mean.dot(&w);
        self.coefficients = w;
        self.fitted = true;

        tracing::debug!(
            "LinearRegressor fitted: {} rows, {} features, alpha={}, intercept={:.4}",
            n,
            p,
            self.alpha,
            self.intercept
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, AgriError> {
        if !self.fitted {
            return Err(AgriError::InvalidInput("model has not been fitted".to_string()));
        }
        if x.ncols() != self.coefficients.len() {
            return Err(AgriError::InvalidInput(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, AgriError> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() < PIVOT_EPS {
            return Err(AgriError::Numerical(format!(
                "singular normal equations at column {col}; use a positive ridge alpha"
            )));
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(AgriError::Numerical("non-finite regression weights".to_string()));
    }
    Ok(x)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_exact_linear_relation() {
        // y = 2·x0 - 3·x1 + 5
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0], [4.0, 5.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) - x.column(1).mapv(|v| 3.0 * v) + 5.0;

        let mut model = LinearRegressor::new(0.0);
        model.fit(&x, &y).unwrap();

        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 3.0).abs() < 1e-9);
        assert!((model.intercept - 5.0).abs() < 1e-9);
        assert!((model.score(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ridge_handles_constant_column() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let y = array![2.0, 4.0, 6.0];
        let mut model = LinearRegressor::new(1e-3);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.coefficients[1], 0.0);
        let p = model.predict(&array![[4.0, 0.0]]).unwrap();
        assert!((p[0] - 8.0).abs() < 1e-2);
    }

    #[test]
    fn test_singular_without_ridge_fails() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = LinearRegressor::new(0.0);
        assert!(matches!(model.fit(&x, &y), Err(AgriError::Numerical(_))));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegressor::default();
        assert!(model.predict(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_predict_width_mismatch() {
        let mut model = LinearRegressor::new(0.0);
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(model.predict(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.3, 1.7], [1.1, 0.2], [2.9, 2.2], [3.3, 1.4]];
        let y = array![1.0, 2.5, 3.1, 4.8];
        let mut a = LinearRegressor::default();
        let mut b = LinearRegressor::default();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        for (wa, wb) in a.coefficients.iter().zip(&b.coefficients) {
            assert_eq!(wa.to_bits(), wb.to_bits());
        }
        assert_eq!(a.intercept.to_bits(), b.intercept.to_bits());
    }
}
