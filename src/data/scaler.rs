// ============================================================
// Layer 4 - Feature Scaler (z-score standardisation)
// ============================================================
// z = (x - mean) / std, per column, with statistics computed
// once over the full training design matrix.
//
// std is the population standard deviation (ddof = 0).
//
// Zero-variance policy: a column that is constant in training
// data gets a scale of 1.0, so it maps to exactly 0.0 at
// training time and to (x - mean) afterwards. No division by
// zero, no NaN in the design matrix.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::AgriError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl FeatureScaler {
    /// Compute per-column mean and scale.
    pub fn fit(x: &Array2<f64>) -> Result<Self, AgriError> {
        if x.nrows() == 0 {
            return Err(AgriError::InvalidInput(
                "cannot fit scaler on empty data".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AgriError::Numerical(
                "design matrix contains non-finite values".to_string(),
            ));
        }

        let n = x.nrows() as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let std: Array1<f64> = x
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(col, &m)| (col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt())
            .collect();

        let n_constant = std.iter().filter(|&&s| s == 0.0).count();
        if n_constant > 0 {
            tracing::debug!("Scaler: {} constant column(s) given unit scale", n_constant);
        }
        let scale = std.mapv(|s| if s == 0.0 { 1.0 } else { s });

        Ok(Self { mean, scale })
    }

    /// A pass-through scaler: mean 0, scale 1.
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: Array1::zeros(n_features),
            scale: Array1::ones(n_features),
        }
    }

    pub fn fit_transform(x: &Array2<f64>) -> Result<(Self, Array2<f64>), AgriError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    /// Standardise with the fitted statistics. Width must match.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, AgriError> {
        if x.ncols() != self.n_features() {
            return Err(AgriError::InvalidInput(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok((x - &self.mean) / &self.scale)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standardises_columns() {
        let x = array![[1.0, 10.0], [3.0, 30.0]];
        let (scaler, z) = FeatureScaler::fit_transform(&x).unwrap();
        assert_eq!(scaler.mean.to_vec(), vec![2.0, 20.0]);
        assert_eq!(scaler.scale.to_vec(), vec![1.0, 10.0]);
        assert_eq!(z, array![[-1.0, -1.0], [1.0, 1.0]]);
    }

    #[test]
    fn test_zero_variance_uses_unit_scale() {
        let x = array![[5.0, 1.0], [5.0, 3.0]];
        let (scaler, z) = FeatureScaler::fit_transform(&x).unwrap();
        assert_eq!(scaler.scale[0], 1.0);
        assert_eq!(z.column(0).to_vec(), vec![0.0, 0.0]);

        let later = scaler.transform(&array![[7.0, 2.0]]).unwrap();
        assert_eq!(later[[0, 0]], 2.0);
        assert!(later.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = FeatureScaler::fit(&array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(AgriError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_fit_fails() {
        assert!(FeatureScaler::fit(&Array2::zeros((0, 3))).is_err());
    }

    #[test]
    fn test_non_finite_fit_fails() {
        assert!(FeatureScaler::fit(&array![[f64::NAN]]).is_err());
    }
}
