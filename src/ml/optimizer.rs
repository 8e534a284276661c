// ============================================================
// Layer 5 - Input Optimizer (constrained grid search)
// ============================================================
// Finds the fertilizer / irrigation / pesticide levels that
// maximise predicted yield for a fixed field description.
//
// Two fixed formulas derive the remaining inputs:
//
//   cost(f,i,p)        = 0.50165·f + 0.20026·i + 0.14837·p + 20.19
//   environment(f,i,p) = 0.60055·f + 0.30009·i + 0.04946·p + 6.73
//
// Default search space (half-open ranges):
//
//   fertilizer  [0, 400) step 10   40 values   outer loop
//   irrigation  [0, 400) step 10   40 values   middle loop
//   pesticide   [0, 300) step 10   30 values   inner loop
//                                  ─────────
//                                  48 000 candidates
//
// A candidate with cost > 12000 or environment > 10000 is
// skipped without being scored. Feasible candidates are scored
// in batches on the rayon pool; each batch is one replay and
// one predict call.
//
// Winner: highest finite yield; among equal yields the lowest
// enumeration index. Batches come back in index order and are
// folded with a strict comparison, so the result never depends
// on thread scheduling.
//
// No feasible candidate is not an error: the result carries
// `best: None` and the NO_FEASIBLE_YIELD sentinel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::inputs::{ENVIRONMENTAL_SCORE, FERTILIZER, INPUT_COST, IRRIGATION, PESTICIDE};
use crate::domain::traits::RegressionModel;
use crate::domain::{AgriError, FeatureRow};
use crate::ml::bundle::ArtifactBundle;
use crate::ml::replay::PipelineReplay;

/// Reported as the yield when no candidate is feasible.
pub const NO_FEASIBLE_YIELD: f64 = -1.0;

const BATCH_SIZE: usize = 2048;

/// Upper bound on grid size; the default grid has 48,000 points.
pub const MAX_CANDIDATES: usize = 10_000_000;

pub fn input_cost(fertilizer: f64, irrigation: f64, pesticide: f64) -> f64 {
    0.50165 * fertilizer + 0.20026 * irrigation + 0.14837 * pesticide + 20.19
}

pub fn environmental_score(fertilizer: f64, irrigation: f64, pesticide: f64) -> f64 {
    0.60055 * fertilizer + 0.30009 * irrigation + 0.04946 * pesticide + 6.73
}

/// Evenly spaced values `start, start + step, ...` strictly below `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl GridAxis {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn validate(&self, name: &str) -> Result<(), AgriError> {
        let finite = self.start.is_finite() && self.stop.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 {
            return Err(AgriError::InvalidInput(format!(
                "{name} axis needs finite bounds and a positive step, got {:?}",
                self
            )));
        }
        if (self.stop - self.start) / self.step > MAX_CANDIDATES as f64 {
            return Err(AgriError::InvalidInput(format!(
                "{name} axis has more than {MAX_CANDIDATES} values, got {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Number of values; 0 for an axis that fails `validate`.
    pub fn len(&self) -> usize {
        let span = (self.stop - self.start) / self.step;
        if !span.is_finite() || self.step <= 0.0 || span <= 0.0 || span > MAX_CANDIDATES as f64 {
            return 0;
        }
        let mut n = span.ceil() as usize;
        while n > 0 && self.value(n - 1) >= self.stop {
            n -= 1;
        }
        n
    }

    pub fn value(&self, k: usize) -> f64 {
        self.start + k as f64 * self.step
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub fertilizer: GridAxis,
    pub irrigation: GridAxis,
    pub pesticide: GridAxis,
    pub max_cost: f64,
    pub max_environment: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fertilizer: GridAxis::new(0.0, 400.0, 10.0),
            irrigation: GridAxis::new(0.0, 400.0, 10.0),
            pesticide: GridAxis::new(0.0, 300.0, 10.0),
            max_cost: 12_000.0,
            max_environment: 10_000.0,
        }
    }
}

impl OptimizerConfig {
    /// Grid size, saturating at `usize::MAX`.
    pub fn n_candidates(&self) -> usize {
        self.fertilizer
            .len()
            .saturating_mul(self.irrigation.len())
            .saturating_mul(self.pesticide.len())
    }

    /// Check every axis and the size of the whole grid.
    pub fn validate(&self) -> Result<(), AgriError> {
        self.fertilizer.validate("fertilizer")?;
        self.irrigation.validate("irrigation")?;
        self.pesticide.validate("pesticide")?;
        let total = self.n_candidates();
        if total > MAX_CANDIDATES {
            return Err(AgriError::InvalidInput(format!(
                "search grid has {total} candidates, the limit is {MAX_CANDIDATES}"
            )));
        }
        Ok(())
    }

    /// Candidate at a flat index in (fertilizer, irrigation, pesticide) nested order.
    pub fn candidate(&self, index: usize) -> Candidate {
        let n_p = self.pesticide.len();
        let n_i = self.irrigation.len();
        let f = self.fertilizer.value(index / (n_i * n_p));
        let i = self.irrigation.value((index / n_p) % n_i);
        let p = self.pesticide.value(index % n_p);
        Candidate::new(f, i, p)
    }

    pub fn is_feasible(&self, c: &Candidate) -> bool {
        c.input_cost <= self.max_cost && c.environmental_score <= self.max_environment
    }
}

/// One point of the search grid with its derived inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub fertilizer: f64,
    pub irrigation: f64,
    pub pesticide: f64,
    pub input_cost: f64,
    pub environmental_score: f64,
}

impl Candidate {
    pub fn new(fertilizer: f64, irrigation: f64, pesticide: f64) -> Self {
        Self {
            fertilizer,
            irrigation,
            pesticide,
            input_cost: input_cost(fertilizer, irrigation, pesticide),
            environmental_score: environmental_score(fertilizer, irrigation, pesticide),
        }
    }

    /// The base row with this candidate's five inputs written in.
    pub fn apply_to(&self, base: &FeatureRow) -> FeatureRow {
        let mut row = base.clone();
        row.insert(FERTILIZER, self.fertilizer);
        row.insert(IRRIGATION, self.irrigation);
        row.insert(PESTICIDE, self.pesticide);
        row.insert(INPUT_COST, self.input_cost);
        row.insert(ENVIRONMENTAL_SCORE, self.environmental_score);
        row
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub best: Option<Candidate>,
    /// `NO_FEASIBLE_YIELD` when `best` is None.
    pub predicted_yield: f64,
    pub feature_row: Option<FeatureRow>,
    pub evaluated: usize,
    pub feasible: usize,
}

impl OptimizationResult {
    fn none(evaluated: usize, feasible: usize) -> Self {
        Self {
            best: None,
            predicted_yield: NO_FEASIBLE_YIELD,
            feature_row: None,
            evaluated,
            feasible,
        }
    }

    pub fn found(&self) -> bool {
        self.best.is_some()
    }
}

pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Search the grid for the yield-maximising candidate.
    pub fn optimize<M>(
        &self,
        bundle: &ArtifactBundle<M>,
        base: &FeatureRow,
    ) -> Result<OptimizationResult, AgriError>
    where
        M: RegressionModel + Sync,
    {
        let cfg = &self.config;
        cfg.validate()?;

        let replay = PipelineReplay::new(bundle);
        let total = cfg.n_candidates();
        if total > 0 {
            replay.validate_row(&cfg.candidate(0).apply_to(base))?;
        }

        let feasible: Vec<usize> = (0..total)
            .filter(|&k| cfg.is_feasible(&cfg.candidate(k)))
            .collect();
        tracing::info!("Optimizer: {} of {} candidates feasible", feasible.len(), total);
        if feasible.is_empty() {
            tracing::warn!(
                "No feasible candidate under cost ≤ {} and environment ≤ {}",
                cfg.max_cost,
                cfg.max_environment
            );
            return Ok(OptimizationResult::none(0, 0));
        }

        let batch_winners = feasible
            .par_chunks(BATCH_SIZE)
            .map(|chunk| best_in_batch(&replay, &bundle.model, cfg, base, chunk))
            .collect::<Result<Vec<_>, AgriError>>()?;

        let mut best: Option<(f64, usize)> = None;
        for (y, k) in batch_winners.into_iter().flatten() {
            if best.map_or(true, |(b, _)| y > b) {
                best = Some((y, k));
            }
        }

        let Some((predicted_yield, index)) = best else {
            tracing::warn!("Model produced no finite prediction for any feasible candidate");
            return Ok(OptimizationResult::none(feasible.len(), feasible.len()));
        };
        let candidate = cfg.candidate(index);
        tracing::info!(
            "Best inputs: fertilizer={} irrigation={} pesticide={} → yield {:.2}",
            candidate.fertilizer,
            candidate.irrigation,
            candidate.pesticide,
            predicted_yield
        );
        Ok(OptimizationResult {
            best: Some(candidate),
            predicted_yield,
            feature_row: Some(candidate.apply_to(base)),
            evaluated: feasible.len(),
            feasible: feasible.len(),
        })
    }
}

/// Highest finite prediction in one batch, first index on ties.
fn best_in_batch<M: RegressionModel>(
    replay: &PipelineReplay<'_>,
    model: &M,
    cfg: &OptimizerConfig,
    base: &FeatureRow,
    indices: &[usize],
) -> Result<Option<(f64, usize)>, AgriError> {
    let rows: Vec<FeatureRow> = indices.iter().map(|&k| cfg.candidate(k).apply_to(base)).collect();
    let x = replay.transform(&rows)?;
    let yields = model.predict(&x)?;

    let mut best: Option<(f64, usize)> = None;
    for (&y, &k) in yields.iter().zip(indices) {
        if y.is_finite() && best.map_or(true, |(b, _)| y > b) {
            best = Some((y, k));
        }
    }
    Ok(best)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::CategoricalEncoder;
    use crate::data::scaler::FeatureScaler;
    use crate::ml::bundle::{BundleMeta, FeatureOrder};
    use crate::ml::trainer::TrainConfig;
    use ndarray::{Array1, Array2};

    /// y = x · w, on unscaled inputs.
    #[derive(Debug, Clone)]
    struct Weighted(Array1<f64>);

    impl RegressionModel for Weighted {
        fn fit(&mut self, _: &Array2<f64>, _: &Array1<f64>) -> Result<(), AgriError> {
            Ok(())
        }
        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, AgriError> {
            Ok(x.dot(&self.0))
        }
        fn n_features(&self) -> usize {
            self.0.len()
        }
    }

    // rain, fertilizer, irrigation, pesticide, cost, environment
    fn bundle(weights: [f64; 6]) -> ArtifactBundle<Weighted> {
        ArtifactBundle {
            meta: BundleMeta::new(TrainConfig::default(), 1.0),
            feature_order: FeatureOrder::new(
                ["rain", FERTILIZER, IRRIGATION, PESTICIDE, INPUT_COST, ENVIRONMENTAL_SCORE]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            encoder: CategoricalEncoder::default(),
            scaler: FeatureScaler::identity(6),
            model: Weighted(Array1::from(weights.to_vec())),
        }
    }

    fn constant(value: f64) -> ArtifactBundle<Weighted> {
        // rain is fixed at 1.0 in the base row, so this is a constant model
        bundle([value, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    fn base() -> FeatureRow {
        FeatureRow::new().with("rain", 1.0)
    }

    #[test]
    fn test_default_grid_size() {
        let cfg = OptimizerConfig::default();
        assert_eq!(cfg.fertilizer.len(), 40);
        assert_eq!(cfg.pesticide.len(), 30);
        assert_eq!(cfg.n_candidates(), 48_000);
    }

    #[test]
    fn test_candidate_enumeration_order() {
        let cfg = OptimizerConfig::default();
        let c = cfg.candidate(1);
        assert_eq!((c.fertilizer, c.irrigation, c.pesticide), (0.0, 0.0, 10.0));
        let c = cfg.candidate(30);
        assert_eq!((c.fertilizer, c.irrigation, c.pesticide), (0.0, 10.0, 0.0));
        let c = cfg.candidate(47_999);
        assert_eq!((c.fertilizer, c.irrigation, c.pesticide), (390.0, 390.0, 290.0));
    }

    #[test]
    fn test_constant_model_picks_first_candidate() {
        let result = Optimizer::new(OptimizerConfig::default())
            .optimize(&constant(500.0), &base())
            .unwrap();
        let best = result.best.unwrap();
        assert_eq!((best.fertilizer, best.irrigation, best.pesticide), (0.0, 0.0, 0.0));
        assert_eq!(best.input_cost, 20.19);
        assert_eq!(result.predicted_yield, 500.0);
        assert_eq!(result.feasible, 48_000);
        let row = result.feature_row.unwrap();
        assert_eq!(row.numeric(INPUT_COST), Some(20.19));
    }

    #[test]
    fn test_constraints_bound_the_winner() {
        // reward fertilizer, punish pesticide, ignore irrigation
        let cfg = OptimizerConfig { max_cost: 100.0, ..OptimizerConfig::default() };
        let result = Optimizer::new(cfg.clone())
            .optimize(&bundle([0.0, 1.0, 0.0, -1.0, 0.0, 0.0]), &base())
            .unwrap();
        let best = result.best.unwrap();
        assert_eq!((best.fertilizer, best.irrigation, best.pesticide), (150.0, 0.0, 0.0));
        assert!(cfg.is_feasible(&best));
        assert!(result.feasible < 48_000);
    }

    #[test]
    fn test_no_feasible_candidate_returns_sentinel() {
        let cfg = OptimizerConfig { max_cost: 20.0, ..OptimizerConfig::default() };
        let result = Optimizer::new(cfg).optimize(&constant(500.0), &base()).unwrap();
        assert!(!result.found());
        assert_eq!(result.predicted_yield, NO_FEASIBLE_YIELD);
        assert!(result.feature_row.is_none());
    }

    #[test]
    fn test_non_finite_predictions_are_never_selected() {
        let result = Optimizer::new(OptimizerConfig::default())
            .optimize(&constant(f64::NAN), &base())
            .unwrap();
        assert!(result.best.is_none());
        assert_eq!(result.predicted_yield, NO_FEASIBLE_YIELD);
    }

    #[test]
    fn test_absent_crop_type_zero_fills_its_block() {
        let crops: Vec<FeatureRow> = ["maize", "rice", "wheat"]
            .iter()
            .map(|c| FeatureRow::new().with("crop_type", *c))
            .collect();
        let mut b = bundle([0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        b.encoder = CategoricalEncoder::fit(&crops, &["crop_type".to_string()]).unwrap();
        let mut order = b.feature_order.columns().to_vec();
        order.extend(b.encoder.output_columns());
        b.feature_order = FeatureOrder::new(order);
        b.scaler = FeatureScaler::identity(8);
        b.model = Weighted(Array1::from(vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 100.0, 100.0]));
        b.validate().unwrap();

        let opt = Optimizer::new(OptimizerConfig::default());
        let absent = opt.optimize(&b, &base()).unwrap();
        let reference = opt.optimize(&b, &base().with("crop_type", "maize")).unwrap();
        let rice = opt.optimize(&b, &base().with("crop_type", "rice")).unwrap();

        let best = absent.best.unwrap();
        assert_eq!((best.fertilizer, best.irrigation, best.pesticide), (390.0, 0.0, 0.0));
        assert_eq!(absent.predicted_yield, 390.0);
        assert_eq!(absent.predicted_yield.to_bits(), reference.predicted_yield.to_bits());
        assert_eq!(rice.predicted_yield, 490.0);
        assert!(!absent.feature_row.unwrap().contains("crop_type"));
    }

    #[test]
    fn test_missing_base_feature_is_invalid_input() {
        let err = Optimizer::new(OptimizerConfig::default())
            .optimize(&constant(1.0), &FeatureRow::new())
            .unwrap_err();
        assert!(matches!(err, AgriError::InvalidInput(_)));
    }

    #[test]
    fn test_search_is_deterministic() {
        let b = bundle([0.0, 0.3, 0.2, 0.1, -0.4, -0.2]);
        let opt = Optimizer::new(OptimizerConfig::default());
        let a = opt.optimize(&b, &base()).unwrap();
        let c = opt.optimize(&b, &base()).unwrap();
        assert_eq!(a.best, c.best);
        assert_eq!(a.predicted_yield.to_bits(), c.predicted_yield.to_bits());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let tiny_step = OptimizerConfig {
            fertilizer: GridAxis::new(0.0, 400.0, 1e-300),
            ..OptimizerConfig::default()
        };
        assert_eq!(tiny_step.fertilizer.len(), 0);
        assert!(matches!(tiny_step.validate(), Err(AgriError::InvalidInput(_))));

        // each axis is within bounds, their product is not
        let fine = GridAxis::new(0.0, 1.0, 1e-3);
        let wide = OptimizerConfig {
            fertilizer: fine,
            irrigation: fine,
            pesticide: fine,
            ..OptimizerConfig::default()
        };
        assert_eq!(wide.n_candidates(), 1_000_000_000);
        assert!(matches!(
            Optimizer::new(wide).optimize(&constant(1.0), &base()),
            Err(AgriError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bad_step_is_rejected() {
        let cfg = OptimizerConfig {
            pesticide: GridAxis::new(0.0, 300.0, 0.0),
            ..OptimizerConfig::default()
        };
        assert!(Optimizer::new(cfg).optimize(&constant(1.0), &base()).is_err());
    }
}
