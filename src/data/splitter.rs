// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Shuffles row indices and splits them into two partitions:
//   - Training set: used to fit the regression model
//   - Test set:     used to report held-out goodness of fit
//
// Why seed the shuffle?
//   Retraining on the same file must reproduce the same split,
//   otherwise two runs report different accuracy for reasons
//   that have nothing to do with the data. The RNG is ChaCha8
//   seeded from a fixed constant, whose output stream does not
//   depend on platform or thread.
//
// Sizes follow the usual convention:
//   n_test  = ceil(test_fraction × n)
//   n_train = n - n_test
// and the first n_test shuffled indices form the test set.
//
// Reference: rand / rand_chacha crate documentation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::AgriError;

/// Fixed seed used for every training split.
pub const SPLIT_SEED: u64 = 42;

/// Row indices of the two partitions, each in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Deterministically split `n` row indices into (train, test).
///
/// Fails with `InvalidInput` if the fraction is outside (0, 1) or if
/// either partition would be empty.
pub fn split_train_test(n: usize, test_fraction: f64, seed: u64) -> Result<Split, AgriError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AgriError::InvalidInput(format!(
            "test fraction {test_fraction} must lie strictly between 0 and 1"
        )));
    }

    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AgriError::InvalidInput(format!(
            "{n} rows cannot be split with test fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    let test = indices;

    tracing::debug!(
        "Dataset split: {} training, {} test (seed {})",
        train.len(),
        test.len(),
        seed
    );

    Ok(Split { train, test })
}
