// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between a CSV file on disk and the numeric
// design matrix the model is trained on.
//
//   CSV file
//       │
//       ▼
//   CsvLoader          → typed Dataset (numeric / categorical)
//       │
//       ▼
//   Preprocessor       → date features + missing-value fill
//       │
//       ▼
//   CategoricalEncoder → one-hot blocks, first level dropped
//       │
//       ▼
//   FeatureScaler      → z-score per column
//       │
//       ▼
//   split_train_test   → deterministic train / test indices
//
// Each module is responsible for exactly one step, so each
// step is independently testable. DatasetProfile sits beside
// the pipeline and only reads.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Typed in-memory table
pub mod dataset;

/// CSV reading with per-column type inference
pub mod loader;

/// Date expansion and imputation
pub mod preprocessor;

/// Descriptive statistics report
pub mod profile;

/// One-hot encoding of categorical columns
pub mod encoder;

/// Z-score standardisation
pub mod scaler;

/// Seeded train/test partition
pub mod splitter;
