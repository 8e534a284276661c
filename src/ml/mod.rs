// ============================================================
// Layer 5 - ML Layer
// ============================================================
// Everything that consumes or produces a trained model.
//
//   model.rs      ridge LinearRegressor (closed form)
//   bundle.rs     the four artifacts of one training run
//   trainer.rs    dataset → bundle, published via the store
//   replay.rs     raw rows → model input, shared by every
//                 consumer below
//   inferencer.rs single-row prediction
//   optimizer.rs  constrained grid search over farm inputs
//   explain.rs    per-feature contribution report
//
// Nothing outside this layer builds a model input matrix by
// hand. If a caller needs one, it goes through PipelineReplay.
//
// Reference: Rust Book §10 (Generic Types, Traits)

/// Ridge regression
pub mod model;

/// Artifact bundle and feature order
pub mod bundle;

/// Training pipeline
pub mod trainer;

/// Shared encode → reindex → scale routine
pub mod replay;

/// Prediction engine
pub mod inferencer;

/// Grid-search optimizer
pub mod optimizer;

/// Contribution-based explanations
pub mod explain;
