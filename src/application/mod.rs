// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-facing goal per use case.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct file format handling (that's Layer 4 and 6)
//   - Only workflow coordination, with anyhow context added
//     at each step
//
// Every use case borrows the same AppConfig, so the whole
// run agrees on where uploads, processed files and model
// bundles live.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Dataset and model directories
pub mod config;

// ingest, profile, preprocess
pub mod dataset_use_case;

// The training workflow
pub mod train_use_case;

// Single-row yield prediction
pub mod predict_use_case;

// Input optimization
pub mod optimize_use_case;

// Feature contribution report
pub mod explain_use_case;
