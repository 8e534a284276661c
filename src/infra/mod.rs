// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   artifact_store.rs - versioned artifact bundles
//                       Writes each training run as one JSON
//                       file and publishes it by atomically
//                       swapping a CURRENT pointer, so readers
//                       never see half of one run and half of
//                       another.
//
//   metrics.rs        - training history
//                       One CSV row per published bundle.
//
//   workspace.rs      - dataset directories
//                       Stores uploads and finds the most
//                       recent CSV in a directory.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Versioned artifact bundle persistence
pub mod artifact_store;

/// Training-run metrics CSV logger
pub mod metrics;

/// Upload / processed dataset directories
pub mod workspace;
