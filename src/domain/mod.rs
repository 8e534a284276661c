// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define the core
// concepts of the system: feature values and rows, the typed
// request payloads, the error taxonomy and the regression
// capability every model must offer.
//
// Rules for this layer:
//   - NO file I/O
//   - NO matrix maths beyond the trait signatures
//   - Only plain Rust structs, enums, and traits
//
// Think of this layer as the "dictionary" of the system:
// it defines what things ARE, not how they work.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error taxonomy shared by every layer
pub mod error;

// A single cell value and a named row of cells
pub mod feature_row;

// Strongly typed predict / optimize payloads
pub mod inputs;

// Core abstractions (traits) that other layers implement
pub mod traits;

pub use error::AgriError;
pub use feature_row::{FeatureRow, FeatureValue};
