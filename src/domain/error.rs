// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Three kinds of failure reach a caller:
//
//   Missing precondition  ArtifactMissing, NoDataset
//                         expected before setup steps have run
//   Invalid input         InvalidTarget, InvalidInput
//                         the caller broke a contract
//   Infrastructure        Io, Serialization, Csv, Numerical,
//                         InconsistentBundle
//
// Unseen categories and an empty feasible region are NOT
// errors. They have defined fallbacks (zero vector, sentinel
// yield) and never show up here.
//
// Reference: thiserror crate documentation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgriError {
    /// No complete artifact bundle has been published yet.
    #[error("model not trained yet: no artifact bundle found")]
    ArtifactMissing,

    /// The requested target column does not exist in the dataset.
    #[error("target column '{0}' not found in dataset")]
    InvalidTarget(String),

    /// Caller supplied data that violates a contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No dataset file is available in the expected directory.
    #[error("no dataset found: {0}")]
    NoDataset(String),

    /// The four artifacts of a bundle do not describe the same layout.
    #[error("inconsistent artifact bundle: {0}")]
    InconsistentBundle(String),

    /// A numerical routine could not produce a finite answer.
    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AgriError {
    /// True for the "run setup first" class of errors.
    pub fn is_missing_precondition(&self) -> bool {
        matches!(self, AgriError::ArtifactMissing | AgriError::NoDataset(_))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_missing_message() {
        let err = AgriError::ArtifactMissing;
        assert!(err.to_string().contains("not trained"));
        assert!(err.is_missing_precondition());
    }

    #[test]
    fn test_invalid_target_names_column() {
        let err = AgriError::InvalidTarget("yield".to_string());
        assert!(err.to_string().contains("'yield'"));
        assert!(!err.is_missing_precondition());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AgriError = io_err.into();
        assert!(matches!(err, AgriError::Io(_)));
    }
}
