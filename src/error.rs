// src/error.rs
use thiserror::Error;

/// Errors raised by the annotation core and its collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProofError {
    /// A coordinate fell outside the normalized `[0,1]` range on strict placement.
    #[error("coordinate ({x:.3}, {y:.3}) is outside the page")]
    OutOfBounds { x: f64, y: f64 },

    #[error("annotation has no text, pin or stroke")]
    EmptyAnnotation,

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("annotation {0} no longer exists")]
    NotFound(String),

    #[error("invalid annotation record: {0}")]
    InvalidRecord(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProofError {
    /// Errors the UI must surface with a blocking alert.
    ///
    /// `OutOfBounds` and `EmptyAnnotation` are handled inline and never reach
    /// the persistence layer.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ProofError::PersistenceFailure(_) | ProofError::NotFound(_) | ProofError::Config(_)
        )
    }
}

impl From<gloo_net::Error> for ProofError {
    fn from(err: gloo_net::Error) -> Self {
        ProofError::PersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for ProofError {
    fn from(err: serde_json::Error) -> Self {
        ProofError::InvalidRecord(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_classification() {
        assert!(!ProofError::EmptyAnnotation.is_blocking());
        assert!(!ProofError::OutOfBounds { x: 1.5, y: 0.0 }.is_blocking());
        assert!(ProofError::PersistenceFailure("503".into()).is_blocking());
        assert!(ProofError::NotFound("42".into()).is_blocking());
    }

    #[test]
    fn test_messages() {
        let err = ProofError::OutOfBounds { x: 1.25, y: -0.5 };
        assert_eq!(err.to_string(), "coordinate (1.250, -0.500) is outside the page");
        assert_eq!(
            ProofError::NotFound("7".into()).to_string(),
            "annotation 7 no longer exists"
        );
    }
}
