//! Validation errors

use recovery_types::PlanShapeError;

/// Failures that prevent a plan from being evaluated at all
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The plan is structurally malformed
    #[error("plan shape: {0}")]
    Shape(#[from] PlanShapeError),

    /// Quorum ratio outside (0, 1]
    #[error("quorum ratio must be in (0, 1], got {0}")]
    InvalidQuorumRatio(f64),
}

/// Result alias for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_converts() {
        let err: ValidationError = PlanShapeError::EmptySequence.into();
        assert!(err.to_string().starts_with("plan shape:"));
    }
}
