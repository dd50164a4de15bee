//! Error types for objective function evaluation

use crate::features::Features;
use thiserror::Error;

/// Errors reported by objective functions and constraint handlers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectiveError {
    /// An operation was called whose guarding capability is not advertised
    #[error("{function}: operation requires {feature}, which is not advertised")]
    MissingFeature { function: String, feature: Features },

    /// A point (or result) has the wrong number of components
    #[error("{function}: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    /// HAS_CONSTRAINT_HANDLER is set but no handler was supplied
    #[error("{0}: advertises a constraint handler but provides none")]
    NoConstraintHandler(String),

    /// Box bounds are malformed
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// The concrete function failed to produce a value
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),
}

impl ObjectiveError {
    /// True for errors caused by the caller rather than by the function.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            ObjectiveError::MissingFeature { .. } | ObjectiveError::DimensionMismatch { .. }
        )
    }
}

pub type ObjectiveResult<T> = Result<T, ObjectiveError>;
