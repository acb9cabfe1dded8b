//! Error types shared by every stage of the diff pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two compared inputs a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => write!(f, "expected"),
            Self::Actual => write!(f, "actual"),
        }
    }
}

/// Failure modes of a diff call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// One of the inputs is not valid UTF-8. `offset` is the byte index
    /// where the first invalid sequence starts.
    #[error("{side} text is not valid UTF-8 (invalid sequence at byte {offset})")]
    InvalidEncoding { side: Side, offset: usize },

    /// Memory could not be reserved for the named stage.
    #[error("out of memory during {stage}")]
    AllocationFailure { stage: &'static str },

    /// A configuration handed to a generator failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl DiffError {
    pub(crate) fn allocation(stage: &'static str) -> Self {
        Self::AllocationFailure { stage }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T, E = DiffError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DiffError::InvalidEncoding {
            side: Side::Actual,
            offset: 7,
        };
        assert_eq!(
            err.to_string(),
            "actual text is not valid UTF-8 (invalid sequence at byte 7)"
        );

        let err = DiffError::allocation("rendering");
        assert_eq!(err.to_string(), "out of memory during rendering");

        let err = DiffError::InvalidConfig {
            reason: "lcs_max_cells must be greater than 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: lcs_max_cells must be greater than 0"
        );
    }
}
