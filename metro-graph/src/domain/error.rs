//! Domain error types.
//!
//! These errors describe a station table that cannot be turned into a line
//! graph. They are distinct from I/O and network errors.

/// Line-level construction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A required field is missing or cannot be typed
    #[error("line {line}, row {row}: malformed {field}: {problem}")]
    MalformedRecord {
        line: String,
        row: usize,
        field: &'static str,
        problem: String,
    },

    /// Distances are not strictly increasing, or a station repeats
    #[error("line {line}, row {row}: ordering violation: {reason}")]
    OrderingViolation {
        line: String,
        row: usize,
        reason: String,
    },
}

impl GraphError {
    /// The line whose construction failed.
    pub fn line(&self) -> &str {
        match self {
            GraphError::MalformedRecord { line, .. } | GraphError::OrderingViolation { line, .. } => {
                line
            }
        }
    }
}
