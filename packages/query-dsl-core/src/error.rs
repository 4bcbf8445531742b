//! Query error types.

use thiserror::Error;

/// Query construction and pagination errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Malformed request (negative offset, non-positive limit, bad parameter)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// More than one row matched where at most one was expected
    #[error("Query did not return a unique result: {count} rows matched")]
    NonUniqueResult { count: usize },

    /// Field required by a projection is missing or null
    #[error("Field '{field}' is missing")]
    MissingField { field: String },

    /// Field holds a value of the wrong kind
    #[error("Type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },
}

impl QueryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        QueryError::InvalidArgument(message.into())
    }
}
