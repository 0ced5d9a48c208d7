//! Store error types
//!
//! Errors raised by a document store backend. The query layer never
//! inspects these beyond wrapping them into a `QueryError`.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store connection unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Malformed filter document
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Malformed projection document
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// Malformed or unsupported pipeline stage
    #[error("Invalid pipeline stage: {0}")]
    InvalidPipeline(String),

    /// Malformed update document
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true when the store could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Backend(format!("JSON error: {}", e))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Backend(format!("I/O error: {}", e))
    }
}
