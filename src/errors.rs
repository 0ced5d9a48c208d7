//! Query error types
//!
//! Error codes:
//! - DAILY_INVALID_RANGE (REJECT)
//! - DAILY_COLLECTION_BIND (ERROR)
//! - DAILY_PIPELINE_EXECUTION (ERROR)
//! - DAILY_CONFIGURATION (FATAL)
//!
//! All errors bubble to the immediate caller. Nothing here is retried.

use std::fmt;

use crate::store::StoreError;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected
    Reject,
    /// Operation failed, the next call may succeed
    Error,
    /// Nothing can be queried until fixed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Query error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Malformed or inverted date range
    InvalidRange,
    /// Collection listing or counting failed
    CollectionBind,
    /// A per-collection query failed
    PipelineExecution,
    /// Connection settings unusable
    Configuration,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::InvalidRange => "DAILY_INVALID_RANGE",
            QueryErrorCode::CollectionBind => "DAILY_COLLECTION_BIND",
            QueryErrorCode::PipelineExecution => "DAILY_PIPELINE_EXECUTION",
            QueryErrorCode::Configuration => "DAILY_CONFIGURATION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            QueryErrorCode::InvalidRange => Severity::Reject,
            QueryErrorCode::CollectionBind => Severity::Error,
            QueryErrorCode::PipelineExecution => Severity::Error,
            QueryErrorCode::Configuration => Severity::Fatal,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error with full context
#[derive(Debug, Clone)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
    /// Collection being processed, if any
    collection: Option<String>,
    /// Underlying store failure
    source: Option<StoreError>,
}

impl QueryError {
    /// Create an invalid range error
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::InvalidRange,
            message: reason.into(),
            collection: None,
            source: None,
        }
    }

    /// Create an invalid range error for an unparseable date
    pub fn invalid_date(input: &str, reason: impl fmt::Display) -> Self {
        Self::invalid_range(format!("Invalid date '{}': {}", input, reason))
    }

    /// Create a collection bind error
    pub fn collection_bind(source: StoreError) -> Self {
        Self {
            code: QueryErrorCode::CollectionBind,
            message: format!("Failed to resolve collections: {}", source),
            collection: None,
            source: Some(source),
        }
    }

    /// Create a collection bind error for a single collection
    pub fn collection_count(collection: impl Into<String>, source: StoreError) -> Self {
        let name = collection.into();
        Self {
            code: QueryErrorCode::CollectionBind,
            message: format!("Failed to count documents in '{}': {}", name, source),
            collection: Some(name),
            source: Some(source),
        }
    }

    /// Create a pipeline execution error
    pub fn pipeline_execution(collection: impl Into<String>, source: StoreError) -> Self {
        let name = collection.into();
        Self {
            code: QueryErrorCode::PipelineExecution,
            message: format!("Query failed on collection '{}': {}", name, source),
            collection: Some(name),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::Configuration,
            message: reason.into(),
            collection: None,
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the collection name if applicable
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns the wrapped store error if applicable
    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.as_ref()
    }

    /// Returns whether this error prevents any further query
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
