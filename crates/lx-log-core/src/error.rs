//! Log ingestion and query error types.

use thiserror::Error;

/// Errors that can occur while processing or querying a log file.
///
/// Per-line anomalies never show up here: a line that does not fit the
/// detected grammar becomes an unparsed `Record`, not an error.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("source not found: {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid query field '{field}': {message}")]
    QueryParse { field: String, message: String },

    #[error("a processing pass is already running")]
    Busy,

    #[error("processing cancelled")]
    Cancelled,

    #[error("no processed session available")]
    NoSession,

    #[error("{0}")]
    Other(String),
}

impl LogError {
    /// Build a `QueryParse` error for the named query field.
    pub fn query(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryParse {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending query field, if this is a query parse error.
    pub fn query_field(&self) -> Option<&str> {
        match self {
            Self::QueryParse { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Convenience alias for log engine results.
pub type LogResult<T> = Result<T, LogError>;
