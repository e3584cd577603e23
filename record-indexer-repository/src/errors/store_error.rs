//! Record store, site provider and queue error types.

use thiserror::Error;

/// Errors from the read-side collaborators: the record store, the site
/// provider and the index queue.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A query against the backend failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A snapshot or stored row could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A referenced row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}
