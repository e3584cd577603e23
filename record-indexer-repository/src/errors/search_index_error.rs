//! Search index error types.
//!
//! This module defines the error type for submitting documents to a search
//! core, covering both backend failures and document validation.

use thiserror::Error;

/// Errors from search connections.
///
/// Used by the `SearchConnection` trait and `SearchIndexService`. A submission
/// error is terminal for the (item, language) pair it belongs to; callers do
/// not retry.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., missing mandatory fields, inconsistent unique key).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend rejected a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Failed to serialize a document for the search backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The connection handle names a core the backend does not know.
    #[error("Core not found: {0}")]
    CoreNotFound(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a core not found error.
    pub fn core_not_found(core: impl Into<String>) -> Self {
        Self::CoreNotFound(core.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}
