//! Error types for the record indexer.
//!
//! Errors are layered by the unit of work they abort:
//!
//! - [`ResolveError`]: one field of one document
//! - [`ExtensionError`]: the hook phase of one document
//! - [`IndexerError`]: one item, or one language of an item
//! - [`IngestError`]: one queue drain pass

use record_indexer_repository::{SearchIndexError, StoreError};
use record_indexer_shared::RecordId;
use thiserror::Error;

/// Errors resolving a single field mapping.
///
/// These are logged and absorbed by the document builder: the field produces
/// no value and the build continues.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The rule references a table the schema does not know.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// The rule references a column that is not a relation.
    #[error("Column '{column}' of table '{table}' is not a relation")]
    UnknownRelation { table: String, column: String },

    /// A dotted label path was configured without recursive resolution.
    #[error("Label path '{0}' requires recursive value resolution")]
    DottedPathWithoutRecursion(String),

    /// A label path follows more relations than allowed.
    #[error("Label path '{path}' exceeds the maximum relation depth of {max}")]
    DepthExceeded { path: String, max: usize },

    /// The rule is malformed.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// The record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Create an invalid rule error.
    pub fn invalid_rule(msg: impl Into<String>) -> Self {
        Self::InvalidRule(msg.into())
    }

    /// Create an unknown relation error.
    pub fn unknown_relation(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownRelation {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Errors from document extension hooks.
#[derive(Error, Debug, Clone)]
pub enum ExtensionError {
    /// No extension is registered under the key.
    #[error("Invalid argument: no extension registered for '{0}'")]
    NotFound(String),

    /// The extension registered under the key has the wrong capability.
    #[error("Unexpected type: extension '{key}' is a {actual}, expected a {expected}")]
    UnexpectedType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Registration with an empty key or a key already in use.
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    /// A hook produced or left behind an invalid document.
    #[error("Invalid document from extension '{key}': {reason}")]
    InvalidDocument { key: String, reason: String },

    /// A hook failed while running.
    #[error("Extension '{key}' failed: {reason}")]
    Failed { key: String, reason: String },
}

impl ExtensionError {
    /// Create a failure error for a hook.
    pub fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid document error.
    pub fn invalid_document(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors indexing one item.
#[derive(Error, Debug, Clone)]
pub enum IndexerError {
    /// No site is configured for the item's root.
    #[error("No site found for root page {0}")]
    SiteNotFound(RecordId),

    /// The record to index does not exist.
    #[error("Record {table}:{uid} not found")]
    RecordNotFound { table: String, uid: RecordId },

    /// The site has no indexing configuration for the item.
    #[error("No indexing configuration '{name}' for table '{table}'")]
    ConfigurationNotFound { name: String, table: String },

    /// A read-side collaborator failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An extension hook failed.
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// The search connection rejected a document.
    #[error("Submission error: {0}")]
    Submission(#[from] SearchIndexError),
}

impl IndexerError {
    /// Create a record not found error.
    pub fn record_not_found(table: impl Into<String>, uid: RecordId) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            uid,
        }
    }
}

/// Errors that can occur while draining the index queue.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The queue failed.
    #[error("Queue error: {0}")]
    QueueError(#[from] StoreError),

    /// Initial enqueueing failed.
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// A worker task failed.
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl IngestError {
    /// Create an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::InitializationError(msg.into())
    }

    /// Create a worker error.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::WorkerError(msg.into())
    }
}
