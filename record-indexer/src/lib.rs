//! # Record Indexer
//!
//! Indexes relational records into a search engine: one document per record
//! per language and site it is published in.
//!
//! ## Architecture
//!
//! 1. **Orchestrator**: Drains the index queue with bounded concurrency
//! 2. **Indexer**: Routes an item to its connections and resolves its language variants
//! 3. **Processor**: Builds documents from field mappings, relations and hooks
//! 4. **Loader**: Submits the documents of each language
//!
//! ## Modules
//!
//! - [`config`]: Settings file and dependency initialization
//! - [`context`]: Explicit per-run and per-document context
//! - [`extensions`]: Document modifier and additional document hooks
//! - [`indexer`]: Per-item indexing and its result
//! - [`loader`]: Submission of documents to the search connection
//! - [`localization`]: Language variants and translation overlays
//! - [`orchestrator`]: Queue draining and full reindex initialization
//! - [`processor`]: Field, relation and document resolution
//! - [`routing`]: Site connections per language
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod context;
pub mod errors;
pub mod extensions;
pub mod indexer;
pub mod loader;
pub mod localization;
pub mod orchestrator;
pub mod processor;
pub mod routing;

pub use config::{Dependencies, IndexerSettings};
pub use errors::{ExtensionError, IndexerError, IngestError, ResolveError};
pub use extensions::{AdditionalDocumentsProvider, DocumentModifier, ExtensionRegistry};
pub use indexer::{IndexResult, Indexer, IndexerConfig, LanguageOutcome};
pub use orchestrator::{Orchestrator, OrchestratorConfig};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
