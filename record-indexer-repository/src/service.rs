//! Search index service implementation.
//!
//! The service wraps a `SearchConnection` backend and validates every
//! document before it reaches the backend: mandatory identity fields must be
//! present and the `uniqueKey` must agree with them.

use std::sync::Arc;

use async_trait::async_trait;
use record_indexer_shared::{ConnectionHandle, SearchDocument};
use tracing::debug;

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchConnection;
use crate::types::BatchOperationSummary;
use crate::utils::validate_document;

/// Validating front of a search backend.
///
/// This is the connection application code should hand to the indexer. It is
/// itself a `SearchConnection`, so backends and the service are interchangeable.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use record_indexer_repository::{InMemorySearchIndex, SearchIndexService};
///
/// let backend = Arc::new(InMemorySearchIndex::new());
/// let service = SearchIndexService::new(backend);
/// ```
pub struct SearchIndexService {
    backend: Arc<dyn SearchConnection>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    pub fn new(backend: Arc<dyn SearchConnection>) -> Self {
        Self {
            backend,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(backend: Arc<dyn SearchConnection>, config: SearchIndexServiceConfig) -> Self {
        Self { backend, config }
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SearchConnection for SearchIndexService {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        self.backend.ping().await
    }

    /// Validate and submit one document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the backend accepted the document
    /// * `Err(SearchIndexError::ValidationError)` - If identity fields are missing or inconsistent
    /// * `Err(SearchIndexError)` - If the backend fails
    async fn submit(
        &self,
        connection: &ConnectionHandle,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        let unique_key = validate_document(document)?;
        debug!(core = %connection.core, unique_key = %unique_key, "Submitting document");
        self.backend.submit(connection, document).await
    }

    /// Validate and submit several documents to one core.
    ///
    /// The whole batch is rejected when it exceeds `max_batch_size` or when any
    /// document is invalid; backend failures are reported per document.
    async fn submit_batch(
        &self,
        connection: &ConnectionHandle,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        self.validate_batch_size(documents.len())?;

        for document in documents {
            validate_document(document)?;
        }

        self.backend.submit_batch(connection, documents).await
    }
}
