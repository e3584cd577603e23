//! Search connection trait definition.

use async_trait::async_trait;
use record_indexer_shared::{ConnectionHandle, SearchDocument};

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// Abstracts the search engine a document is published to.
///
/// Connection lifecycle, authentication, timeouts and retry belong to the
/// implementation. Submitting a document whose `uniqueKey` already exists in
/// the target core replaces it.
#[async_trait]
pub trait SearchConnection: Send + Sync {
    /// Check that the backend is reachable.
    ///
    /// Called once during startup, before any document is submitted.
    async fn ping(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    /// Submit one document to the core behind `connection`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The document was accepted
    /// * `Err(SearchIndexError)` - The backend rejected the document or was unreachable
    async fn submit(
        &self,
        connection: &ConnectionHandle,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError>;

    /// Submit several documents to one core and report each outcome.
    ///
    /// One failed document does not stop the others.
    async fn submit_batch(
        &self,
        connection: &ConnectionHandle,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut summary = BatchOperationSummary::default();

        for document in documents {
            let unique_key = document.unique_key().unwrap_or_default();
            let result = self.submit(connection, document).await;
            summary.push(BatchOperationResult {
                unique_key,
                success: result.is_ok(),
                error: result.err(),
            });
        }

        Ok(summary)
    }
}
