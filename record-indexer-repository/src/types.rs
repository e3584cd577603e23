//! Result types for search index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single document.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's unique key.
    pub unique_key: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Partial failures are reported here rather than failing the whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each document, in submission order.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Record one result and update the counters.
    pub fn push(&mut self, result: BatchOperationResult) {
        self.total += 1;
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// The first error of the batch, if any document failed.
    pub fn first_error(&self) -> Option<&SearchIndexError> {
        self.results.iter().find_map(|r| r.error.as_ref())
    }
}
