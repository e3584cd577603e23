//! Loader module for the record indexer.
//!
//! Submits the documents built for an item to the search connection, one
//! batch per language.

use std::sync::Arc;

use futures::future::join_all;
use record_indexer_repository::SearchConnection;
use record_indexer_shared::{ConnectionHandle, LanguageId, SearchDocument};
use tracing::{debug, error, instrument, warn};

use crate::indexer::LanguageOutcome;

/// Configuration for the submission loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Submit the languages of one item concurrently.
    pub parallel_submissions: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            parallel_submissions: true,
        }
    }
}

/// Documents of one item for one language.
#[derive(Debug, Clone)]
pub struct SubmissionBatch {
    pub language_id: LanguageId,
    pub connection: ConnectionHandle,
    pub documents: Vec<SearchDocument>,
}

/// Loader that submits documents to the search engine.
///
/// Batches are independent: one failing language neither cancels nor
/// rolls back its siblings.
pub struct SubmissionLoader {
    connection: Arc<dyn SearchConnection>,
    config: LoaderConfig,
}

impl SubmissionLoader {
    /// Create a new loader with the default configuration.
    pub fn new(connection: Arc<dyn SearchConnection>) -> Self {
        Self::with_config(connection, LoaderConfig::default())
    }

    pub fn with_config(connection: Arc<dyn SearchConnection>, config: LoaderConfig) -> Self {
        Self { connection, config }
    }

    /// Submit every batch and report each language's outcome, in batch order.
    #[instrument(skip(self, batches), fields(batch_count = batches.len(), parallel = self.config.parallel_submissions))]
    pub async fn submit(&self, batches: &[SubmissionBatch]) -> Vec<(LanguageId, LanguageOutcome)> {
        if self.config.parallel_submissions {
            join_all(batches.iter().map(|batch| self.submit_batch(batch))).await
        } else {
            let mut outcomes = Vec::with_capacity(batches.len());
            for batch in batches {
                outcomes.push(self.submit_batch(batch).await);
            }
            outcomes
        }
    }

    async fn submit_batch(&self, batch: &SubmissionBatch) -> (LanguageId, LanguageOutcome) {
        let outcome = match self
            .connection
            .submit_batch(&batch.connection, &batch.documents)
            .await
        {
            Ok(summary) if summary.is_success() => {
                debug!(
                    language_id = batch.language_id,
                    core = %batch.connection.core,
                    count = summary.succeeded,
                    "Submitted documents"
                );
                LanguageOutcome::Submitted {
                    documents: summary.succeeded,
                }
            }
            Ok(summary) => {
                for result in summary.results.iter().filter(|r| !r.success) {
                    if let Some(ref err) = result.error {
                        warn!(
                            unique_key = %result.unique_key,
                            error = %err,
                            "Failed to submit document"
                        );
                    }
                }
                let reason = summary
                    .first_error()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "submission failed".to_string());
                LanguageOutcome::Failed {
                    error: format!(
                        "{} of {} documents failed: {}",
                        summary.failed, summary.total, reason
                    ),
                }
            }
            Err(e) => {
                error!(
                    language_id = batch.language_id,
                    core = %batch.connection.core,
                    error = %e,
                    "Failed to submit batch"
                );
                LanguageOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        (batch.language_id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use record_indexer_repository::SearchIndexError;
    use std::sync::Mutex;

    /// Rejects every document sent to one core and records the rest.
    struct MockConnection {
        failing_core: String,
        submitted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchConnection for MockConnection {
        async fn submit(
            &self,
            connection: &ConnectionHandle,
            document: &SearchDocument,
        ) -> Result<(), SearchIndexError> {
            if connection.core == self.failing_core {
                return Err(SearchIndexError::connection("core unreachable"));
            }
            self.submitted
                .lock()
                .unwrap()
                .push(document.unique_key().unwrap_or_default());
            Ok(())
        }
    }

    fn batch(language_id: LanguageId, core: &str) -> SubmissionBatch {
        let mut document = SearchDocument::new();
        document.set_single("uniqueKey", format!("site/tx_bar/88/{}", language_id));
        SubmissionBatch {
            language_id,
            connection: ConnectionHandle {
                site: "site".to_string(),
                language_id,
                core: core.to_string(),
            },
            documents: vec![document],
        }
    }

    async fn run(parallel: bool) -> (Vec<(LanguageId, LanguageOutcome)>, Vec<String>) {
        let connection = Arc::new(MockConnection {
            failing_core: "core_de".to_string(),
            submitted: Mutex::new(Vec::new()),
        });
        let loader = SubmissionLoader::with_config(
            connection.clone(),
            LoaderConfig {
                parallel_submissions: parallel,
            },
        );

        let outcomes = loader
            .submit(&[batch(0, "core_en"), batch(1, "core_de"), batch(2, "core_da")])
            .await;
        let submitted = connection.submitted.lock().unwrap().clone();
        (outcomes, submitted)
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        for parallel in [true, false] {
            let (outcomes, mut submitted) = run(parallel).await;

            assert_eq!(outcomes.len(), 3);
            assert_eq!(outcomes[0], (0, LanguageOutcome::Submitted { documents: 1 }));
            assert!(outcomes[1].1.is_failure());
            assert_eq!(outcomes[2], (2, LanguageOutcome::Submitted { documents: 1 }));

            submitted.sort();
            assert_eq!(submitted, vec!["site/tx_bar/88/0", "site/tx_bar/88/2"]);
        }
    }
}
