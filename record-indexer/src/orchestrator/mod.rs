//! Orchestrator module for the record indexer.
//!
//! Drains the index queue: dequeues items, indexes them with bounded
//! concurrency and reports each outcome back to the queue.

mod initializer;

pub use initializer::enqueue_site;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use record_indexer_repository::IndexQueue;
use record_indexer_shared::{Item, RecordId};
use tokio::sync::broadcast;
use tokio::time::{interval, sleep_until, Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;
use crate::indexer::{IndexResult, Indexer};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Items dequeued per batch.
    pub batch_size: usize,
    /// Items of one batch indexed concurrently.
    pub concurrency: usize,
    /// Wait between polls of an empty queue. `None` stops once the queue is drained.
    pub poll_interval: Option<Duration>,
    /// Interval of progress log lines.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrency: 8,
            poll_interval: None,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Counts of one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub failed: usize,
    pub documents: usize,
}

/// Orchestrator that feeds queue items to the indexer.
pub struct Orchestrator {
    queue: Arc<dyn IndexQueue>,
    indexer: Arc<Indexer>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    /// Total number of items processed since startup.
    total_items_processed: Arc<AtomicU64>,
    /// Total number of items that failed since startup.
    total_items_failed: Arc<AtomicU64>,
    /// Total number of documents submitted since startup.
    total_documents_indexed: Arc<AtomicU64>,
}

impl Orchestrator {
    pub fn new(queue: Arc<dyn IndexQueue>, indexer: Arc<Indexer>) -> Self {
        Self::with_config(queue, indexer, OrchestratorConfig::default())
    }

    pub fn with_config(
        queue: Arc<dyn IndexQueue>,
        indexer: Arc<Indexer>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            queue,
            indexer,
            config,
            shutdown_tx,
            total_items_processed: Arc::new(AtomicU64::new(0)),
            total_items_failed: Arc::new(AtomicU64::new(0)),
            total_documents_indexed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the orchestrator.
    ///
    /// Processes batches until the queue is empty, or, with a poll interval,
    /// until a shutdown signal is received. A batch in progress is always
    /// finished before shutting down.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), IngestError> {
        info!(
            batch_size = self.config.batch_size,
            concurrency = self.config.concurrency,
            "Starting record indexer orchestrator"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Track previous values for rate calculation
        let mut prev_items: u64 = 0;
        let mut prev_docs: u64 = 0;
        let mut prev_time = std::time::Instant::now();
        let mut next_batch = Instant::now();

        loop {
            tokio::select! {
                _ = sleep_until(next_batch) => {
                    let stats = self.process_batch().await?;
                    if stats.processed > 0 {
                        next_batch = Instant::now();
                        continue;
                    }
                    match self.config.poll_interval {
                        Some(poll_interval) => {
                            debug!("Queue empty, waiting for the next poll");
                            next_batch = Instant::now() + poll_interval;
                        }
                        None => {
                            info!("Queue drained");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = progress_timer.tick() => {
                    let items = self.total_items_processed.load(Ordering::Relaxed);
                    let docs = self.total_documents_indexed.load(Ordering::Relaxed);

                    let now = std::time::Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();

                    let items_per_sec = if elapsed_secs > 0.0 {
                        (items.saturating_sub(prev_items) as f64) / elapsed_secs
                    } else {
                        0.0
                    };

                    let docs_per_sec = if elapsed_secs > 0.0 {
                        (docs.saturating_sub(prev_docs) as f64) / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        items_processed = items,
                        items_failed = self.total_items_failed.load(Ordering::Relaxed),
                        documents_indexed = docs,
                        items_per_sec = format!("{:.2}", items_per_sec),
                        documents_per_sec = format!("{:.2}", docs_per_sec),
                        "Processing progress"
                    );

                    prev_items = items;
                    prev_docs = docs;
                    prev_time = now;
                }
            }
        }

        info!(
            total_items_processed = self.total_items_processed.load(Ordering::Relaxed),
            total_items_failed = self.total_items_failed.load(Ordering::Relaxed),
            total_documents_indexed = self.total_documents_indexed.load(Ordering::Relaxed),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Process batches until the queue has no pending item left.
    pub async fn run_once(&self) -> Result<BatchStats, IngestError> {
        let mut total = BatchStats::default();
        loop {
            let stats = self.process_batch().await?;
            if stats.processed == 0 {
                return Ok(total);
            }
            total.processed += stats.processed;
            total.failed += stats.failed;
            total.documents += stats.documents;
        }
    }

    /// Dequeue one batch, index it and mark every item.
    #[instrument(skip(self))]
    pub async fn process_batch(&self) -> Result<BatchStats, IngestError> {
        let items = self.queue.dequeue(self.config.batch_size).await?;
        if items.is_empty() {
            return Ok(BatchStats::default());
        }
        debug!(item_count = items.len(), "Processing batch of items");

        let indexer = &self.indexer;
        let results: Vec<(Item, IndexResult)> = stream::iter(items)
            .map(|item| async move {
                let result = indexer.index(&item).await;
                (item, result)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut stats = BatchStats::default();
        let mut first_error = None;
        for (item, result) in &results {
            stats.processed += 1;
            stats.documents += result.submitted_documents();
            if !result.is_success() {
                stats.failed += 1;
            }
            if let Err(e) = self.report(item, result).await {
                error!(item_uid = item.uid, error = %e, "Failed to update queue item");
                first_error.get_or_insert(e);
            }
        }

        self.total_items_processed
            .fetch_add(stats.processed as u64, Ordering::Relaxed);
        self.total_items_failed
            .fetch_add(stats.failed as u64, Ordering::Relaxed);
        self.total_documents_indexed
            .fetch_add(stats.documents as u64, Ordering::Relaxed);

        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Index every queue item of one record right away.
    ///
    /// Returns whether all of them were indexed successfully; a record with
    /// no queue item is not indexed and reports `false`.
    #[instrument(skip(self))]
    pub async fn index_record(&self, table: &str, uid: RecordId) -> Result<bool, IngestError> {
        let items = self.queue.get_items(table, uid).await?;
        if items.is_empty() {
            warn!(table = %table, uid = uid, "Record has no queue item");
            return Ok(false);
        }

        let mut success = true;
        for item in &items {
            let result = self.indexer.index(item).await;
            success &= result.is_success();
            self.report(item, &result).await?;
        }
        Ok(success)
    }

    async fn report(&self, item: &Item, result: &IndexResult) -> Result<(), IngestError> {
        match result.error_summary() {
            None => self.queue.mark_indexed(item).await?,
            Some(message) => self.queue.mark_failed(item, &message).await?,
        }
        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
