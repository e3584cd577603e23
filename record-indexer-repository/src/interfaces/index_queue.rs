//! Index queue trait definition.

use async_trait::async_trait;
use record_indexer_shared::{Item, RecordId};

use crate::errors::StoreError;

/// The queue of records waiting to be indexed.
///
/// The queue owns scheduling: it guarantees that one item is never handed out
/// twice while in flight, and it decides what happens to failed items.
#[async_trait]
pub trait IndexQueue: Send + Sync {
    /// Enqueue a record for `root`, or mark an existing item pending again.
    ///
    /// An empty `configuration` selects the configuration registered for the table.
    async fn update_item(
        &self,
        table: &str,
        uid: RecordId,
        root: RecordId,
        configuration: &str,
    ) -> Result<Item, StoreError>;

    /// All items of one record, one per site and configuration.
    async fn get_items(&self, table: &str, uid: RecordId) -> Result<Vec<Item>, StoreError>;

    /// Take up to `limit` pending items and mark them in flight.
    async fn dequeue(&self, limit: usize) -> Result<Vec<Item>, StoreError>;

    /// Record a successful indexing run of `item`.
    async fn mark_indexed(&self, item: &Item) -> Result<(), StoreError>;

    /// Record a failed indexing run of `item`; the item is kept with `error`.
    async fn mark_failed(&self, item: &Item, error: &str) -> Result<(), StoreError>;

    /// Number of items waiting to be dequeued.
    async fn pending_count(&self) -> Result<usize, StoreError>;
}
