//! Record store trait definition.

use async_trait::async_trait;
use record_indexer_shared::{Predicate, Record, RecordId};

use crate::errors::StoreError;

/// Read-only access to the relational records being indexed.
///
/// Implementations must return rows of one table in a stable order (storage
/// order); the relation resolver relies on it to break sort ties.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record by table and uid.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Record))` - The record
    /// * `Ok(None)` - No such record
    /// * `Err(StoreError)` - If the lookup fails
    async fn fetch_record(&self, table: &str, uid: RecordId) -> Result<Option<Record>, StoreError>;

    /// Fetch every record of `table` matching `predicate`, in storage order.
    async fn fetch_related(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, StoreError>;
}
