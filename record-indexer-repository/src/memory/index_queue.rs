//! In-memory index queue.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use record_indexer_shared::{Item, RecordId};
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::IndexQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemState {
    Pending,
    InFlight,
    Indexed,
    Failed,
}

#[derive(Debug)]
struct QueueEntry {
    item: Item,
    state: ItemState,
    /// Updated while in flight; goes back to pending once the run finishes.
    dirty: bool,
}

#[derive(Debug, Default)]
struct QueueState {
    next_uid: u64,
    entries: Vec<QueueEntry>,
}

/// An index queue kept in memory.
///
/// Items are identified by (table, record uid, root, configuration). An item
/// in flight is never dequeued again until it is marked indexed or failed.
#[derive(Debug, Default)]
pub struct InMemoryIndexQueue {
    state: Mutex<QueueState>,
}

impl InMemoryIndexQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a fully built item on the queue, e.g. one carrying indexing properties.
    pub fn push(&self, mut item: Item) -> Item {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.next_uid += 1;
        item.uid = state.next_uid;
        state.entries.push(QueueEntry {
            item: item.clone(),
            state: ItemState::Pending,
            dirty: false,
        });
        item
    }

    /// Items that failed, with their error.
    pub fn failed_items(&self) -> Vec<Item> {
        self.items_in(ItemState::Failed)
    }

    /// Items indexed successfully.
    pub fn indexed_items(&self) -> Vec<Item> {
        self.items_in(ItemState::Indexed)
    }

    fn items_in(&self, wanted: ItemState) -> Vec<Item> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .entries
            .iter()
            .filter(|e| e.state == wanted)
            .map(|e| e.item.clone())
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, QueueState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::query(e.to_string()))
    }

    fn finish(&self, item: &Item, outcome: ItemState, error: Option<&str>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.item.uid == item.uid)
            .ok_or_else(|| StoreError::not_found("queue item", item.uid))?;

        entry.item.errors = error.map(str::to_string);
        entry.state = if entry.dirty {
            ItemState::Pending
        } else {
            outcome
        };
        entry.dirty = false;
        Ok(())
    }
}

#[async_trait]
impl IndexQueue for InMemoryIndexQueue {
    async fn update_item(
        &self,
        table: &str,
        uid: RecordId,
        root: RecordId,
        configuration: &str,
    ) -> Result<Item, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now();

        if let Some(entry) = state.entries.iter_mut().find(|e| {
            e.item.table == table
                && e.item.record_uid == uid
                && e.item.root == root
                && e.item.indexing_configuration == configuration
        }) {
            entry.item.changed = now;
            if entry.state == ItemState::InFlight {
                entry.dirty = true;
            } else {
                entry.state = ItemState::Pending;
                entry.item.errors = None;
            }
            return Ok(entry.item.clone());
        }

        state.next_uid += 1;
        let item = Item::new(state.next_uid, table, uid, root)
            .with_indexing_configuration(configuration)
            .with_changed(now);
        state.entries.push(QueueEntry {
            item: item.clone(),
            state: ItemState::Pending,
            dirty: false,
        });
        debug!(item_uid = item.uid, item = %item.label(), "Item enqueued");
        Ok(item)
    }

    async fn get_items(&self, table: &str, uid: RecordId) -> Result<Vec<Item>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.item.table == table && e.item.record_uid == uid)
            .map(|e| e.item.clone())
            .collect())
    }

    async fn dequeue(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        let mut state = self.lock()?;
        Ok(state
            .entries
            .iter_mut()
            .filter(|e| e.state == ItemState::Pending)
            .take(limit)
            .map(|e| {
                e.state = ItemState::InFlight;
                e.item.clone()
            })
            .collect())
    }

    async fn mark_indexed(&self, item: &Item) -> Result<(), StoreError> {
        self.finish(item, ItemState::Indexed, None)
    }

    async fn mark_failed(&self, item: &Item, error: &str) -> Result<(), StoreError> {
        self.finish(item, ItemState::Failed, Some(error))
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.state == ItemState::Pending)
            .count())
    }
}
