//! In-memory record store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use record_indexer_shared::{Predicate, Record, RecordId};

use crate::errors::StoreError;
use crate::interfaces::RecordStore;

/// A record store holding every table in memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of records.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Build a store from a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let records: Vec<Record> =
            serde_json::from_str(json).map_err(|e| StoreError::parse(e.to_string()))?;
        Ok(Self::from_records(records))
    }

    /// Insert a record, replacing a record with the same table and uid in place.
    pub fn insert(&self, record: Record) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let rows = tables.entry(record.table.clone()).or_default();
        match rows.iter_mut().find(|r| r.uid == record.uid) {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
    }

    /// Remove a record, returning it if it existed.
    pub fn remove(&self, table: &str, uid: RecordId) -> Option<Record> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let rows = tables.get_mut(table)?;
        let position = rows.iter().position(|r| r.uid == uid)?;
        Some(rows.remove(position))
    }

    /// Number of records in a table.
    pub fn count(&self, table: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.get(table).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_record(&self, table: &str, uid: RecordId) -> Result<Option<Record>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.uid == uid))
            .cloned())
    }

    async fn fetch_related(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<Vec<Record>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| predicate.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
