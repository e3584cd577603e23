//! Queue items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::RecordId;

/// One queued unit of work: a record that has to be (re)indexed for one site.
///
/// Items are created by the index queue when a record changes or a full
/// reindex is triggered. The indexer consumes an item once per dequeue; the
/// queue decides what happens to it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Queue row identifier.
    pub uid: u64,
    /// Table of the record to index.
    pub table: String,
    /// Identifier of the record to index.
    pub record_uid: RecordId,
    /// Root page of the site the record is indexed for.
    pub root: RecordId,
    /// Name of the indexing configuration; empty selects the configuration
    /// registered for `table`.
    #[serde(default)]
    pub indexing_configuration: String,
    /// Whether per-item field overrides exist in the queue.
    #[serde(default)]
    pub has_indexing_properties: bool,
    /// Per-item field overrides, loaded by the queue when
    /// `has_indexing_properties` is set.
    #[serde(default)]
    pub indexing_properties: BTreeMap<String, String>,
    /// When the record last changed.
    pub changed: DateTime<Utc>,
    /// Last indexing error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl Item {
    /// Create an item for a record with no indexing properties.
    pub fn new(uid: u64, table: impl Into<String>, record_uid: RecordId, root: RecordId) -> Self {
        Self {
            uid,
            table: table.into(),
            record_uid,
            root,
            indexing_configuration: String::new(),
            has_indexing_properties: false,
            indexing_properties: BTreeMap::new(),
            changed: DateTime::<Utc>::UNIX_EPOCH,
            errors: None,
        }
    }

    pub fn with_indexing_configuration(mut self, name: impl Into<String>) -> Self {
        self.indexing_configuration = name.into();
        self
    }

    pub fn with_changed(mut self, changed: DateTime<Utc>) -> Self {
        self.changed = changed;
        self
    }

    /// Attach a field override and raise the `has_indexing_properties` flag.
    pub fn with_indexing_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.indexing_properties.insert(key.into(), value.into());
        self.has_indexing_properties = true;
        self
    }

    /// Human-readable identity used in logs.
    pub fn label(&self) -> String {
        format!("{}:{}@{}", self.table, self.record_uid, self.root)
    }
}
