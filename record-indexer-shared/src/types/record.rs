//! Record snapshots read from the record store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::{Scalar, Value};

/// Numeric identifier of a record within its table.
pub type RecordId = u64;

/// Name of the page table; rootline walks and page-based lookups read from it.
pub const PAGES_TABLE: &str = "pages";

/// Pseudo-field addressing the record's own identifier.
pub const UID_FIELD: &str = "uid";

/// Field holding the identifier of the page a record is stored on.
pub const PID_FIELD: &str = "pid";

/// An immutable snapshot of one row, addressed by `(table, uid)`.
///
/// The indexing pipeline works on snapshots only: a row changing in the store
/// while an item is being indexed does not affect the in-flight build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub uid: RecordId,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new(table: impl Into<String>, uid: RecordId) -> Self {
        Self {
            table: table.into(),
            uid,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Stored value of a field. Does not resolve the `uid` pseudo-field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of a field including the `uid` pseudo-field.
    ///
    /// Missing fields resolve to [`Value::Null`].
    pub fn value_of(&self, name: &str) -> Value {
        if name == UID_FIELD {
            return Value::Scalar(Scalar::from(self.uid));
        }
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Integer value of a field.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.value_of(name).as_scalar().and_then(Scalar::as_i64)
    }

    /// Text rendering of a field's first scalar.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.value_of(name).as_scalar().map(ToString::to_string)
    }

    /// Identifier of the page this record is stored on.
    pub fn pid(&self) -> Option<RecordId> {
        self.get_i64(PID_FIELD)
            .and_then(|pid| RecordId::try_from(pid).ok())
    }

    /// The page a rootline walk starts from: the record itself for pages,
    /// the containing page for everything else.
    pub fn page_uid(&self) -> Option<RecordId> {
        if self.table == PAGES_TABLE {
            Some(self.uid)
        } else {
            self.pid()
        }
    }
}
