//! Search document types.
//!
//! This module defines the document shape handed to a search connection: a
//! flat map of field name to one scalar or an ordered list of scalars.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::RecordId;
use super::value::Scalar;

/// Names of the fields every document carries.
pub mod fields {
    pub const UNIQUE_KEY: &str = "uniqueKey";
    pub const TABLE: &str = "table";
    pub const RECORD_ID: &str = "recordId";
    pub const LANGUAGE_ID: &str = "languageId";
    pub const SITE_ID: &str = "siteId";
    pub const TYPE: &str = "type";
    pub const SITE: &str = "site";
    pub const INDEXING_CONFIGURATION: &str = "indexingConfiguration";
    pub const CHANGED: &str = "changed";

    /// Fields a document must carry before it may be submitted.
    pub const MANDATORY: [&str; 5] = [UNIQUE_KEY, TABLE, RECORD_ID, LANGUAGE_ID, SITE_ID];
}

/// Identifier of a site language. `0` is the default language.
pub type LanguageId = u32;

/// Value of one document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentValue {
    Single(Scalar),
    Multi(Vec<Scalar>),
}

impl DocumentValue {
    /// All scalars of this value in order.
    pub fn values(&self) -> &[Scalar] {
        match self {
            DocumentValue::Single(s) => std::slice::from_ref(s),
            DocumentValue::Multi(items) => items,
        }
    }

    /// Text rendering of every scalar, in order.
    pub fn texts(&self) -> Vec<String> {
        self.values().iter().map(ToString::to_string).collect()
    }
}

/// The identity of one document: which record, in which language, for which site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    pub table: String,
    pub record_id: RecordId,
    pub language_id: LanguageId,
    pub site_id: String,
}

impl DocumentIdentity {
    /// The composite unique key, unique across the whole index.
    ///
    /// Format: `{site_id}/{table}/{record_id}/{language_id}`.
    pub fn unique_key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.site_id, self.table, self.record_id, self.language_id
        )
    }
}

/// Document representation for the search index.
///
/// Fields are kept sorted by name so that the same input always serializes to
/// the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchDocument {
    fields: BTreeMap<String, DocumentValue>,
}

impl SearchDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a single scalar.
    pub fn set_single(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.fields
            .insert(name.into(), DocumentValue::Single(value.into()));
    }

    /// Set a field to an already shaped value.
    pub fn set(&mut self, name: impl Into<String>, value: DocumentValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&DocumentValue> {
        self.fields.get(name)
    }

    /// Text of the first scalar of a field.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|v| v.values().first())
            .map(ToString::to_string)
    }

    pub fn remove(&mut self, name: &str) -> Option<DocumentValue> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The document's unique key, if set.
    pub fn unique_key(&self) -> Option<String> {
        self.get_text(fields::UNIQUE_KEY)
    }

    /// Write the identity fields derived from `identity`.
    pub fn set_identity(&mut self, identity: &DocumentIdentity) {
        self.set_single(fields::UNIQUE_KEY, identity.unique_key());
        self.set_single(fields::TABLE, identity.table.as_str());
        self.set_single(fields::RECORD_ID, identity.record_id);
        self.set_single(fields::LANGUAGE_ID, identity.language_id);
        self.set_single(fields::SITE_ID, identity.site_id.as_str());
    }

    /// Mandatory fields this document lacks.
    pub fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        fields::MANDATORY
            .iter()
            .copied()
            .filter(|name| !self.fields.contains_key(*name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DocumentValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
