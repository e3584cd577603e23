//! This module defines the data structures shared across the record indexer:
//! records and their values, queue items, search documents, and the
//! configuration types (field mappings, table schema, sites).

pub mod document;
pub mod item;
pub mod mapping;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod site;
pub mod value;

pub use document::{fields, DocumentIdentity, DocumentValue, LanguageId, SearchDocument};
pub use item::Item;
pub use mapping::{
    AdditionalWhere, FieldMapping, FieldRule, FieldType, IndexingConfiguration, OrderBy,
    PageFieldOverride, RelationRule, RootlineRule, WhereTarget,
};
pub use predicate::Predicate;
pub use record::{Record, RecordId, PAGES_TABLE, PID_FIELD, UID_FIELD};
pub use schema::{ColumnRelation, MmRelation, Schema, TableSchema};
pub use site::{ConnectionConfig, ConnectionHandle, FallbackPolicy, SiteConfig, SiteLanguage};
pub use value::{Scalar, Value};
