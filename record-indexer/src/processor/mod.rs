//! Processor module for the record indexer.
//!
//! Transforms localized records into search documents.

mod document_builder;
mod field_resolver;
mod relation_resolver;

pub use document_builder::{dedupe_by_unique_key, DocumentBuilder};
pub use field_resolver::{record_link, shape, FieldResolver, SINGLE_VALUE_SEPARATOR};
pub use relation_resolver::{
    parse_uid_list, RelationResolver, MAX_RELATION_DEPTH, MAX_ROOTLINE_DEPTH,
};
