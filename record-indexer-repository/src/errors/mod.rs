//! Error types for the record indexer repository.
//!
//! `StoreError` covers the read side (records, sites, queue); `SearchIndexError`
//! covers document submission.

mod search_index_error;
mod store_error;

pub use search_index_error::SearchIndexError;
pub use store_error::StoreError;
