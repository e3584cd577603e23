//! # Record Indexer Repository
//!
//! This crate provides the traits the indexing core depends on (record store,
//! site provider, search connection, index queue), their error types, in-memory
//! implementations of each, and an OpenSearch-backed search connection.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod service;
pub mod types;
pub mod utils;

pub use config::SearchIndexServiceConfig;
pub use errors::{SearchIndexError, StoreError};
pub use interfaces::{IndexQueue, RecordStore, SearchConnection, SiteProvider};
pub use memory::{InMemoryIndexQueue, InMemoryRecordStore, InMemorySearchIndex, StaticSiteProvider};
pub use opensearch::OpenSearchConnection;
pub use service::SearchIndexService;
pub use types::{BatchOperationResult, BatchOperationSummary};
pub use utils::{identity_of, validate_document};
