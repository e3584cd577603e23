//! # Record Indexer Shared
//!
//! This crate defines the data structures shared by the record indexer crates.
//! It has no I/O: records, queue items, search documents and the indexing
//! configuration are plain serde types.

pub mod types;

pub use types::*;
