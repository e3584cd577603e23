//! In-memory implementations of the collaborator traits.
//!
//! Used by the binary when no external backend is configured and by tests.
//! Locks are synchronous and never held across an await point.

mod index_queue;
mod record_store;
mod search_index;
mod site_provider;

pub use index_queue::InMemoryIndexQueue;
pub use record_store::InMemoryRecordStore;
pub use search_index::InMemorySearchIndex;
pub use site_provider::StaticSiteProvider;
