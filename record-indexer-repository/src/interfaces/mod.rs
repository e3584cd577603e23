//! Interface definitions for the collaborators of the indexing core.
//!
//! These traits allow dependency injection of record stores, site providers,
//! search connections and index queues, so the core can be driven by the
//! in-memory backends in tests and by real backends in production.

mod index_queue;
mod record_store;
mod search_connection;
mod site_provider;

pub use index_queue::IndexQueue;
pub use record_store::RecordStore;
pub use search_connection::SearchConnection;
pub use site_provider::SiteProvider;
