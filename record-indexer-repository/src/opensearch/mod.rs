//! OpenSearch implementation of the search connection.
//!
//! Each connection core is an OpenSearch index; documents are stored under
//! their `uniqueKey`.

mod connection;
mod index_config;

pub use connection::OpenSearchConnection;
pub use index_config::IndexConfig;
