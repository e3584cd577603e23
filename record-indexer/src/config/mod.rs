//! Configuration and dependency initialization.

mod dependencies;
mod settings;

pub use dependencies::{ConnectionMode, Dependencies, SearchBackend};
pub use settings::IndexerSettings;
