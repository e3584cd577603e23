//! In-memory search index.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use record_indexer_shared::{ConnectionHandle, SearchDocument};
use tracing::debug;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchConnection;
use crate::utils::validate_document;

/// Documents of one core, in first-submission order.
type Core = Vec<SearchDocument>;

/// A search backend that keeps one document list per core.
///
/// Submitting a document replaces the document with the same `uniqueKey` in
/// place, so repeated indexing runs never produce duplicates.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    cores: RwLock<BTreeMap<String, Core>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of a core.
    pub fn documents(&self, core: &str) -> Vec<SearchDocument> {
        let cores = self.cores.read().unwrap_or_else(|e| e.into_inner());
        cores.get(core).cloned().unwrap_or_default()
    }

    /// Number of documents in a core.
    pub fn num_found(&self, core: &str) -> usize {
        let cores = self.cores.read().unwrap_or_else(|e| e.into_inner());
        cores.get(core).map_or(0, Vec::len)
    }

    /// Number of documents across all cores.
    pub fn total(&self) -> usize {
        let cores = self.cores.read().unwrap_or_else(|e| e.into_inner());
        cores.values().map(Vec::len).sum()
    }

    /// The document with `unique_key` in a core.
    pub fn find(&self, core: &str, unique_key: &str) -> Option<SearchDocument> {
        self.documents(core)
            .into_iter()
            .find(|d| d.unique_key().as_deref() == Some(unique_key))
    }

    /// Drop every document.
    pub fn clear(&self) {
        let mut cores = self.cores.write().unwrap_or_else(|e| e.into_inner());
        cores.clear();
    }
}

#[async_trait]
impl SearchConnection for InMemorySearchIndex {
    async fn submit(
        &self,
        connection: &ConnectionHandle,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        let unique_key = validate_document(document)?;
        if connection.core.trim().is_empty() {
            return Err(SearchIndexError::core_not_found(connection.core.clone()));
        }

        let mut cores = self
            .cores
            .write()
            .map_err(|e| SearchIndexError::unknown(e.to_string()))?;
        let core = cores.entry(connection.core.clone()).or_default();

        match core
            .iter_mut()
            .find(|d| d.unique_key().as_deref() == Some(unique_key.as_str()))
        {
            Some(existing) => *existing = document.clone(),
            None => core.push(document.clone()),
        }

        debug!(core = %connection.core, unique_key = %unique_key, "Document stored");
        Ok(())
    }
}
