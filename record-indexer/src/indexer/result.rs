//! Per-item indexing results.

use std::collections::BTreeMap;

use record_indexer_shared::{Item, LanguageId, RecordId};

/// What happened to one language of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageOutcome {
    /// Every document of the language was accepted.
    Submitted { documents: usize },
    /// Nothing was built for the language.
    Skipped { reason: String },
    /// Building or submitting failed.
    Failed { error: String },
}

impl LanguageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LanguageOutcome::Failed { .. })
    }
}

/// Outcome of indexing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResult {
    pub item_uid: u64,
    pub table: String,
    pub record_uid: RecordId,
    pub languages: BTreeMap<LanguageId, LanguageOutcome>,
    /// Item-level failure: no site, no record, no configuration.
    pub error: Option<String>,
}

impl IndexResult {
    pub fn new(item: &Item) -> Self {
        Self {
            item_uid: item.uid,
            table: item.table.clone(),
            record_uid: item.record_uid,
            languages: BTreeMap::new(),
            error: None,
        }
    }

    /// Whether the item needs no retry.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.languages.values().any(LanguageOutcome::is_failure)
    }

    /// Number of documents accepted across all languages.
    pub fn submitted_documents(&self) -> usize {
        self.languages
            .values()
            .map(|outcome| match outcome {
                LanguageOutcome::Submitted { documents } => *documents,
                _ => 0,
            })
            .sum()
    }

    /// Item error and language failures joined for the queue's error column.
    pub fn error_summary(&self) -> Option<String> {
        let mut parts: Vec<String> = self.error.iter().cloned().collect();
        parts.extend(self.languages.iter().filter_map(|(language_id, outcome)| match outcome {
            LanguageOutcome::Failed { error } => Some(format!("language {}: {}", language_id, error)),
            _ => None,
        }));

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}
