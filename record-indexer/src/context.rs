//! Explicit indexing context.
//!
//! Everything the resolvers need to know about "where" a document is built
//! (item, site, language) travels in these values instead of ambient state.

use chrono::{DateTime, Utc};
use record_indexer_shared::{Item, LanguageId, SiteConfig, SiteLanguage};
use uuid::Uuid;

/// One call of `Indexer::index`.
#[derive(Debug, Clone)]
pub struct IndexingContext {
    /// Identifier used to correlate log lines of one run.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl IndexingContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for IndexingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// One document build: an item rendered for one site language.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub run: &'a IndexingContext,
    pub item: &'a Item,
    pub site: &'a SiteConfig,
    pub language_id: LanguageId,
}

impl<'a> DocumentContext<'a> {
    pub fn new(
        run: &'a IndexingContext,
        item: &'a Item,
        site: &'a SiteConfig,
        language_id: LanguageId,
    ) -> Self {
        Self {
            run,
            item,
            site,
            language_id,
        }
    }

    pub fn language(&self) -> Option<&'a SiteLanguage> {
        self.site.language(self.language_id)
    }
}
