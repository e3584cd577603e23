//! Indexer.
//!
//! Indexes one queue item: routes it to its site's connections, resolves
//! the record's language variants, builds the documents of every language
//! and submits them.

mod result;

pub use result::{IndexResult, LanguageOutcome};

use std::sync::Arc;

use record_indexer_repository::{RecordStore, SearchConnection, SiteProvider};
use record_indexer_shared::{FallbackPolicy, Item, LanguageId, Record, Schema};
use tracing::{debug, error, info, instrument, warn};

use crate::context::{DocumentContext, IndexingContext};
use crate::errors::IndexerError;
use crate::extensions::ExtensionRegistry;
use crate::loader::{LoaderConfig, SubmissionBatch, SubmissionLoader};
use crate::localization::{translation_parent, LocalizationResolver};
use crate::processor::DocumentBuilder;
use crate::routing::{ConnectionRouter, Route};

/// Configuration for the indexer.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    pub loader: LoaderConfig,
}

pub struct Indexer {
    store: Arc<dyn RecordStore>,
    schema: Arc<Schema>,
    router: ConnectionRouter,
    localization: Arc<LocalizationResolver>,
    builder: DocumentBuilder,
    loader: SubmissionLoader,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sites: Arc<dyn SiteProvider>,
        connection: Arc<dyn SearchConnection>,
        schema: Arc<Schema>,
        extensions: Arc<ExtensionRegistry>,
    ) -> Self {
        Self::with_config(
            store,
            sites,
            connection,
            schema,
            extensions,
            IndexerConfig::default(),
        )
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        sites: Arc<dyn SiteProvider>,
        connection: Arc<dyn SearchConnection>,
        schema: Arc<Schema>,
        extensions: Arc<ExtensionRegistry>,
        config: IndexerConfig,
    ) -> Self {
        let localization = Arc::new(LocalizationResolver::new(store.clone(), schema.clone()));
        Self {
            router: ConnectionRouter::new(sites, store.clone()),
            builder: DocumentBuilder::new(
                store.clone(),
                schema.clone(),
                localization.clone(),
                extensions,
            ),
            loader: SubmissionLoader::with_config(connection, config.loader),
            store,
            schema,
            localization,
        }
    }

    /// Index one item.
    ///
    /// Never fails: item-level errors and per-language failures are
    /// reported in the result.
    #[instrument(skip(self, item), fields(item_uid = item.uid, item = %item.label()))]
    pub async fn index(&self, item: &Item) -> IndexResult {
        let run = IndexingContext::new();
        let mut result = IndexResult::new(item);

        if let Err(e) = self.index_languages(&run, item, &mut result).await {
            error!(run_id = %run.run_id, error = %e, "Failed to index item");
            result.error = Some(e.to_string());
        } else if result.is_success() {
            debug!(
                run_id = %run.run_id,
                documents = result.submitted_documents(),
                "Indexed item"
            );
        } else {
            warn!(
                run_id = %run.run_id,
                errors = ?result.error_summary(),
                "Indexed item with failures"
            );
        }

        result
    }

    async fn index_languages(
        &self,
        run: &IndexingContext,
        item: &Item,
        result: &mut IndexResult,
    ) -> Result<(), IndexerError> {
        let Route { site, connections } = self.router.route(item).await?;
        if connections.is_empty() {
            info!(site = %site.identifier, "No connections for item, nothing to do");
            return Ok(());
        }

        let configuration = site
            .indexing_configuration(&item.indexing_configuration, &item.table)
            .ok_or_else(|| IndexerError::ConfigurationNotFound {
                name: item.indexing_configuration.clone(),
                table: item.table.clone(),
            })?;
        let base = self.base_record(item).await?;

        let languages: Vec<(LanguageId, FallbackPolicy)> = connections
            .keys()
            .map(|id| {
                let policy = site
                    .language(*id)
                    .map(|language| language.fallback.clone())
                    .unwrap_or_default();
                (*id, policy)
            })
            .collect();
        let variants = self.localization.resolve_variants(&base, &languages).await?;

        let mut batches = Vec::with_capacity(connections.len());
        for (language_id, connection) in &connections {
            let Some(localized) = variants.get(language_id) else {
                result.languages.insert(
                    *language_id,
                    LanguageOutcome::Skipped {
                        reason: "no record for language".to_string(),
                    },
                );
                continue;
            };

            let ctx = DocumentContext::new(run, item, &site, *language_id);
            match self.builder.build(&ctx, localized, configuration).await {
                Ok(documents) => batches.push(SubmissionBatch {
                    language_id: *language_id,
                    connection: connection.clone(),
                    documents,
                }),
                Err(e) => {
                    let e = IndexerError::from(e);
                    warn!(language_id = *language_id, error = %e, "Failed to build documents");
                    result
                        .languages
                        .insert(*language_id, LanguageOutcome::Failed { error: e.to_string() });
                }
            }
        }

        for (language_id, outcome) in self.loader.submit(&batches).await {
            result.languages.insert(language_id, outcome);
        }
        Ok(())
    }

    /// The default-language record of an item. An item pointing at a
    /// translation row is indexed through its parent.
    async fn base_record(&self, item: &Item) -> Result<Record, IndexerError> {
        let record = self
            .store
            .fetch_record(&item.table, item.record_uid)
            .await?
            .ok_or_else(|| IndexerError::record_not_found(&item.table, item.record_uid))?;

        match translation_parent(&record, &self.schema) {
            Some(parent) => self
                .store
                .fetch_record(&item.table, parent)
                .await?
                .ok_or_else(|| IndexerError::record_not_found(&item.table, parent)),
            None => Ok(record),
        }
    }
}
