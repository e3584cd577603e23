//! Full reindex initialization.
//!
//! Enqueues every default-language record of every table a site indexes.

use record_indexer_repository::{IndexQueue, RecordStore};
use record_indexer_shared::{Predicate, Record, RecordId, Schema, SiteConfig, PAGES_TABLE};
use tracing::{debug, info, instrument};

use crate::errors::IngestError;
use crate::localization::{translation_parent, LocalizationResolver};
use crate::processor::RelationResolver;

/// Enqueue every record of `site` for reindexing.
///
/// Only default-language rows inside the site's page tree are enqueued;
/// translations are indexed through their parent. Returns the number of
/// items enqueued.
#[instrument(skip(queue, localization, store, schema, site), fields(site = %site.identifier))]
pub async fn enqueue_site(
    queue: &dyn IndexQueue,
    store: &dyn RecordStore,
    schema: &Schema,
    localization: &LocalizationResolver,
    site: &SiteConfig,
) -> Result<usize, IngestError> {
    let relations = RelationResolver::new(store, schema, localization, 0);
    let mut enqueued = 0;

    for configuration in &site.indexing_configurations {
        if schema.table(&configuration.table).is_none() {
            return Err(IngestError::initialization(format!(
                "indexing configuration '{}' references unknown table '{}'",
                configuration.name, configuration.table
            )));
        }

        let records = store
            .fetch_related(&configuration.table, &Predicate::All { predicates: Vec::new() })
            .await?;

        for record in records {
            if translation_parent(&record, schema).is_some() {
                continue;
            }
            if !in_site_tree(&relations, &record, site.root_page_id).await? {
                continue;
            }
            queue
                .update_item(
                    &configuration.table,
                    record.uid,
                    site.root_page_id,
                    &configuration.name,
                )
                .await?;
            enqueued += 1;
        }
        debug!(configuration = %configuration.name, "Enqueued configuration");
    }

    info!(items = enqueued, "Enqueued site for reindexing");
    Ok(enqueued)
}

async fn in_site_tree(
    relations: &RelationResolver<'_>,
    record: &Record,
    root: RecordId,
) -> Result<bool, IngestError> {
    if record.table == PAGES_TABLE && record.uid == root {
        return Ok(true);
    }
    let rootline = relations.rootline(record, root).await?;
    Ok(rootline.iter().any(|page| page.uid == root))
}
