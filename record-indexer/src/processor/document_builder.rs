//! Document builder.
//!
//! Turns one localized record into the documents submitted for one language:
//! the record's own document plus whatever additional document providers
//! derive from it.

use std::collections::HashMap;
use std::sync::Arc;

use record_indexer_repository::{validate_document, RecordStore};
use record_indexer_shared::{
    fields, DocumentIdentity, DocumentValue, FieldMapping, IndexingConfiguration, Record, Schema,
    SearchDocument,
};
use tracing::{debug, instrument, warn};

use super::field_resolver::{shape, FieldResolver};
use super::relation_resolver::RelationResolver;
use crate::context::DocumentContext;
use crate::errors::ExtensionError;
use crate::extensions::ExtensionRegistry;
use crate::localization::{LocalizationResolver, LocalizedRecord};

pub struct DocumentBuilder {
    store: Arc<dyn RecordStore>,
    schema: Arc<Schema>,
    localization: Arc<LocalizationResolver>,
    extensions: Arc<ExtensionRegistry>,
}

impl DocumentBuilder {
    pub fn new(
        store: Arc<dyn RecordStore>,
        schema: Arc<Schema>,
        localization: Arc<LocalizationResolver>,
        extensions: Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            store,
            schema,
            localization,
            extensions,
        }
    }

    /// Build the documents of one record in one language.
    ///
    /// A field that fails to resolve is logged and left out. Extension
    /// failures abort the build for this language.
    #[instrument(
        skip(self, ctx, localized, configuration),
        fields(
            run_id = %ctx.run.run_id,
            table = %localized.record.table,
            uid = localized.record.uid,
            language_id = ctx.language_id,
        )
    )]
    pub async fn build(
        &self,
        ctx: &DocumentContext<'_>,
        localized: &LocalizedRecord,
        configuration: &IndexingConfiguration,
    ) -> Result<Vec<SearchDocument>, ExtensionError> {
        let record = &localized.record;
        let relations = RelationResolver::new(
            self.store.as_ref(),
            &self.schema,
            &self.localization,
            ctx.language_id,
        );

        let mappings = self
            .effective_mappings(ctx, &relations, record, configuration)
            .await;
        let resolver = FieldResolver::new(&relations, &self.schema);

        let mut document = SearchDocument::new();
        for mapping in &mappings {
            match resolver.resolve(ctx, record, mapping).await {
                Ok(values) => {
                    if let Some(value) = shape(&mapping.name, values, mapping.effective_type()) {
                        document.set(mapping.name.clone(), value);
                    }
                }
                Err(e) => {
                    warn!(field = %mapping.name, error = %e, "Failed to resolve field, leaving it out");
                }
            }
        }

        if ctx.item.has_indexing_properties {
            for (name, value) in &ctx.item.indexing_properties {
                document.set_single(name.clone(), value.as_str());
            }
        }

        let identity = DocumentIdentity {
            table: record.table.clone(),
            record_id: record.uid,
            language_id: ctx.language_id,
            site_id: ctx.site.identifier.clone(),
        };
        document.set_identity(&identity);
        document.set_single(fields::TYPE, record.table.as_str());
        document.set_single(fields::SITE, ctx.site.domain.as_str());
        document.set_single(fields::INDEXING_CONFIGURATION, configuration.name.as_str());
        document.set_single(fields::CHANGED, ctx.item.changed.timestamp());

        let documents = self.apply_extensions(ctx, configuration, document).await?;
        debug!(document_count = documents.len(), "Built documents");
        Ok(documents)
    }

    /// Configuration fields, with page overrides from the record's rootline
    /// applied on top. Overrides on pages closer to the record win.
    async fn effective_mappings(
        &self,
        ctx: &DocumentContext<'_>,
        relations: &RelationResolver<'_>,
        record: &Record,
        configuration: &IndexingConfiguration,
    ) -> Vec<FieldMapping> {
        let mut mappings = configuration.fields.clone();
        let overrides: Vec<_> = ctx
            .site
            .page_overrides
            .iter()
            .filter(|o| o.configuration == configuration.name)
            .collect();
        if overrides.is_empty() {
            return mappings;
        }

        let rootline = match relations.rootline(record, ctx.site.root_page_id).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(error = %e, "Failed to read rootline, ignoring page field overrides");
                return mappings;
            }
        };

        // Farthest page first so nearer pages overwrite.
        for page in rootline.iter().rev() {
            for page_override in overrides.iter().filter(|o| o.page_uid == page.uid) {
                for mapping in &page_override.fields {
                    match mappings.iter_mut().find(|m| m.name == mapping.name) {
                        Some(existing) => *existing = mapping.clone(),
                        None => mappings.push(mapping.clone()),
                    }
                }
            }
        }
        mappings
    }

    /// Run the configured modifiers, then the configured providers.
    ///
    /// Every hook is resolved before any of them runs, so a misconfigured key
    /// never leaves a half-modified document behind. Additional documents must
    /// pass the same identity check as submission.
    async fn apply_extensions(
        &self,
        ctx: &DocumentContext<'_>,
        configuration: &IndexingConfiguration,
        mut document: SearchDocument,
    ) -> Result<Vec<SearchDocument>, ExtensionError> {
        let modifiers = configuration
            .document_modifiers
            .iter()
            .map(|key| Ok((key, self.extensions.modifier(key)?)))
            .collect::<Result<Vec<_>, ExtensionError>>()?;
        let providers = configuration
            .additional_document_providers
            .iter()
            .map(|key| Ok((key, self.extensions.provider(key)?)))
            .collect::<Result<Vec<_>, ExtensionError>>()?;

        for (key, modifier) in modifiers {
            let before = identity_fields(&document);
            modifier.modify(ctx.item, ctx.language_id, &mut document).await?;
            if identity_fields(&document) != before {
                return Err(ExtensionError::invalid_document(
                    key.as_str(),
                    "identity fields were changed",
                ));
            }
        }

        let mut documents = vec![document];
        for (key, provider) in providers {
            let extra = provider.process(ctx.item, ctx.language_id, &documents[0]).await?;
            for additional in extra {
                validate_document(&additional)
                    .map_err(|e| ExtensionError::invalid_document(key.as_str(), e.to_string()))?;
                documents.push(additional);
            }
        }

        Ok(dedupe_by_unique_key(documents))
    }
}

fn identity_fields(document: &SearchDocument) -> Vec<Option<DocumentValue>> {
    fields::MANDATORY
        .iter()
        .map(|name| document.get(name).cloned())
        .collect()
}

/// Collapse documents sharing a `uniqueKey`: the last one wins and takes the
/// position of the first.
pub fn dedupe_by_unique_key(documents: Vec<SearchDocument>) -> Vec<SearchDocument> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<SearchDocument> = Vec::with_capacity(documents.len());

    for document in documents {
        match document.unique_key().and_then(|key| positions.get(&key).copied()) {
            Some(position) => unique[position] = document,
            None => {
                if let Some(key) = document.unique_key() {
                    positions.insert(key, unique.len());
                }
                unique.push(document);
            }
        }
    }
    unique
}
