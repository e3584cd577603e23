//! Localization resolver.
//!
//! Decides which language variants of a record are indexed and builds each
//! variant by overlaying the translation row onto the default-language row.

use std::collections::BTreeMap;
use std::sync::Arc;

use record_indexer_repository::{RecordStore, StoreError};
use record_indexer_shared::{
    FallbackPolicy, LanguageId, Predicate, Record, RecordId, Schema, Scalar, TableSchema,
};
use tracing::debug;

/// Field an overlaid record uses to remember the uid of its translation row.
pub const LOCALIZED_UID_FIELD: &str = "_LOCALIZED_UID";

/// Language value marking a record valid in every language.
pub const ALL_LANGUAGES: i64 = -1;

/// Where the content of a localized record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSource {
    /// The record itself, in its own language.
    Base,
    /// The default-language record overlaid with a translation row.
    Translation,
    /// The default-language record, used because no translation exists.
    Fallback,
    /// A record marked valid for all languages.
    AllLanguages,
    /// A record of a table without localization.
    Untranslatable,
}

/// A record as it is indexed for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedRecord {
    pub language_id: LanguageId,
    /// Effective field values. `uid` is always the default-language uid.
    pub record: Record,
    /// Uid of the translation row the fields came from, if any.
    pub localized_uid: Option<RecordId>,
    pub source: VariantSource,
}

/// Apply a translation row on top of its base record.
///
/// Non-empty translated fields replace base fields; control fields (`uid`,
/// `pid`, language and parent fields) are kept from the base record.
pub fn overlay(base: &Record, translation: &Record, table: &TableSchema) -> Record {
    let control = table.control_fields();
    let mut record = base.clone();

    for (name, value) in &translation.fields {
        if value.is_empty() || control.contains(&name.as_str()) {
            continue;
        }
        record.set(name.clone(), value.clone());
    }
    record.set(LOCALIZED_UID_FIELD, translation.uid);
    record
}

/// Uid of the translation row an overlaid record was built from.
pub fn localized_uid(record: &Record) -> Option<RecordId> {
    record
        .get_i64(LOCALIZED_UID_FIELD)
        .and_then(|uid| RecordId::try_from(uid).ok())
}

/// Looks up translations in the record store.
pub struct LocalizationResolver {
    store: Arc<dyn RecordStore>,
    schema: Arc<Schema>,
}

impl LocalizationResolver {
    pub fn new(store: Arc<dyn RecordStore>, schema: Arc<Schema>) -> Self {
        Self { store, schema }
    }

    /// The translation row of `record` in `language_id`, if one exists.
    pub async fn translation(
        &self,
        record: &Record,
        language_id: LanguageId,
    ) -> Result<Option<Record>, StoreError> {
        if language_id == 0 {
            return Ok(None);
        }
        let Some(table) = self.schema.table(&record.table) else {
            return Ok(None);
        };
        let (Some(language_field), Some(parent_field)) = (
            table.language_field.as_deref(),
            table.translation_parent_field.as_deref(),
        ) else {
            return Ok(None);
        };

        let predicate = Predicate::eq(language_field, language_id)
            .and(Predicate::eq(parent_field, record.uid));
        let mut rows = self.store.fetch_related(&record.table, &predicate).await?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// `record` overlaid into `language_id`, or `record` itself when it has no
    /// translation there.
    pub async fn overlay_in(
        &self,
        record: &Record,
        language_id: LanguageId,
    ) -> Result<Record, StoreError> {
        let Some(table) = self.schema.table(&record.table) else {
            return Ok(record.clone());
        };
        if localized_uid(record).is_some() {
            return Ok(record.clone());
        }

        Ok(match self.translation(record, language_id).await? {
            Some(translation) => overlay(record, &translation, table),
            None => record.clone(),
        })
    }

    /// Resolve the variant of `base` for every requested language.
    ///
    /// A language without a translation is filled from the default-language
    /// record when its policy allows fallback and omitted otherwise.
    pub async fn resolve_variants(
        &self,
        base: &Record,
        languages: &[(LanguageId, FallbackPolicy)],
    ) -> Result<BTreeMap<LanguageId, LocalizedRecord>, StoreError> {
        let mut variants = BTreeMap::new();

        let table = match self.schema.table(&base.table) {
            Some(table) if table.is_localizable() => table,
            _ => {
                for (language_id, _) in languages {
                    variants.insert(
                        *language_id,
                        unchanged(base, *language_id, VariantSource::Untranslatable),
                    );
                }
                return Ok(variants);
            }
        };

        let record_language = table
            .language_field
            .as_deref()
            .and_then(|field| base.get_i64(field))
            .unwrap_or(0);

        if record_language == ALL_LANGUAGES {
            for (language_id, _) in languages {
                variants.insert(
                    *language_id,
                    unchanged(base, *language_id, VariantSource::AllLanguages),
                );
            }
            return Ok(variants);
        }

        if record_language > 0 {
            // A record created directly in a non-default language exists only there.
            for (language_id, _) in languages {
                if i64::from(*language_id) == record_language {
                    variants.insert(*language_id, unchanged(base, *language_id, VariantSource::Base));
                }
            }
            return Ok(variants);
        }

        for (language_id, policy) in languages {
            let language_id = *language_id;
            if language_id == 0 {
                variants.insert(0, unchanged(base, 0, VariantSource::Base));
                continue;
            }

            if let Some(variant) = self.translated_variant(base, table, language_id, language_id).await? {
                variants.insert(language_id, variant);
                continue;
            }

            match policy {
                FallbackPolicy::Strict => {
                    debug!(
                        table = %base.table,
                        uid = base.uid,
                        language_id = language_id,
                        "No translation and no fallback, skipping language"
                    );
                }
                FallbackPolicy::Fallback { chain } => {
                    let mut resolved = None;
                    for candidate in chain.iter().copied().filter(|c| *c != 0 && *c != language_id) {
                        resolved = self
                            .translated_variant(base, table, candidate, language_id)
                            .await?;
                        if resolved.is_some() {
                            break;
                        }
                    }
                    let variant = resolved
                        .unwrap_or_else(|| unchanged(base, language_id, VariantSource::Fallback));
                    variants.insert(language_id, variant);
                }
            }
        }

        Ok(variants)
    }

    /// The overlay of `base` with its translation in `content_language`,
    /// indexed as `language_id`.
    async fn translated_variant(
        &self,
        base: &Record,
        table: &TableSchema,
        content_language: LanguageId,
        language_id: LanguageId,
    ) -> Result<Option<LocalizedRecord>, StoreError> {
        Ok(self
            .translation(base, content_language)
            .await?
            .map(|translation| LocalizedRecord {
                language_id,
                record: overlay(base, &translation, table),
                localized_uid: Some(translation.uid),
                source: if content_language == language_id {
                    VariantSource::Translation
                } else {
                    VariantSource::Fallback
                },
            }))
    }
}

fn unchanged(base: &Record, language_id: LanguageId, source: VariantSource) -> LocalizedRecord {
    LocalizedRecord {
        language_id,
        record: base.clone(),
        localized_uid: None,
        source,
    }
}

/// Whether a record is a translation row pointing at a parent.
pub fn translation_parent(record: &Record, schema: &Schema) -> Option<RecordId> {
    let field = schema.table(&record.table)?.translation_parent_field.as_deref()?;
    record
        .get(field)
        .and_then(|v| v.as_scalar())
        .and_then(Scalar::as_i64)
        .filter(|parent| *parent > 0)
        .and_then(|parent| RecordId::try_from(parent).ok())
}
