//! Relation resolver.
//!
//! Follows relation columns from a source record to the related rows: direct
//! foreign keys, many-to-many relations through a junction table, and the
//! page rootline. Every related row is returned overlaid into the language
//! of the document being built.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use record_indexer_repository::{RecordStore, StoreError};
use record_indexer_shared::{
    AdditionalWhere, ColumnRelation, LanguageId, MmRelation, Predicate, Record, RecordId, Schema,
    Scalar, Value, WhereTarget, PAGES_TABLE, UID_FIELD,
};
use tracing::warn;

use crate::errors::ResolveError;
use crate::localization::{localized_uid, LocalizationResolver};

/// Maximum number of relations one field rule may follow, its own included.
pub const MAX_RELATION_DEPTH: usize = 2;

/// Rootline walks stop after this many pages.
pub const MAX_ROOTLINE_DEPTH: usize = 99;

type CacheKey = (String, RecordId);

/// Resolves relations for one document build.
///
/// Fetched rows are memoized for the lifetime of the resolver. A resolver is
/// created per document and dropped with it, so nothing read for one
/// document is visible to another.
pub struct RelationResolver<'a> {
    store: &'a dyn RecordStore,
    schema: &'a Schema,
    localization: &'a LocalizationResolver,
    language_id: LanguageId,
    cache: Mutex<HashMap<CacheKey, Option<Record>>>,
}

impl<'a> RelationResolver<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        schema: &'a Schema,
        localization: &'a LocalizationResolver,
        language_id: LanguageId,
    ) -> Self {
        Self {
            store,
            schema,
            localization,
            language_id,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// One row, overlaid into the resolver's language.
    pub async fn fetch(&self, table: &str, uid: RecordId) -> Result<Option<Record>, StoreError> {
        let key = (table.to_string(), uid);
        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let row = match self.store.fetch_record(table, uid).await? {
            Some(row) => Some(self.localization.overlay_in(&row, self.language_id).await?),
            None => None,
        };
        self.remember(key, row.clone());
        Ok(row)
    }

    /// Identifiers of the rows related to `source` through `column`, in relation order.
    pub async fn resolve_related_ids(
        &self,
        source: &Record,
        column: &str,
        additional_where: Option<&AdditionalWhere>,
    ) -> Result<Vec<RecordId>, ResolveError> {
        Ok(self
            .related(source, column, additional_where)
            .await?
            .iter()
            .map(|row| row.uid)
            .collect())
    }

    /// Rows related to `source` through `column`, in relation order.
    ///
    /// Missing foreign rows are skipped. No match is an empty list.
    pub async fn related(
        &self,
        source: &Record,
        column: &str,
        additional_where: Option<&AdditionalWhere>,
    ) -> Result<Vec<Record>, ResolveError> {
        let relation = self.relation(&source.table, column)?;

        match &relation.mm {
            None => {
                self.direct(source, column, relation, additional_where)
                    .await
            }
            Some(mm) => self.many_to_many(source, relation, mm, additional_where).await,
        }
    }

    /// Relation metadata of a column, checked against the schema.
    pub fn relation(&self, table: &str, column: &str) -> Result<&'a ColumnRelation, ResolveError> {
        let relation = self
            .schema
            .relation(table, column)
            .ok_or_else(|| ResolveError::unknown_relation(table, column))?;
        if self.schema.table(&relation.foreign_table).is_none() {
            return Err(ResolveError::UnknownTable(relation.foreign_table.clone()));
        }
        Ok(relation)
    }

    /// Direct relation: the local field lists foreign uids.
    ///
    /// Candidates are confirmed by one existence query against the foreign
    /// table, with the additional predicate applied there.
    async fn direct(
        &self,
        source: &Record,
        column: &str,
        relation: &ColumnRelation,
        additional_where: Option<&AdditionalWhere>,
    ) -> Result<Vec<Record>, ResolveError> {
        let filter = match additional_where {
            Some(w) if w.target == WhereTarget::Junction => {
                return Err(ResolveError::invalid_rule(format!(
                    "additional_where targets junction rows but '{}.{}' is a direct relation",
                    source.table, column
                )));
            }
            Some(w) => Some(&w.predicate),
            None => None,
        };

        let uids = parse_uid_list(&source.value_of(column));
        Ok(self
            .fetch_in_order(&relation.foreign_table, &uids, filter)
            .await?)
    }

    /// Many-to-many relation through a junction table.
    ///
    /// Junction rows are ordered by the sort column, ties keeping storage
    /// order. The additional predicate filters junction rows or foreign rows
    /// depending on its target.
    async fn many_to_many(
        &self,
        source: &Record,
        relation: &ColumnRelation,
        mm: &MmRelation,
        additional_where: Option<&AdditionalWhere>,
    ) -> Result<Vec<Record>, ResolveError> {
        let (junction_filter, foreign_filter) = match additional_where {
            Some(w) if w.target == WhereTarget::Junction => (Some(&w.predicate), None),
            Some(w) => (None, Some(&w.predicate)),
            None => (None, None),
        };

        // A translation may carry its own junction rows; otherwise it shares
        // the default-language ones.
        let mut candidates: Vec<RecordId> = localized_uid(source).into_iter().collect();
        candidates.push(source.uid);

        let mut junction_rows = Vec::new();
        for candidate in candidates {
            let mut predicate = Predicate::eq(&mm.local_column, candidate);
            for (field, value) in &mm.match_fields {
                predicate = predicate.and(Predicate::Eq {
                    field: field.clone(),
                    value: value.clone(),
                });
            }
            if let Some(filter) = junction_filter {
                predicate = predicate.and(filter.clone());
            }

            junction_rows = self.store.fetch_related(&mm.table, &predicate).await?;
            if !junction_rows.is_empty() {
                break;
            }
        }

        junction_rows.sort_by_key(|row| row.get_i64(&mm.sort_column).unwrap_or(0));

        let uids: Vec<RecordId> = dedupe(
            junction_rows
                .iter()
                .flat_map(|row| parse_uid_list(&row.value_of(&mm.foreign_column))),
        );

        Ok(self
            .fetch_in_order(&relation.foreign_table, &uids, foreign_filter)
            .await?)
    }

    /// Fetch `uids` of `table` in the given order with one query, skipping
    /// rows that do not exist or fail `filter`.
    async fn fetch_in_order(
        &self,
        table: &str,
        uids: &[RecordId],
        filter: Option<&Predicate>,
    ) -> Result<Vec<Record>, StoreError> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let mut predicate = Predicate::is_in(UID_FIELD, uids.iter().copied());
        if let Some(filter) = filter {
            predicate = predicate.and(filter.clone());
        }

        let mut found: HashMap<RecordId, Record> = self
            .store
            .fetch_related(table, &predicate)
            .await?
            .into_iter()
            .map(|row| (row.uid, row))
            .collect();

        let mut rows = Vec::with_capacity(found.len());
        for uid in uids {
            let Some(row) = found.remove(uid) else {
                continue;
            };
            let key = (table.to_string(), *uid);
            let row = match self.cached(&key) {
                Some(Some(cached)) => cached,
                _ => {
                    let overlaid = self.localization.overlay_in(&row, self.language_id).await?;
                    self.remember(key, Some(overlaid.clone()));
                    overlaid
                }
            };
            rows.push(row);
        }
        Ok(rows)
    }

    /// Ancestor pages of the record's page, nearest first, up to `root`.
    ///
    /// The walk starts at the record itself for pages and at its `pid`
    /// otherwise, and stops at `root`, at a page with `pid = 0`, at a missing
    /// page, on a cycle, or after `MAX_ROOTLINE_DEPTH` pages.
    pub async fn rootline(&self, record: &Record, root: RecordId) -> Result<Vec<Record>, StoreError> {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut next = record.page_uid().filter(|uid| *uid > 0);

        while let Some(uid) = next {
            if !visited.insert(uid) {
                warn!(table = %record.table, uid = record.uid, page = uid, "Rootline contains a cycle");
                break;
            }
            if pages.len() >= MAX_ROOTLINE_DEPTH {
                warn!(
                    table = %record.table,
                    uid = record.uid,
                    max_depth = MAX_ROOTLINE_DEPTH,
                    "Rootline too deep"
                );
                break;
            }

            let Some(page) = self.fetch(PAGES_TABLE, uid).await? else {
                break;
            };
            next = if uid == root {
                None
            } else {
                page.pid().filter(|pid| *pid > 0)
            };
            pages.push(page);
        }

        Ok(pages)
    }

    fn cached(&self, key: &CacheKey) -> Option<Option<Record>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    fn remember(&self, key: CacheKey, row: Option<Record>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(key, row);
    }
}

/// Parse a relation value into uids: a list, one integer or a comma-separated
/// string. Blank, non-numeric and non-positive entries are ignored; order is
/// kept and duplicates are dropped.
pub fn parse_uid_list(value: &Value) -> Vec<RecordId> {
    let uids = value.scalars().into_iter().flat_map(|scalar| match scalar {
        Scalar::Text(text) => text
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect::<Vec<_>>(),
        other => other.as_i64().into_iter().collect(),
    });

    dedupe(
        uids.filter(|uid| *uid > 0)
            .filter_map(|uid| RecordId::try_from(uid).ok()),
    )
}

fn dedupe(uids: impl Iterator<Item = RecordId>) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    uids.filter(|uid| seen.insert(*uid)).collect()
}
