//! Shared fixtures for the integration tests.
//!
//! Two sites: `integration_tree_one` (testone.site, root page 1, English on
//! `core_en`, German on `core_de`) and `integration_tree_two` (testtwo.site,
//! root page 111 nested below page 1, English on `core_en`).

#![allow(dead_code)]

use std::sync::Arc;

use record_indexer::extensions::ExtensionRegistry;
use record_indexer::indexer::{IndexResult, Indexer};
use record_indexer::orchestrator::Orchestrator;
use record_indexer_repository::{
    IndexQueue, InMemoryIndexQueue, InMemoryRecordStore, InMemorySearchIndex, SearchConnection,
    SearchIndexService, StaticSiteProvider,
};
use record_indexer_shared::{
    ColumnRelation, FallbackPolicy, FieldMapping, FieldRule, IndexingConfiguration, MmRelation,
    Record, RecordId, RelationRule, Schema, Scalar, SearchDocument, SiteConfig, SiteLanguage,
    TableSchema, PAGES_TABLE,
};

pub const BAR: &str = "tx_bar";
pub const TAG: &str = "tx_tag";
pub const BAR_TAG_MM: &str = "tx_bar_tag_mm";
pub const BAR_PAGES_MM: &str = "tx_bar_pages_mm";
pub const CATEGORY: &str = "tx_category";
pub const SYS_CATEGORY: &str = "sys_category";

pub const SITE_ONE_ROOT: RecordId = 1;
pub const SITE_TWO_ROOT: RecordId = 111;

pub fn schema() -> Schema {
    Schema::new(vec![
        TableSchema::new(PAGES_TABLE).localized("sys_language_uid", "l10n_parent"),
        TableSchema::new(BAR)
            .localized("sys_language_uid", "l18n_parent")
            .with_relation(
                "tags",
                ColumnRelation::many_to_many(TAG, MmRelation::new(BAR_TAG_MM)),
            )
            .with_relation(
                "related_pages",
                ColumnRelation::many_to_many(PAGES_TABLE, MmRelation::new(BAR_PAGES_MM)),
            )
            .with_relation("category", ColumnRelation::direct(CATEGORY)),
        TableSchema::new(TAG)
            .with_label("tag")
            .localized("sys_language_uid", "l18n_parent"),
        TableSchema::new(CATEGORY).with_relation("category", ColumnRelation::direct(SYS_CATEGORY)),
        TableSchema::new(SYS_CATEGORY),
    ])
}

/// Page tree shared by every test: site one at 1, a folder at 2, site two at
/// 111 below page 1 and a page outside of both sites at 50.
pub fn pages() -> Vec<Record> {
    vec![
        page(SITE_ONE_ROOT, 0, "Site one"),
        page(2, SITE_ONE_ROOT, "Records"),
        page(SITE_TWO_ROOT, SITE_ONE_ROOT, "Site two"),
        page(112, SITE_TWO_ROOT, "Records two"),
        page(50, 0, "External"),
    ]
}

pub fn page(uid: RecordId, pid: RecordId, title: &str) -> Record {
    Record::new(PAGES_TABLE, uid)
        .with_field("pid", pid)
        .with_field("sys_language_uid", 0i64)
        .with_field("title", title)
}

pub fn bar(uid: RecordId, pid: RecordId, title: &str) -> Record {
    Record::new(BAR, uid)
        .with_field("pid", pid)
        .with_field("sys_language_uid", 0i64)
        .with_field("title", title)
}

pub fn bar_translation(uid: RecordId, parent: RecordId, title: &str) -> Record {
    Record::new(BAR, uid)
        .with_field("pid", 2u64)
        .with_field("sys_language_uid", 1i64)
        .with_field("l18n_parent", parent)
        .with_field("title", title)
}

pub fn tag(uid: RecordId, label: &str) -> Record {
    Record::new(TAG, uid)
        .with_field("pid", 2u64)
        .with_field("sys_language_uid", 0i64)
        .with_field("tag", label)
}

pub fn junction(table: &str, uid: RecordId, local: RecordId, foreign: RecordId, sorting: i64) -> Record {
    Record::new(table, uid)
        .with_field("uid_local", local)
        .with_field("uid_foreign", foreign)
        .with_field("sorting", sorting)
}

pub fn title() -> FieldMapping {
    FieldMapping::new("title", FieldRule::field("title"))
}

pub fn relation(name: &str, rule: RelationRule) -> FieldMapping {
    FieldMapping::new(name, FieldRule::Relation(rule))
}

pub fn link() -> FieldMapping {
    FieldMapping::new(
        "url",
        FieldRule::Link {
            parameters: "tx_foo[uid]={uid}".to_string(),
        },
    )
}

pub fn bar_configuration(fields: Vec<FieldMapping>) -> IndexingConfiguration {
    let mut configuration = IndexingConfiguration::new("bar", BAR);
    configuration.fields = fields;
    configuration
}

pub fn site_one(configuration: IndexingConfiguration) -> SiteConfig {
    SiteConfig::new("integration_tree_one", "testone.site", SITE_ONE_ROOT)
        .with_language(SiteLanguage::new(0, "/en/").with_core("core_en"))
        .with_language(SiteLanguage::new(1, "/de/").with_core("core_de"))
        .with_configuration(configuration)
}

pub fn site_one_with_fallback(configuration: IndexingConfiguration) -> SiteConfig {
    SiteConfig::new("integration_tree_one", "testone.site", SITE_ONE_ROOT)
        .with_language(SiteLanguage::new(0, "/en/").with_core("core_en"))
        .with_language(
            SiteLanguage::new(1, "/de/")
                .with_core("core_de")
                .with_fallback(FallbackPolicy::Fallback { chain: vec![0] }),
        )
        .with_configuration(configuration)
}

pub fn site_two(configuration: IndexingConfiguration) -> SiteConfig {
    SiteConfig::new("integration_tree_two", "testtwo.site", SITE_TWO_ROOT)
        .with_language(SiteLanguage::new(0, "/en/").with_core("core_en"))
        .with_configuration(configuration)
}

/// An indexer wired to in-memory backends.
pub struct TestEnv {
    pub store: Arc<InMemoryRecordStore>,
    pub search: Arc<InMemorySearchIndex>,
    pub queue: Arc<InMemoryIndexQueue>,
    pub indexer: Arc<Indexer>,
}

impl TestEnv {
    pub fn new(records: Vec<Record>, sites: Vec<SiteConfig>) -> Self {
        Self::with_extensions(records, sites, ExtensionRegistry::new())
    }

    pub fn with_extensions(
        records: Vec<Record>,
        sites: Vec<SiteConfig>,
        extensions: ExtensionRegistry,
    ) -> Self {
        let search = Arc::new(InMemorySearchIndex::new());
        Self::build(records, sites, extensions, search.clone(), search)
    }

    /// Index through `connection`; `search` stays empty.
    pub fn with_connection(
        records: Vec<Record>,
        sites: Vec<SiteConfig>,
        connection: Arc<dyn SearchConnection>,
    ) -> Self {
        Self::build(
            records,
            sites,
            ExtensionRegistry::new(),
            Arc::new(InMemorySearchIndex::new()),
            connection,
        )
    }

    fn build(
        records: Vec<Record>,
        sites: Vec<SiteConfig>,
        extensions: ExtensionRegistry,
        search: Arc<InMemorySearchIndex>,
        connection: Arc<dyn SearchConnection>,
    ) -> Self {
        let store = Arc::new(InMemoryRecordStore::from_records(pages().into_iter().chain(records)));
        let indexer = Arc::new(Indexer::new(
            store.clone(),
            Arc::new(StaticSiteProvider::new(sites)),
            Arc::new(SearchIndexService::new(connection)),
            Arc::new(schema()),
            Arc::new(extensions),
        ));

        Self {
            store,
            search,
            queue: Arc::new(InMemoryIndexQueue::new()),
            indexer,
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.queue.clone(), self.indexer.clone())
    }

    /// Enqueue a record for a site and index it right away.
    pub async fn add_to_queue_and_index_record(&self, table: &str, uid: RecordId, root: RecordId) -> bool {
        self.queue
            .update_item(table, uid, root, "")
            .await
            .expect("Failed to enqueue record");
        self.orchestrator()
            .index_record(table, uid)
            .await
            .expect("Failed to index record")
    }

    /// Enqueue a record for a site and index it directly with the indexer.
    pub async fn index(&self, table: &str, uid: RecordId, root: RecordId) -> IndexResult {
        let item = self
            .queue
            .update_item(table, uid, root, "")
            .await
            .expect("Failed to enqueue record");
        self.indexer.index(&item).await
    }

    pub fn documents(&self, core: &str) -> Vec<SearchDocument> {
        self.search.documents(core)
    }

    /// The only document of a core.
    pub fn single_document(&self, core: &str) -> SearchDocument {
        let documents = self.documents(core);
        assert_eq!(documents.len(), 1, "expected exactly one document in {}", core);
        documents.into_iter().next().expect("checked above")
    }
}

/// Text values of a document field.
pub fn texts(document: &SearchDocument, field: &str) -> Vec<String> {
    document
        .get(field)
        .map(|value| value.texts())
        .unwrap_or_default()
}

pub fn text(document: &SearchDocument, field: &str) -> Option<String> {
    document.get_text(field)
}

pub fn scalar_texts(values: &[Scalar]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
