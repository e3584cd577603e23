//! Integration tests for indexing single items against in-memory backends.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use record_indexer::errors::ExtensionError;
use record_indexer::extensions::{AdditionalDocumentsProvider, DocumentModifier, ExtensionRegistry};
use record_indexer::indexer::LanguageOutcome;
use record_indexer::routing::ConnectionRouter;
use record_indexer_repository::{
    IndexQueue, InMemoryRecordStore, InMemorySearchIndex, SearchConnection, SearchIndexError,
    StaticSiteProvider,
};
use record_indexer_shared::{
    fields, ConnectionHandle, DocumentIdentity, FieldMapping, FieldRule, IndexingConfiguration,
    Item, LanguageId, PageFieldOverride, Predicate, Record, RelationRule, RootlineRule,
    SearchDocument, SiteConfig, SiteLanguage, WhereTarget,
};

fn tags_configuration() -> IndexingConfiguration {
    bar_configuration(vec![
        title(),
        relation("category_stringM", RelationRule::new("tags")),
    ])
}

fn tagged_news() -> Vec<Record> {
    vec![
        bar(88, 2, "testnews"),
        tag(1, "the tag"),
        junction(BAR_TAG_MM, 1, 88, 1, 1),
    ]
}

#[tokio::test]
async fn test_can_index_item_with_mm_relation() {
    let env = TestEnv::new(tagged_news(), vec![site_one(tags_configuration())]);

    let indexed = env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await;

    assert!(indexed, "Indexing was not indicated to be successful");
    let document = env.single_document("core_en");
    assert_eq!(text(&document, "title").as_deref(), Some("testnews"));
    assert_eq!(texts(&document, "category_stringM"), vec!["the tag"]);
    assert_eq!(text(&document, fields::SITE).as_deref(), Some("testone.site"));
    assert_eq!(
        text(&document, fields::UNIQUE_KEY).as_deref(),
        Some("integration_tree_one/tx_bar/88/0")
    );
    // No German translation and no fallback.
    assert_eq!(env.search.num_found("core_de"), 0);
}

#[tokio::test]
async fn test_mm_relation_without_junction_rows_leaves_field_out() {
    let env = TestEnv::new(
        vec![bar(88, 2, "testnews"), tag(1, "the tag")],
        vec![site_one(tags_configuration())],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(text(&document, "title").as_deref(), Some("testnews"));
    assert!(!document.contains("category_stringM"));
}

#[tokio::test]
async fn test_mm_relation_keeps_junction_order() {
    let env = TestEnv::new(
        vec![
            bar(88, 2, "testnews"),
            tag(1, "the tag"),
            tag(2, "another tag"),
            // Stored out of order on purpose.
            junction(BAR_TAG_MM, 2, 88, 2, 2),
            junction(BAR_TAG_MM, 1, 88, 1, 1),
        ],
        vec![site_one(tags_configuration())],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(
        texts(&document, "category_stringM"),
        vec!["the tag", "another tag"]
    );
}

#[tokio::test]
async fn test_can_index_translated_item_with_mm_relation() {
    let mut translated_tag = tag(2, "translated tag");
    translated_tag.set("sys_language_uid", 1i64);
    translated_tag.set("l18n_parent", 1u64);

    let mut records = tagged_news();
    records.push(bar_translation(99, 88, "translation"));
    records.push(translated_tag);
    let env = TestEnv::new(records, vec![site_one(tags_configuration())]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let english = env.single_document("core_en");
    assert_eq!(texts(&english, "category_stringM"), vec!["the tag"]);

    let german = env.single_document("core_de");
    assert_eq!(text(&german, "title").as_deref(), Some("translation"));
    assert_eq!(texts(&german, "category_stringM"), vec!["translated tag"]);
    assert_eq!(text(&german, fields::LANGUAGE_ID).as_deref(), Some("1"));
    assert_eq!(text(&german, fields::RECORD_ID).as_deref(), Some("88"));
}

#[tokio::test]
async fn test_can_index_multiple_mm_relations() {
    let configuration = bar_configuration(vec![
        title(),
        relation("tags_stringM", RelationRule::new("tags")),
        relation("relatedPageTitles_stringM", RelationRule::new("related_pages")),
    ]);
    let mut records = tagged_news();
    records.push(page(10, SITE_ONE_ROOT, "Related page"));
    records.push(junction(BAR_PAGES_MM, 1, 88, 10, 1));
    let env = TestEnv::new(records, vec![site_one(configuration)]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(texts(&document, "tags_stringM"), vec!["the tag"]);
    assert_eq!(texts(&document, "relatedPageTitles_stringM"), vec!["Related page"]);
}

#[tokio::test]
async fn test_can_index_item_with_mm_relation_and_additional_where() {
    let configuration = bar_configuration(vec![
        title(),
        relation(
            "category_stringM",
            RelationRule::new("tags")
                .filtered(WhereTarget::Foreign, Predicate::ne("tag", "the tag")),
        ),
    ]);
    let mut records = tagged_news();
    records.push(tag(2, "another tag"));
    records.push(junction(BAR_TAG_MM, 2, 88, 2, 2));
    let env = TestEnv::new(records, vec![site_one(configuration)]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(texts(&document, "category_stringM"), vec!["another tag"]);
}

#[tokio::test]
async fn test_can_index_item_with_mm_relation_to_a_translated_page() {
    let configuration = bar_configuration(vec![
        title(),
        relation("relatedPageTitles_stringM", RelationRule::new("related_pages")),
    ]);
    let mut translated_page = page(11, SITE_ONE_ROOT, "Translated related page");
    translated_page.set("sys_language_uid", 1i64);
    translated_page.set("l10n_parent", 10u64);

    let env = TestEnv::new(
        vec![
            bar(88, 2, "testnews"),
            bar_translation(99, 88, "translation"),
            page(10, SITE_ONE_ROOT, "Related page"),
            translated_page,
            junction(BAR_PAGES_MM, 1, 88, 10, 1),
        ],
        vec![site_one(configuration)],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let english = env.single_document("core_en");
    assert_eq!(texts(&english, "relatedPageTitles_stringM"), vec!["Related page"]);
    let german = env.single_document("core_de");
    assert_eq!(
        texts(&german, "relatedPageTitles_stringM"),
        vec!["Translated related page"]
    );
}

fn category_records(category: &str) -> Vec<Record> {
    vec![
        bar(88, 2, "testnews").with_field("category", category),
        Record::new(CATEGORY, 1)
            .with_field("pid", 2u64)
            .with_field("title", "the category")
            .with_field("category", 1u64),
        Record::new(CATEGORY, 2)
            .with_field("pid", 2u64)
            .with_field("title", "another category")
            .with_field("category", 2u64),
        Record::new(SYS_CATEGORY, 1)
            .with_field("pid", 2u64)
            .with_field("title", "sys_category")
            .with_field("description", "sys_category description"),
        Record::new(SYS_CATEGORY, 2)
            .with_field("pid", 2u64)
            .with_field("title", "sys_category 2")
            .with_field("description", "second description"),
    ]
}

fn direct_configuration() -> IndexingConfiguration {
    bar_configuration(vec![
        title(),
        relation("category_stringM", RelationRule::new("category")),
        relation("sysCategoryId_stringM", RelationRule::new("category").label("category")),
        relation(
            "sysCategory_stringM",
            RelationRule::new("category").label("category").recursive(),
        ),
        relation(
            "sysCategoryDescription_stringM",
            RelationRule::new("category")
                .label("category.description")
                .recursive(),
        ),
    ])
}

#[tokio::test]
async fn test_can_index_item_with_direct_relation() {
    let env = TestEnv::new(category_records("1"), vec![site_one(direct_configuration())]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(texts(&document, "category_stringM"), vec!["the category"]);
    assert_eq!(texts(&document, "sysCategoryId_stringM"), vec!["1"]);
    assert_eq!(texts(&document, "sysCategory_stringM"), vec!["sys_category"]);
    assert_eq!(
        texts(&document, "sysCategoryDescription_stringM"),
        vec!["sys_category description"]
    );
}

#[tokio::test]
async fn test_can_index_item_with_multiple_direct_relations() {
    let env = TestEnv::new(category_records("1,2"), vec![site_one(direct_configuration())]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(
        texts(&document, "category_stringM"),
        vec!["the category", "another category"]
    );
    assert_eq!(texts(&document, "sysCategoryId_stringM"), vec!["1", "2"]);
    assert_eq!(
        texts(&document, "sysCategory_stringM"),
        vec!["sys_category", "sys_category 2"]
    );
}

#[tokio::test]
async fn test_can_index_item_with_direct_relation_and_additional_where() {
    let configuration = bar_configuration(vec![
        title(),
        relation(
            "category_stringM",
            RelationRule::new("category")
                .filtered(WhereTarget::Foreign, Predicate::ne("title", "the category")),
        ),
    ]);
    let env = TestEnv::new(category_records("1,2"), vec![site_one(configuration)]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(texts(&document, "category_stringM"), vec!["another category"]);
}

#[tokio::test]
async fn test_page_override_adds_field_from_rootline() {
    let mut site = site_one(bar_configuration(vec![title()]));
    site.page_overrides.push(PageFieldOverride {
        page_uid: SITE_ONE_ROOT,
        configuration: "bar".to_string(),
        fields: vec![FieldMapping::new(
            "fieldFromRootLine_stringS",
            FieldRule::Static {
                value: "TESTNEWS".into(),
            },
        )],
    });
    let env = TestEnv::new(vec![bar(88, 2, "testnews")], vec![site]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(
        text(&document, "fieldFromRootLine_stringS").as_deref(),
        Some("TESTNEWS")
    );
}

#[tokio::test]
async fn test_can_index_record_outside_site_root() {
    let env = TestEnv::new(
        vec![bar(88, 50, "external testnews")],
        vec![site_one(bar_configuration(vec![title()]))],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(text(&document, "title").as_deref(), Some("external testnews"));
    assert_eq!(text(&document, fields::SITE).as_deref(), Some("testone.site"));
}

#[tokio::test]
async fn test_record_outside_site_root_links_to_the_site() {
    let configuration = bar_configuration(vec![
        title(),
        FieldMapping::new(
            "url",
            FieldRule::Link {
                parameters: String::new(),
            },
        ),
    ]);
    let env = TestEnv::new(vec![bar(88, 50, "external testnews")], vec![site_one(configuration)]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(text(&document, "url").as_deref(), Some("http://testone.site/en/"));
}

#[tokio::test]
async fn test_can_index_translated_custom_record() {
    let configuration = bar_configuration(vec![title(), link()]);
    let env = TestEnv::new(
        vec![
            bar(88, 2, "original"),
            bar(777, 2, "original2"),
            bar_translation(99, 88, "translation"),
            bar_translation(778, 777, "translation2"),
        ],
        vec![site_one(configuration)],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);
    assert!(env.add_to_queue_and_index_record(BAR, 777, SITE_ONE_ROOT).await);

    let english = env.documents("core_en");
    assert_eq!(english.len(), 2);
    assert_eq!(text(&english[0], "title").as_deref(), Some("original"));
    assert_eq!(
        text(&english[0], "url").as_deref(),
        Some("http://testone.site/en/?tx_foo%5Buid%5D=88")
    );
    assert_eq!(text(&english[1], "title").as_deref(), Some("original2"));
    assert_eq!(
        text(&english[1], "url").as_deref(),
        Some("http://testone.site/en/?tx_foo%5Buid%5D=777")
    );

    let german = env.documents("core_de");
    assert_eq!(german.len(), 2);
    assert_eq!(text(&german[0], "title").as_deref(), Some("translation"));
    assert_eq!(
        text(&german[0], "url").as_deref(),
        Some("http://testone.site/de/?tx_foo%5Buid%5D=88")
    );
    assert_eq!(text(&german[1], "title").as_deref(), Some("translation2"));
    assert_eq!(
        text(&german[1], "url").as_deref(),
        Some("http://testone.site/de/?tx_foo%5Buid%5D=777")
    );
}

#[tokio::test]
async fn test_fallback_language_indexes_default_record() {
    let env = TestEnv::new(
        vec![bar(88, 2, "original")],
        vec![site_one_with_fallback(bar_configuration(vec![title()]))],
    );

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(result.is_success());
    assert_eq!(result.submitted_documents(), 2);
    let mut german = env.single_document("core_de");
    assert_eq!(text(&german, "title").as_deref(), Some("original"));
    assert_eq!(
        text(&german, fields::UNIQUE_KEY).as_deref(),
        Some("integration_tree_one/tx_bar/88/1")
    );

    // Apart from its language identity the fallback document is the default one.
    let mut english = env.single_document("core_en");
    for document in [&mut english, &mut german] {
        document.remove(fields::UNIQUE_KEY);
        document.remove(fields::LANGUAGE_ID);
    }
    assert_eq!(english, german);
}

#[tokio::test]
async fn test_strict_language_skips_untranslated_record() {
    let env = TestEnv::new(
        vec![bar(88, 2, "original")],
        vec![site_one(bar_configuration(vec![title()]))],
    );

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(result.is_success());
    assert!(matches!(
        result.languages.get(&1),
        Some(LanguageOutcome::Skipped { .. })
    ));
    assert_eq!(env.search.num_found("core_de"), 0);
}

#[tokio::test]
async fn test_record_in_default_language_hidden_by_root_page() {
    let mut root = page(SITE_ONE_ROOT, 0, "Site one");
    root.set("l18n_cfg", 1i64);
    let env = TestEnv::new(
        vec![root, bar(88, 2, "original"), bar_translation(99, 88, "translation")],
        vec![site_one(bar_configuration(vec![title()]))],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    assert_eq!(env.search.num_found("core_en"), 0);
    let german = env.single_document("core_de");
    assert_eq!(text(&german, "title").as_deref(), Some("translation"));
}

#[tokio::test]
async fn test_connections_without_hidden_default_language() {
    let site = SiteConfig::new("integration_tree_one", "testone.site", SITE_ONE_ROOT)
        .with_language(SiteLanguage::new(0, "/en/").with_core("core_en").hidden())
        .with_language(SiteLanguage::new(1, "/de/").with_core("core_de"));
    let router = ConnectionRouter::new(
        Arc::new(StaticSiteProvider::new(vec![site])),
        Arc::new(InMemoryRecordStore::from_records(pages())),
    );

    let connections = router
        .resolve_connections(&Item::new(1, BAR, 88, SITE_ONE_ROOT))
        .await
        .unwrap();

    assert!(!connections.contains_key(&0));
    assert_eq!(connections[&1].core, "core_de");
}

#[tokio::test]
async fn test_can_index_items_of_nested_sites() {
    let configuration = bar_configuration(vec![title()]);
    let env = TestEnv::new(
        vec![
            bar(88, 2, "site one news"),
            bar(89, 112, "site two news"),
            bar(90, 112, "another site two news"),
        ],
        vec![site_one(configuration.clone()), site_two(configuration)],
    );

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);
    assert!(env.add_to_queue_and_index_record(BAR, 89, SITE_TWO_ROOT).await);
    assert!(env.add_to_queue_and_index_record(BAR, 90, SITE_TWO_ROOT).await);

    let documents = env.documents("core_en");
    let sites: Vec<_> = documents
        .iter()
        .map(|d| text(d, fields::SITE).unwrap_or_default())
        .collect();
    assert_eq!(sites, vec!["testone.site", "testtwo.site", "testtwo.site"]);
}

#[tokio::test]
async fn test_reindexing_does_not_duplicate_documents() {
    let env = TestEnv::new(tagged_news(), vec![site_one(tags_configuration())]);

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);
    env.store.insert(bar(88, 2, "updated testnews"));
    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(text(&document, "title").as_deref(), Some("updated testnews"));
}

#[tokio::test]
async fn test_missing_site_fails_item() {
    let env = TestEnv::new(tagged_news(), vec![site_one(tags_configuration())]);

    let result = env.index(BAR, 88, 4711).await;

    assert!(!result.is_success());
    assert!(result.error.as_deref().unwrap_or_default().contains("4711"));
    assert_eq!(env.search.total(), 0);
}

#[tokio::test]
async fn test_missing_record_fails_item() {
    let env = TestEnv::new(Vec::new(), vec![site_one(tags_configuration())]);

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(!result.is_success());
    assert!(result.error_summary().unwrap_or_default().contains("not found"));
}

#[tokio::test]
async fn test_indexing_properties_are_copied_to_documents() {
    let env = TestEnv::new(tagged_news(), vec![site_one(tags_configuration())]);
    let item = Item::new(1, BAR, 88, SITE_ONE_ROOT).with_indexing_property("boost_stringS", "high");

    let result = env.indexer.index(&item).await;

    assert!(result.is_success());
    let document = env.single_document("core_en");
    assert_eq!(text(&document, "boost_stringS").as_deref(), Some("high"));
}

/// Adds a marker field.
struct Marker;

#[async_trait]
impl DocumentModifier for Marker {
    async fn modify(
        &self,
        _item: &Item,
        _language_id: LanguageId,
        document: &mut SearchDocument,
    ) -> Result<(), ExtensionError> {
        document.set_single("modified_boolS", true);
        Ok(())
    }
}

/// Emits a copy of the document for a virtual record.
struct Copies;

#[async_trait]
impl AdditionalDocumentsProvider for Copies {
    async fn process(
        &self,
        _item: &Item,
        language_id: LanguageId,
        document: &SearchDocument,
    ) -> Result<Vec<SearchDocument>, ExtensionError> {
        let mut copy = document.clone();
        copy.set_identity(&DocumentIdentity {
            table: BAR.to_string(),
            record_id: 100_000,
            language_id,
            site_id: "integration_tree_one".to_string(),
        });
        Ok(vec![copy])
    }
}

/// Registers nothing and returns nothing.
struct Nothing;

#[async_trait]
impl AdditionalDocumentsProvider for Nothing {
    async fn process(
        &self,
        _item: &Item,
        _language_id: LanguageId,
        _document: &SearchDocument,
    ) -> Result<Vec<SearchDocument>, ExtensionError> {
        Ok(Vec::new())
    }
}

/// Returns a copy keyed by a uniqueKey that disagrees with its identity.
struct Rekeyed;

#[async_trait]
impl AdditionalDocumentsProvider for Rekeyed {
    async fn process(
        &self,
        _item: &Item,
        _language_id: LanguageId,
        document: &SearchDocument,
    ) -> Result<Vec<SearchDocument>, ExtensionError> {
        let mut copy = document.clone();
        copy.set_single(fields::UNIQUE_KEY, "extra/1");
        Ok(vec![copy])
    }
}

fn registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register_provider("rekeyed", Arc::new(Rekeyed)).unwrap();
    registry.register_modifier("marker", Arc::new(Marker)).unwrap();
    registry.register_provider("copies", Arc::new(Copies)).unwrap();
    registry.register_provider("nothing", Arc::new(Nothing)).unwrap();
    registry
}

#[tokio::test]
async fn test_document_modifier_and_provider_run() {
    let mut configuration = tags_configuration();
    configuration.document_modifiers = vec!["marker".to_string()];
    configuration.additional_document_providers = vec!["copies".to_string()];
    let env = TestEnv::with_extensions(tagged_news(), vec![site_one(configuration)], registry());

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(result.is_success());
    let documents = env.documents("core_en");
    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|d| d.contains("modified_boolS")));
    let keys: HashSet<_> = documents.iter().filter_map(|d| d.unique_key()).collect();
    assert!(keys.contains("integration_tree_one/tx_bar/100000/0"));
}

#[tokio::test]
async fn test_provider_returning_nothing_keeps_document() {
    let mut configuration = tags_configuration();
    configuration.additional_document_providers = vec!["nothing".to_string()];
    let env = TestEnv::with_extensions(tagged_news(), vec![site_one(configuration)], registry());

    assert!(env.add_to_queue_and_index_record(BAR, 88, SITE_ONE_ROOT).await);

    let document = env.single_document("core_en");
    assert_eq!(texts(&document, "category_stringM"), vec!["the tag"]);
    assert!(!document.contains("modified_boolS"));
}

#[tokio::test]
async fn test_provider_registered_as_modifier_is_unexpected_type() {
    let mut configuration = tags_configuration();
    configuration.document_modifiers = vec!["copies".to_string()];
    let env = TestEnv::with_extensions(tagged_news(), vec![site_one(configuration)], registry());

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(!result.is_success());
    assert!(result.error_summary().unwrap_or_default().contains("Unexpected type"));
    assert_eq!(env.search.total(), 0);
}

#[tokio::test]
async fn test_unregistered_hook_is_invalid_argument() {
    let mut configuration = tags_configuration();
    configuration.additional_document_providers = vec!["missing".to_string()];
    let env = TestEnv::with_extensions(tagged_news(), vec![site_one(configuration)], registry());

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(!result.is_success());
    assert!(result.error_summary().unwrap_or_default().contains("Invalid argument"));
}

#[tokio::test]
async fn test_inconsistent_provider_document_is_attributed_to_provider() {
    let mut configuration = tags_configuration();
    configuration.additional_document_providers = vec!["rekeyed".to_string()];
    let env = TestEnv::with_extensions(tagged_news(), vec![site_one(configuration)], registry());

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(!result.is_success());
    let summary = result.error_summary().unwrap_or_default();
    assert!(summary.contains("Invalid document from extension 'rekeyed'"), "{}", summary);
    assert!(summary.contains("extra/1"), "{}", summary);
    assert!(!summary.contains("Submission error"), "{}", summary);
    assert_eq!(env.search.total(), 0);
}

fn serialized(env: &TestEnv) -> Vec<String> {
    ["core_en", "core_de"]
        .iter()
        .flat_map(|core| env.documents(core))
        .map(|document| serde_json::to_string(&document).unwrap())
        .collect()
}

#[tokio::test]
async fn test_same_input_serializes_to_identical_bytes() {
    let mut configuration = bar_configuration(vec![
        title(),
        relation("category_stringM", RelationRule::new("tags")),
        FieldMapping::new(
            "rootline_stringM",
            FieldRule::Rootline(RootlineRule {
                filter: None,
                value_field: Some("title".to_string()),
            }),
        ),
        link(),
    ]);
    configuration.document_modifiers = vec!["marker".to_string()];
    configuration.additional_document_providers = vec!["copies".to_string()];
    let records = || {
        vec![
            bar(88, 2, "testnews"),
            bar_translation(91, 88, "testnachricht"),
            tag(1, "the tag"),
            tag(2, "another tag"),
            junction(BAR_TAG_MM, 2, 88, 2, 2),
            junction(BAR_TAG_MM, 1, 88, 1, 1),
        ]
    };
    let first = TestEnv::with_extensions(records(), vec![site_one(configuration.clone())], registry());
    let second = TestEnv::with_extensions(records(), vec![site_one(configuration)], registry());
    let item = first
        .queue
        .update_item(BAR, 88, SITE_ONE_ROOT, "bar")
        .await
        .unwrap();

    assert!(first.indexer.index(&item).await.is_success());
    let expected = serialized(&first);
    first.search.clear();
    assert!(first.indexer.index(&item).await.is_success());
    assert!(second.indexer.index(&item).await.is_success());

    // Base and copy in both languages.
    assert_eq!(expected.len(), 4);
    assert_eq!(serialized(&first), expected);
    assert_eq!(serialized(&second), expected);
}

/// Rejects every document of one core and stores the rest.
struct FailingCore {
    core: String,
    inner: InMemorySearchIndex,
}

#[async_trait]
impl SearchConnection for FailingCore {
    async fn submit(
        &self,
        connection: &ConnectionHandle,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        if connection.core == self.core {
            return Err(SearchIndexError::connection("core unavailable"));
        }
        self.inner.submit(connection, document).await
    }
}

#[tokio::test]
async fn test_failed_language_does_not_stop_other_languages() {
    let connection = Arc::new(FailingCore {
        core: "core_de".to_string(),
        inner: InMemorySearchIndex::new(),
    });
    let mut records = tagged_news();
    records.push(bar_translation(99, 88, "translation"));
    let env = TestEnv::with_connection(records, vec![site_one(tags_configuration())], connection.clone());

    let result = env.index(BAR, 88, SITE_ONE_ROOT).await;

    assert!(!result.is_success());
    assert!(matches!(
        result.languages.get(&0),
        Some(LanguageOutcome::Submitted { documents: 1 })
    ));
    assert!(matches!(result.languages.get(&1), Some(LanguageOutcome::Failed { .. })));
    assert!(result.error_summary().unwrap_or_default().contains("language 1"));
    assert_eq!(connection.inner.num_found("core_en"), 1);
}
