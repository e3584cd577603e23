//! Connection router.
//!
//! Maps an item to the search connections of its site, one per language the
//! item is published in.

use std::collections::BTreeMap;
use std::sync::Arc;

use record_indexer_repository::{RecordStore, SiteProvider};
use record_indexer_shared::{ConnectionHandle, Item, LanguageId, Record, SiteConfig, PAGES_TABLE};
use tracing::{debug, instrument};

use crate::errors::IndexerError;

/// Root page field holding language visibility flags.
pub const L18N_CFG_FIELD: &str = "l18n_cfg";

/// Bit of `l18n_cfg` hiding the default language.
pub const HIDE_DEFAULT_LANGUAGE: i64 = 1;

/// An item's site and the connections it is published to.
#[derive(Debug, Clone)]
pub struct Route {
    pub site: Arc<SiteConfig>,
    pub connections: BTreeMap<LanguageId, ConnectionHandle>,
}

pub struct ConnectionRouter {
    sites: Arc<dyn SiteProvider>,
    store: Arc<dyn RecordStore>,
}

impl ConnectionRouter {
    pub fn new(sites: Arc<dyn SiteProvider>, store: Arc<dyn RecordStore>) -> Self {
        Self { sites, store }
    }

    /// Connections of the item's site by language.
    pub async fn resolve_connections(
        &self,
        item: &Item,
    ) -> Result<BTreeMap<LanguageId, ConnectionHandle>, IndexerError> {
        Ok(self.route(item).await?.connections)
    }

    /// Site and connections of an item.
    ///
    /// No site for the item's root is an error; a language without a
    /// connection is simply left out.
    #[instrument(skip(self, item), fields(item = %item.label()))]
    pub async fn route(&self, item: &Item) -> Result<Route, IndexerError> {
        let site = self
            .sites
            .site_for_root(item.root)
            .await?
            .ok_or(IndexerError::SiteNotFound(item.root))?;
        let root_page = self.store.fetch_record(PAGES_TABLE, site.root_page_id).await?;

        let connections = connections_for_site(&site, root_page.as_ref());
        debug!(
            site = %site.identifier,
            languages = ?connections.keys().collect::<Vec<_>>(),
            "Resolved connections"
        );
        Ok(Route { site, connections })
    }
}

/// Connections of a site by language.
///
/// The default language is left out when the site marks it hidden or the
/// root page hides it through `l18n_cfg`; other languages must be enabled.
pub fn connections_for_site(
    site: &SiteConfig,
    root_page: Option<&Record>,
) -> BTreeMap<LanguageId, ConnectionHandle> {
    let root_hides_default = root_page
        .and_then(|page| page.get_i64(L18N_CFG_FIELD))
        .is_some_and(|flags| flags & HIDE_DEFAULT_LANGUAGE != 0);

    site.languages
        .iter()
        .filter(|language| {
            if language.id == 0 {
                !language.hidden && !root_hides_default
            } else {
                language.enabled
            }
        })
        .filter_map(|language| {
            site.connection_for_language(language.id)
                .map(|handle| (language.id, handle))
        })
        .collect()
}
