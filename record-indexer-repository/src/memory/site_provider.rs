//! Site provider backed by a fixed list of sites.

use std::sync::Arc;

use async_trait::async_trait;
use record_indexer_shared::{RecordId, SiteConfig};

use crate::errors::StoreError;
use crate::interfaces::SiteProvider;

/// Serves the sites it was created with.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteProvider {
    sites: Vec<Arc<SiteConfig>>,
}

impl StaticSiteProvider {
    pub fn new(sites: impl IntoIterator<Item = SiteConfig>) -> Self {
        Self {
            sites: sites.into_iter().map(Arc::new).collect(),
        }
    }
}

#[async_trait]
impl SiteProvider for StaticSiteProvider {
    async fn site_for_root(&self, root: RecordId) -> Result<Option<Arc<SiteConfig>>, StoreError> {
        Ok(self
            .sites
            .iter()
            .find(|site| site.root_page_id == root)
            .cloned())
    }

    async fn sites(&self) -> Result<Vec<Arc<SiteConfig>>, StoreError> {
        Ok(self.sites.clone())
    }
}
