//! Site provider trait definition.

use std::sync::Arc;

use async_trait::async_trait;
use record_indexer_shared::{RecordId, SiteConfig};

use crate::errors::StoreError;

/// Resolves site configuration.
#[async_trait]
pub trait SiteProvider: Send + Sync {
    /// The site whose root page is `root`, if any.
    async fn site_for_root(&self, root: RecordId) -> Result<Option<Arc<SiteConfig>>, StoreError>;

    /// Every configured site.
    async fn sites(&self) -> Result<Vec<Arc<SiteConfig>>, StoreError>;
}
