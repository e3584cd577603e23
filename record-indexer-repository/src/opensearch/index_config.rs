//! OpenSearch index naming.
//!
//! Every connection core maps to one OpenSearch index; an optional prefix
//! separates deployments sharing a cluster.

/// Configuration for mapping cores onto indices.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Prefix prepended to every core name (e.g. `"staging_"`).
    pub prefix: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The index name of a core.
    ///
    /// OpenSearch index names must be lowercase.
    pub fn index_name(&self, core: &str) -> String {
        format!("{}{}", self.prefix, core).to_lowercase()
    }
}
