//! Indexer settings file.
//!
//! The settings file is a JSON document holding the table schema and the
//! site configurations.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use record_indexer_shared::{FieldRule, IndexingConfiguration, Schema, SiteConfig, TableSchema};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extensions::ExtensionRegistry;
use crate::IndexingError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerSettings {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl IndexerSettings {
    /// Read settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexingError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            IndexingError::config(format!("Failed to read settings '{}': {}", path.display(), e))
        })?;
        let settings = Self::from_json(&json)?;

        info!(
            path = %path.display(),
            tables = settings.tables.len(),
            sites = settings.sites.len(),
            "Loaded indexer settings"
        );
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, IndexingError> {
        serde_json::from_str(json)
            .map_err(|e| IndexingError::config(format!("Invalid settings: {}", e)))
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.tables.iter().cloned())
    }

    /// Check the settings for errors that would otherwise surface only while
    /// indexing: unknown tables and relation columns, unresolvable hooks,
    /// duplicate sites and overrides pointing at missing configurations.
    pub fn validate(&self, registry: &ExtensionRegistry) -> Result<(), IndexingError> {
        let schema = self.schema();
        let mut identifiers = HashSet::new();
        let mut roots = HashSet::new();

        for site in &self.sites {
            if !identifiers.insert(site.identifier.as_str()) {
                return Err(IndexingError::config(format!(
                    "Duplicate site identifier '{}'",
                    site.identifier
                )));
            }
            if !roots.insert(site.root_page_id) {
                return Err(IndexingError::config(format!(
                    "Duplicate site root page {}",
                    site.root_page_id
                )));
            }

            for configuration in &site.indexing_configurations {
                validate_configuration(&schema, configuration).map_err(|e| {
                    IndexingError::config(format!("Site '{}': {}", site.identifier, e))
                })?;
                registry.validate(configuration).map_err(|e| {
                    IndexingError::config(format!(
                        "Site '{}', configuration '{}': {}",
                        site.identifier, configuration.name, e
                    ))
                })?;
            }

            for page_override in &site.page_overrides {
                if !site
                    .indexing_configurations
                    .iter()
                    .any(|c| c.name == page_override.configuration)
                {
                    return Err(IndexingError::config(format!(
                        "Site '{}': page {} overrides unknown configuration '{}'",
                        site.identifier, page_override.page_uid, page_override.configuration
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_configuration(
    schema: &Schema,
    configuration: &IndexingConfiguration,
) -> Result<(), String> {
    if schema.table(&configuration.table).is_none() {
        return Err(format!(
            "configuration '{}' references unknown table '{}'",
            configuration.name, configuration.table
        ));
    }

    for mapping in &configuration.fields {
        if let FieldRule::Relation(rule) = &mapping.rule {
            let relation = schema
                .relation(&configuration.table, &rule.local_field)
                .ok_or_else(|| {
                    format!(
                        "field '{}': '{}' is not a relation of '{}'",
                        mapping.name, rule.local_field, configuration.table
                    )
                })?;
            if schema.table(&relation.foreign_table).is_none() {
                return Err(format!(
                    "field '{}': unknown relation target table '{}'",
                    mapping.name, relation.foreign_table
                ));
            }
        }
    }
    Ok(())
}
