//! Site configuration.

use serde::{Deserialize, Serialize};

use super::document::LanguageId;
use super::mapping::{IndexingConfiguration, PageFieldOverride};
use super::record::RecordId;

/// What to do with a record that has no translation in a language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Omit the language.
    #[default]
    Strict,
    /// Try a translation in each chain language in order, then use the
    /// default-language record.
    Fallback {
        #[serde(default)]
        chain: Vec<LanguageId>,
    },
}

impl FallbackPolicy {
    pub fn allows_fallback(&self) -> bool {
        matches!(self, FallbackPolicy::Fallback { .. })
    }
}

/// Search core a site language publishes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub core: String,
}

/// One language of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLanguage {
    pub id: LanguageId,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Hide this language from publication. Only meaningful for the default language.
    #[serde(default)]
    pub hidden: bool,
    /// Path prefix of the language below the site base, e.g. `/en/`.
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionConfig>,
}

fn enabled_by_default() -> bool {
    true
}

impl SiteLanguage {
    pub fn new(id: LanguageId, base: impl Into<String>) -> Self {
        Self {
            id,
            enabled: true,
            hidden: false,
            base: base.into(),
            fallback: FallbackPolicy::Strict,
            connection: None,
        }
    }

    pub fn with_core(mut self, core: impl Into<String>) -> Self {
        self.connection = Some(ConnectionConfig { core: core.into() });
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A handle to one search core, scoped to a site and a language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionHandle {
    pub site: String,
    pub language_id: LanguageId,
    pub core: String,
}

/// Configuration of one site, rooted at one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub identifier: String,
    /// Host name written into the `site` document field.
    pub domain: String,
    /// Absolute base URL, e.g. `http://testone.site/`.
    pub base: String,
    pub root_page_id: RecordId,
    #[serde(default)]
    pub languages: Vec<SiteLanguage>,
    #[serde(default)]
    pub indexing_configurations: Vec<IndexingConfiguration>,
    #[serde(default)]
    pub page_overrides: Vec<PageFieldOverride>,
}

impl SiteConfig {
    pub fn new(
        identifier: impl Into<String>,
        domain: impl Into<String>,
        root_page_id: RecordId,
    ) -> Self {
        let domain = domain.into();
        Self {
            identifier: identifier.into(),
            base: format!("http://{}/", domain),
            domain,
            root_page_id,
            languages: Vec::new(),
            indexing_configurations: Vec::new(),
            page_overrides: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: SiteLanguage) -> Self {
        self.languages.push(language);
        self
    }

    pub fn with_configuration(mut self, configuration: IndexingConfiguration) -> Self {
        self.indexing_configurations.push(configuration);
        self
    }

    pub fn language(&self, id: LanguageId) -> Option<&SiteLanguage> {
        self.languages.iter().find(|l| l.id == id)
    }

    pub fn language_ids(&self) -> Vec<LanguageId> {
        self.languages.iter().map(|l| l.id).collect()
    }

    /// Connection of a language, if one is configured.
    pub fn connection_for_language(&self, id: LanguageId) -> Option<ConnectionHandle> {
        let language = self.language(id)?;
        let connection = language.connection.as_ref()?;
        Some(ConnectionHandle {
            site: self.identifier.clone(),
            language_id: id,
            core: connection.core.clone(),
        })
    }

    /// The configuration named `name`, or the first configuration for `table`
    /// when `name` is empty.
    pub fn indexing_configuration(&self, name: &str, table: &str) -> Option<&IndexingConfiguration> {
        if name.is_empty() {
            self.indexing_configurations.iter().find(|c| c.table == table)
        } else {
            self.indexing_configurations.iter().find(|c| c.name == name)
        }
    }
}
