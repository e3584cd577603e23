//! Document extension hooks.
//!
//! Indexing configurations name hooks by key. A key resolves to exactly one
//! registered extension, which is either a [`DocumentModifier`] or an
//! [`AdditionalDocumentsProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use record_indexer_shared::{IndexingConfiguration, Item, LanguageId, SearchDocument};
use tracing::debug;

use crate::errors::ExtensionError;

const MODIFIER: &str = "document modifier";
const PROVIDER: &str = "additional documents provider";

/// Rewrites a built document in place.
///
/// Identity fields must be left as they are.
#[async_trait]
pub trait DocumentModifier: Send + Sync {
    async fn modify(
        &self,
        item: &Item,
        language_id: LanguageId,
        document: &mut SearchDocument,
    ) -> Result<(), ExtensionError>;
}

/// Derives extra documents from a built document.
///
/// Every returned document must carry a `uniqueKey`.
#[async_trait]
pub trait AdditionalDocumentsProvider: Send + Sync {
    async fn process(
        &self,
        item: &Item,
        language_id: LanguageId,
        document: &SearchDocument,
    ) -> Result<Vec<SearchDocument>, ExtensionError>;
}

#[derive(Clone)]
enum Extension {
    Modifier(Arc<dyn DocumentModifier>),
    Provider(Arc<dyn AdditionalDocumentsProvider>),
}

impl Extension {
    fn kind(&self) -> &'static str {
        match self {
            Extension::Modifier(_) => MODIFIER,
            Extension::Provider(_) => PROVIDER,
        }
    }
}

/// Extensions by key.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Extension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_modifier(
        &mut self,
        key: impl Into<String>,
        modifier: Arc<dyn DocumentModifier>,
    ) -> Result<(), ExtensionError> {
        self.register(key.into(), Extension::Modifier(modifier))
    }

    pub fn register_provider(
        &mut self,
        key: impl Into<String>,
        provider: Arc<dyn AdditionalDocumentsProvider>,
    ) -> Result<(), ExtensionError> {
        self.register(key.into(), Extension::Provider(provider))
    }

    fn register(&mut self, key: String, extension: Extension) -> Result<(), ExtensionError> {
        if key.trim().is_empty() {
            return Err(ExtensionError::InvalidRegistration(
                "extension key must not be empty".to_string(),
            ));
        }
        if self.extensions.contains_key(&key) {
            return Err(ExtensionError::InvalidRegistration(format!(
                "extension key '{}' is already registered",
                key
            )));
        }

        debug!(key = %key, kind = extension.kind(), "Registered extension");
        self.extensions.insert(key, extension);
        Ok(())
    }

    /// The modifier registered under `key`.
    pub fn modifier(&self, key: &str) -> Result<Arc<dyn DocumentModifier>, ExtensionError> {
        match self.extensions.get(key) {
            Some(Extension::Modifier(modifier)) => Ok(modifier.clone()),
            Some(other) => Err(unexpected_type(key, MODIFIER, other)),
            None => Err(ExtensionError::NotFound(key.to_string())),
        }
    }

    /// The provider registered under `key`.
    pub fn provider(&self, key: &str) -> Result<Arc<dyn AdditionalDocumentsProvider>, ExtensionError> {
        match self.extensions.get(key) {
            Some(Extension::Provider(provider)) => Ok(provider.clone()),
            Some(other) => Err(unexpected_type(key, PROVIDER, other)),
            None => Err(ExtensionError::NotFound(key.to_string())),
        }
    }

    /// Check that every hook a configuration names resolves to the right kind.
    pub fn validate(&self, configuration: &IndexingConfiguration) -> Result<(), ExtensionError> {
        for key in &configuration.document_modifiers {
            self.modifier(key)?;
        }
        for key in &configuration.additional_document_providers {
            self.provider(key)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

fn unexpected_type(key: &str, expected: &'static str, actual: &Extension) -> ExtensionError {
    ExtensionError::UnexpectedType {
        key: key.to_string(),
        expected,
        actual: actual.kind(),
    }
}
