//! Utility functions for the record indexer repository.

use record_indexer_shared::{fields, DocumentIdentity, SearchDocument};

use crate::errors::SearchIndexError;

/// Check that a document carries every mandatory field and that its
/// `uniqueKey` agrees with the identity fields.
///
/// # Returns
///
/// * `Ok(String)` - The document's unique key
/// * `Err(SearchIndexError)` - If a mandatory field is missing or the key is inconsistent
///
/// # Example
///
/// ```
/// use record_indexer_repository::validate_document;
/// use record_indexer_shared::{DocumentIdentity, SearchDocument};
///
/// let mut document = SearchDocument::new();
/// document.set_identity(&DocumentIdentity {
///     table: "pages".to_string(),
///     record_id: 1,
///     language_id: 0,
///     site_id: "main".to_string(),
/// });
/// assert_eq!(validate_document(&document).unwrap(), "main/pages/1/0");
/// ```
pub fn validate_document(document: &SearchDocument) -> Result<String, SearchIndexError> {
    let missing = document.missing_mandatory_fields();
    if !missing.is_empty() {
        return Err(SearchIndexError::validation(format!(
            "Document is missing mandatory fields: {}",
            missing.join(", ")
        )));
    }

    let unique_key = document.unique_key().unwrap_or_default();
    let identity = identity_of(document)?;
    if identity.unique_key() != unique_key {
        return Err(SearchIndexError::validation(format!(
            "uniqueKey '{}' does not match identity '{}'",
            unique_key,
            identity.unique_key()
        )));
    }

    Ok(unique_key)
}

/// Read the identity fields back from a document.
pub fn identity_of(document: &SearchDocument) -> Result<DocumentIdentity, SearchIndexError> {
    let number = |name: &str| {
        document
            .get(name)
            .and_then(|v| v.values().first())
            .and_then(|s| s.as_u64())
            .ok_or_else(|| SearchIndexError::validation(format!("{} must be a number", name)))
    };

    let language_id = number(fields::LANGUAGE_ID)?;
    Ok(DocumentIdentity {
        table: document.get_text(fields::TABLE).unwrap_or_default(),
        record_id: number(fields::RECORD_ID)?,
        language_id: u32::try_from(language_id).map_err(|_| {
            SearchIndexError::validation(format!(
                "{} {} is out of range",
                fields::LANGUAGE_ID,
                language_id
            ))
        })?,
        site_id: document.get_text(fields::SITE_ID).unwrap_or_default(),
    })
}
