//! OpenSearch connection implementation.
//!
//! This module provides the concrete implementation of `SearchConnection`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    BulkOperation, BulkParts, IndexParts, OpenSearch,
};
use record_indexer_shared::{ConnectionHandle, SearchDocument};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchConnection;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use crate::utils;

/// OpenSearch-backed search connection.
///
/// # Example
///
/// ```ignore
/// use record_indexer_repository::opensearch::{IndexConfig, OpenSearchConnection};
///
/// let connection = OpenSearchConnection::new("http://localhost:9200", IndexConfig::default()).await?;
/// connection.ping().await?;
/// connection.submit(&handle, &document).await?;
/// ```
pub struct OpenSearchConnection {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchConnection {
    /// Create a new OpenSearch connection for the specified URL.
    ///
    /// No request is sent; use `ping` to check reachability.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchConnection)` - A new connection instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index_prefix = %index_config.prefix,
            "Created OpenSearch connection"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Index that receives the documents of a connection.
    fn index_for(&self, connection: &ConnectionHandle) -> Result<String, SearchIndexError> {
        if connection.core.trim().is_empty() {
            return Err(SearchIndexError::core_not_found(format!(
                "empty core for site '{}' language {}",
                connection.site, connection.language_id
            )));
        }
        Ok(self.index_config.index_name(&connection.core))
    }
}

#[async_trait]
impl SearchConnection for OpenSearchConnection {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Index a document under its `uniqueKey`, replacing any previous version.
    async fn submit(
        &self,
        connection: &ConnectionHandle,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        let doc_id = utils::validate_document(document)?;
        let index = self.index_for(connection)?;

        let response = self
            .client
            .index(IndexParts::IndexId(&index, &doc_id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchIndexError::core_not_found(index));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %index, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Index a batch with one bulk request.
    ///
    /// Invalid documents are reported without being sent. Item failures in
    /// the bulk response are reported per document, in submission order.
    async fn submit_batch(
        &self,
        connection: &ConnectionHandle,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let index = self.index_for(connection)?;

        let mut outcomes: Vec<Option<BatchOperationResult>> = vec![None; documents.len()];
        let mut sent: Vec<(usize, String)> = Vec::new();
        let mut operations: Vec<BulkOperation<&SearchDocument>> = Vec::new();
        for (position, document) in documents.iter().enumerate() {
            match utils::validate_document(document) {
                Ok(doc_id) => {
                    operations.push(BulkOperation::index(document).id(doc_id.as_str()).into());
                    sent.push((position, doc_id));
                }
                Err(e) => {
                    outcomes[position] = Some(BatchOperationResult {
                        unique_key: document.unique_key().unwrap_or_default(),
                        success: false,
                        error: Some(e),
                    });
                }
            }
        }

        if !operations.is_empty() {
            let response = self
                .client
                .bulk(BulkParts::Index(&index))
                .body(operations)
                .send()
                .await
                .map_err(|e| SearchIndexError::index(e.to_string()))?;

            let status = response.status_code();
            if status.as_u16() == 404 {
                return Err(SearchIndexError::core_not_found(index));
            }
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %error_body, index = %index, "Bulk request failed");
                return Err(SearchIndexError::index(format!(
                    "Bulk request failed with status {}: {}",
                    status, error_body
                )));
            }

            let body: Value = response
                .json()
                .await
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            let item_errors = bulk_item_errors(&body, sent.len())?;

            for ((position, doc_id), item_error) in sent.into_iter().zip(item_errors) {
                if let Some(reason) = &item_error {
                    warn!(index = %index, doc_id = %doc_id, error = %reason, "Bulk item failed");
                }
                outcomes[position] = Some(BatchOperationResult {
                    unique_key: doc_id,
                    success: item_error.is_none(),
                    error: item_error.map(SearchIndexError::index),
                });
            }
        }

        let mut summary = BatchOperationSummary::default();
        for outcome in outcomes.into_iter().flatten() {
            summary.push(outcome);
        }
        debug!(
            index = %index,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}

/// Error of every item of a bulk response, in request order.
///
/// An item fails when it carries an `error` object or a non-2xx status.
fn bulk_item_errors(body: &Value, expected: usize) -> Result<Vec<Option<String>>, SearchIndexError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::serialization("Bulk response has no items"))?;
    if items.len() != expected {
        return Err(SearchIndexError::serialization(format!(
            "Bulk response has {} items, expected {}",
            items.len(),
            expected
        )));
    }

    let any_errors = body.get("errors").and_then(Value::as_bool).unwrap_or(true);
    Ok(items
        .iter()
        .map(|item| {
            if !any_errors {
                return None;
            }
            let result = item.get("index").unwrap_or(item);
            let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
            match result.get("error") {
                Some(error) => Some(describe_item_error(error)),
                None if !(200..300).contains(&status) => {
                    Some(format!("item failed with status {}", status))
                }
                None => None,
            }
        })
        .collect())
}

fn describe_item_error(error: &Value) -> String {
    let kind = error.get("type").and_then(Value::as_str);
    let reason = error.get("reason").and_then(Value::as_str);
    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
        (Some(text), None) | (None, Some(text)) => text.to_string(),
        (None, None) => error.to_string(),
    }
}
