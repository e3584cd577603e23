//! Dependency initialization and wiring for the record indexer.

use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::IndexerSettings;
use crate::extensions::ExtensionRegistry;
use crate::indexer::{Indexer, IndexerConfig};
use crate::loader::LoaderConfig;
use crate::localization::LocalizationResolver;
use crate::orchestrator::{enqueue_site, Orchestrator, OrchestratorConfig};
use crate::IndexingError;
use record_indexer_repository::opensearch::IndexConfig;
use record_indexer_repository::{
    InMemoryIndexQueue, InMemoryRecordStore, InMemorySearchIndex, IndexQueue,
    OpenSearchConnection, RecordStore, SearchConnection, SearchIndexService, StaticSiteProvider,
};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default number of items dequeued per batch.
const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of items indexed concurrently.
const DEFAULT_CONCURRENCY: usize = 8;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        Self::parse(&env::var("OPENSEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Where documents are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// Keep documents in memory; useful for dry runs.
    Memory,
    OpenSearch,
}

impl SearchBackend {
    fn from_env() -> Result<Self, IndexingError> {
        Self::parse(&env::var("SEARCH_BACKEND").unwrap_or_else(|_| "memory".to_string()))
    }

    fn parse(value: &str) -> Result<Self, IndexingError> {
        match value.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "opensearch" => Ok(Self::OpenSearch),
            other => Err(IndexingError::config(format!(
                "Invalid SEARCH_BACKEND '{}', expected 'memory' or 'opensearch'",
                other
            ))),
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables, without hooks.
    ///
    /// Settings that name a document modifier or provider fail validation;
    /// programs embedding the indexer register hooks through `with_extensions`.
    pub async fn new() -> Result<Self, IndexingError> {
        Self::with_extensions(ExtensionRegistry::new()).await
    }

    /// Initialize all dependencies from environment variables, with the hooks
    /// of `extensions` available to the indexing configurations.
    ///
    /// # Environment Variables
    ///
    /// - `INDEXER_CONFIG_PATH`: JSON settings file with tables and sites (required)
    /// - `RECORD_SNAPSHOT_PATH`: JSON array of records loaded into the record store
    /// - `SEARCH_BACKEND`: "memory" or "opensearch" (default: memory)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_INDEX_PREFIX`: Prefix of every index name (default: empty)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `INDEXER_BATCH_SIZE`: Items dequeued per batch (default: 100)
    /// - `INDEXER_CONCURRENCY`: Items indexed concurrently (default: 8)
    /// - `INDEXER_PARALLEL_SUBMISSIONS`: Submit the languages of an item concurrently (default: true)
    /// - `INDEXER_POLL_INTERVAL_SECS`: Keep polling the queue at this interval (default: drain once)
    /// - `INDEXER_FULL_REINDEX`: Enqueue every record of every site at startup (default: true)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn with_extensions(extensions: ExtensionRegistry) -> Result<Self, IndexingError> {
        let config_path = env::var("INDEXER_CONFIG_PATH")
            .map_err(|_| IndexingError::config("INDEXER_CONFIG_PATH is not set"))?;
        let snapshot_path = env::var("RECORD_SNAPSHOT_PATH").ok();
        let backend = SearchBackend::from_env()?;
        let batch_size = env_parse("INDEXER_BATCH_SIZE").unwrap_or(DEFAULT_BATCH_SIZE);
        let concurrency = env_parse("INDEXER_CONCURRENCY").unwrap_or(DEFAULT_CONCURRENCY);
        let parallel_submissions = env_parse("INDEXER_PARALLEL_SUBMISSIONS").unwrap_or(true);
        let poll_interval = env_parse::<u64>("INDEXER_POLL_INTERVAL_SECS").map(Duration::from_secs);
        let full_reindex = env_parse("INDEXER_FULL_REINDEX").unwrap_or(true);

        info!(
            config_path = %config_path,
            snapshot_path = ?snapshot_path,
            backend = ?backend,
            batch_size = batch_size,
            concurrency = concurrency,
            parallel_submissions = parallel_submissions,
            poll_interval_secs = ?poll_interval.map(|d| d.as_secs()),
            full_reindex = full_reindex,
            "Initializing dependencies"
        );

        let settings = IndexerSettings::load(&config_path)?;
        settings.validate(&extensions)?;
        let extensions = Arc::new(extensions);
        let schema = Arc::new(settings.schema());

        let store: Arc<dyn RecordStore> = Arc::new(match &snapshot_path {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|e| {
                    IndexingError::config(format!("Failed to read record snapshot '{}': {}", path, e))
                })?;
                InMemoryRecordStore::from_json(&json).map_err(|e| {
                    IndexingError::config(format!("Invalid record snapshot '{}': {}", path, e))
                })?
            }
            None => InMemoryRecordStore::new(),
        });

        let backend: Arc<dyn SearchConnection> = match backend {
            SearchBackend::Memory => Arc::new(InMemorySearchIndex::new()),
            SearchBackend::OpenSearch => Arc::new(Self::connect_from_env().await?),
        };
        let connection = Arc::new(SearchIndexService::new(backend));

        let queue = Arc::new(InMemoryIndexQueue::new());
        if full_reindex {
            let localization = LocalizationResolver::new(store.clone(), schema.clone());
            for site in &settings.sites {
                enqueue_site(queue.as_ref(), store.as_ref(), &schema, &localization, site)
                    .await?;
            }
            let pending = queue
                .pending_count()
                .await
                .map_err(|e| IndexingError::config(format!("Failed to read queue: {}", e)))?;
            info!(pending = pending, "Queue initialized");
        }

        let sites = Arc::new(StaticSiteProvider::new(settings.sites.clone()));
        let indexer = Arc::new(Indexer::with_config(
            store,
            sites,
            connection,
            schema,
            extensions,
            IndexerConfig {
                loader: LoaderConfig {
                    parallel_submissions,
                },
            },
        ));

        let orchestrator = Orchestrator::with_config(
            queue,
            indexer,
            OrchestratorConfig {
                batch_size,
                concurrency,
                poll_interval,
                ..OrchestratorConfig::default()
            },
        );

        Ok(Self { orchestrator })
    }

    async fn connect_from_env() -> Result<OpenSearchConnection, IndexingError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let index_prefix = env::var("OPENSEARCH_INDEX_PREFIX").unwrap_or_default();
        let connection_mode = ConnectionMode::from_env();
        let retry_interval =
            env_parse("OPENSEARCH_RETRY_INTERVAL_SECS").unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        info!(
            opensearch_url = %opensearch_url,
            index_prefix = %index_prefix,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Connecting to OpenSearch"
        );

        let connection = Self::connect_to_opensearch(
            &opensearch_url,
            IndexConfig::new(index_prefix),
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");
        Ok(connection)
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchConnection, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone()).await {
                Ok(connection) => return Ok(connection),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch and check that it answers.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchConnection, IndexingError> {
        let connection = OpenSearchConnection::new(url, index_config)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch connection: {}", e))
            })?;
        connection
            .ping()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch is not reachable: {}", e)))?;

        Ok(connection)
    }
}

/// Parse an environment variable, ignoring unset and unparsable values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}
