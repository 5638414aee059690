use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::app::error::{BrowseError, Result};
use crate::cache::CategoryCache;
use crate::config::Config;
use crate::content::{ApiClient, ContentSource, DynamoContentService};
use crate::domain::FeedItem;
use crate::dynamo::QueryBuilder;
use crate::feed::BrowseFeed;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::retry::RetryingTransport;
use crate::fetcher::HttpTransport;
use crate::preload::PreloadPipeline;
use crate::renderer::RendererFactory;
use crate::selector::{ContentSelector, RecentlyShown};
use crate::signer::RequestSigner;
use crate::store::{MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore};

/// Wires the pipeline together, leaf components first.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn PreferenceStore>,
    pub service: Arc<DynamoContentService>,
    pub api: ApiClient,
    pub cache: Arc<CategoryCache<FeedItem>>,
    pub feed: Arc<BrowseFeed>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store: Arc<dyn PreferenceStore> = Arc::new(SqlitePreferenceStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    /// Preferences are kept in memory only.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryPreferenceStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn PreferenceStore>) -> Result<Self> {
        let transport: Arc<dyn HttpTransport + Send + Sync> =
            Arc::new(HttpFetcher::with_timeout(config.store.request_timeout()));
        Self::with_transport(config, store, transport)
    }

    pub fn with_transport(
        config: Config,
        store: Arc<dyn PreferenceStore>,
        transport: Arc<dyn HttpTransport + Send + Sync>,
    ) -> Result<Self> {
        let signer = Arc::new(RequestSigner::new(
            config.store.credentials(),
            config.store.region.clone(),
            config.store.service.clone(),
        ));
        let builder = QueryBuilder::new(config.store.table.clone());
        let endpoint = Url::parse(&config.store.endpoint)?;
        let retrying = RetryingTransport::new(
            transport,
            signer,
            endpoint,
            config.store.target_prefix.clone(),
            config.store.retry_policy(),
        );
        let service = Arc::new(DynamoContentService::new(retrying, builder));

        let api_transport: Arc<dyn HttpTransport + Send + Sync> =
            Arc::new(HttpFetcher::with_timeout(config.api.timeout()));
        let api = ApiClient::new(api_transport, Url::parse(&config.api.base_url)?);

        let cache = Arc::new(CategoryCache::new(config.cache.ttl()));
        let selector = ContentSelector::new(RecentlyShown::new(
            config.feed.history_limit,
            config.feed.history_retain,
        ));
        let source: Arc<dyn ContentSource> = service.clone();
        let feed = Arc::new(
            BrowseFeed::new(source, cache.clone(), selector, store.clone())
                .with_batch_limit(config.feed.batch_limit)
                .with_default_url(config.feed.default_url.clone()),
        );

        Ok(Self {
            config,
            store,
            service,
            api,
            cache,
            feed,
        })
    }

    /// A preload pipeline fed by this context's discovery feed.
    pub fn preload_pipeline(&self, factory: Arc<dyn RendererFactory>) -> PreloadPipeline {
        PreloadPipeline::new(
            self.feed.clone(),
            factory,
            self.config.preload.to_preload_config(),
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| BrowseError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("browse-forward");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("browse-forward.db"))
    }
}
