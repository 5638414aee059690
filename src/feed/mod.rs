//! The discovery feed: preferences, cache, source and selector combined into
//! a stream of page URLs.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::app::{BrowseError, Result};
use crate::cache::CategoryCache;
use crate::content::ContentSource;
use crate::domain::{display_url, BrowsePreferences, FeedItem, FeedTarget, PREFERENCES_KEY};
use crate::selector::ContentSelector;
use crate::store::PreferenceStore;

pub const DEFAULT_URL: &str = "https://en.wikipedia.org/wiki/Special:Random";
pub const DEFAULT_BATCH_LIMIT: u32 = 100;

/// Supplies the next page to show.
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn next_url(&self) -> Result<String>;
}

pub struct BrowseFeed {
    source: Arc<dyn ContentSource>,
    cache: Arc<CategoryCache<FeedItem>>,
    selector: Mutex<ContentSelector>,
    store: Arc<dyn PreferenceStore>,
    rng: Mutex<StdRng>,
    batch_limit: u32,
    default_url: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BrowseFeed {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cache: Arc<CategoryCache<FeedItem>>,
        selector: ContentSelector,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            source,
            cache,
            selector: Mutex::new(selector),
            store,
            rng: Mutex::new(StdRng::from_entropy()),
            batch_limit: DEFAULT_BATCH_LIMIT,
            default_url: DEFAULT_URL.to_string(),
        }
    }

    pub fn with_batch_limit(mut self, limit: u32) -> Self {
        self.batch_limit = limit;
        self
    }

    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = url.into();
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        *lock(&self.rng) = StdRng::seed_from_u64(seed);
        self
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    /// Saved preferences; missing or unreadable data means default mode.
    pub fn preferences(&self) -> BrowsePreferences {
        match self.store.get_bytes(PREFERENCES_KEY) {
            Ok(Some(bytes)) => BrowsePreferences::from_bytes(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable preferences: {}", e);
                BrowsePreferences::default()
            }),
            Ok(None) => BrowsePreferences::default(),
            Err(e) => {
                warn!("Failed to load preferences: {}", e);
                BrowsePreferences::default()
            }
        }
    }

    pub fn save_preferences(&self, preferences: &BrowsePreferences) -> Result<()> {
        let bytes = preferences.to_bytes()?;
        self.store.set_bytes(PREFERENCES_KEY, &bytes)?;
        info!(
            "Saved preferences ({} categories)",
            preferences.selected_categories.len()
        );
        Ok(())
    }

    /// Drop the cached pool for `target` so the next draw refetches it.
    pub fn refresh(&self, target: &FeedTarget) -> bool {
        self.cache.invalidate(&target.cache_key())
    }

    /// Draw the next item for the current preferences. Unlike
    /// [`UrlSource::next_url`] this does not fall back.
    pub async fn next_item(&self) -> Result<FeedItem> {
        let target = {
            let preferences = self.preferences();
            let mut rng = lock(&self.rng);
            preferences.pick_target(&mut *rng)
        };
        self.next_item_for(&target).await
    }

    pub async fn next_item_for(&self, target: &FeedTarget) -> Result<FeedItem> {
        let limit = self.batch_limit;
        let pool = self
            .cache
            .get_or_fetch(&target.cache_key(), || self.source.feed_items(target, limit))
            .await?;

        let mut selector = lock(&self.selector);
        let item = selector.select_avoiding_recent(&pool)?;
        debug!(
            "Selected {} from {} ({} candidates)",
            display_url(&item.url),
            target.cache_key(),
            pool.len()
        );
        Ok(item.clone())
    }
}

#[async_trait]
impl UrlSource for BrowseFeed {
    async fn next_url(&self) -> Result<String> {
        match self.next_item().await {
            Ok(item) => Ok(item.url),
            Err(BrowseError::NoItemsFound | BrowseError::NoItemsAvailable) => {
                info!("No content available, using default page");
                Ok(self.default_url.clone())
            }
            Err(e) => {
                warn!("Content fetch failed, using default page: {}", e);
                Ok(self.default_url.clone())
            }
        }
    }
}
