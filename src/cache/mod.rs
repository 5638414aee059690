//! Per-category item lists with a fixed time-to-live.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::app::Result;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
pub struct CacheEntry<T> {
    pub category: String,
    pub items: Arc<Vec<T>>,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

/// Entries are replaced whole under one lock, so readers only ever see a
/// complete list.
pub struct CategoryCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T> Default for CategoryCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T> CategoryCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, category: &str) -> Option<Arc<Vec<T>>> {
        let entries = self.entries();
        entries
            .get(category)
            .filter(|entry| entry.is_valid())
            .map(|entry| entry.items.clone())
    }

    pub fn put(&self, category: &str, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        let entry = CacheEntry {
            category: category.to_string(),
            items: items.clone(),
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        self.entries().insert(category.to_string(), entry);
        items
    }

    pub fn invalidate(&self, category: &str) -> bool {
        let removed = self.entries().remove(category).is_some();
        if removed {
            debug!("Invalidated cache for {}", category);
        }
        removed
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        let swept = before - entries.len();
        if swept > 0 {
            debug!("Swept {} expired cache entries", swept);
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached items for `category`, or the result of `fetch` stored under it.
    ///
    /// Concurrent misses may both fetch; the last one to finish wins.
    pub async fn get_or_fetch<F, Fut>(&self, category: &str, fetch: F) -> Result<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if let Some(items) = self.get(category) {
            debug!("Cache hit for {} ({} items)", category, items.len());
            return Ok(items);
        }

        debug!("Cache miss for {}", category);
        let items = fetch().await?;
        let items = self.put(category, items);
        self.sweep_expired();
        Ok(items)
    }
}
