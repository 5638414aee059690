use std::time::Duration;

use serde::Deserialize;

use crate::feed::{DEFAULT_BATCH_LIMIT, DEFAULT_URL};
use crate::preload::PreloadConfig;
use crate::selector::{DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_RETAIN};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 * 60 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Discovery feed settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Items requested per category pool
    pub batch_limit: u32,
    /// Recently shown URLs remembered before trimming
    pub history_limit: usize,
    /// URLs kept after a trim
    pub history_retain: usize,
    /// Shown when no content can be fetched
    pub default_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history_retain: DEFAULT_HISTORY_RETAIN,
            default_url: DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadSection {
    pub timeout_secs: u64,
    pub max_queue: usize,
}

impl Default for PreloadSection {
    fn default() -> Self {
        let defaults = PreloadConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_queue: defaults.max_queue,
        }
    }
}

impl PreloadSection {
    pub fn to_preload_config(&self) -> PreloadConfig {
        PreloadConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_queue: self.max_queue,
        }
    }
}
