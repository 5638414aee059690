//! Configuration management for browse-forward.
//!
//! Configuration is read from `~/.config/browse-forward/config.toml`.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod feed;
pub mod store;

pub use feed::{CacheConfig, FeedConfig, PreloadSection};
pub use store::{ApiConfig, StoreConfig};

use crate::renderer::RendererConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub preload: PreloadSection,
    pub renderer: RendererConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating a commented default there
    /// if nothing exists yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/browse-forward/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("browse-forward").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# browse-forward configuration

[store]
# Document store endpoint and signing scope
endpoint = "https://dynamodb.us-east-1.amazonaws.com/"
region = "us-east-1"
service = "dynamodb"
table = "webpages"
target_prefix = "DynamoDB_20120810"

# Credentials. AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY take precedence.
# access_key_id = ""
# secret_access_key = ""

# Per-request timeout in seconds
request_timeout_secs = 30

# Attempts per request; retry n waits n * backoff_secs
max_attempts = 3
backoff_secs = 1

[api]
# REST content API
base_url = "https://vercel-backend-azure-three.vercel.app/api/"
timeout_secs = 60

[cache]
# How long a category pool stays fresh (seconds)
ttl_secs = 1800

[feed]
# Items fetched per category pool
batch_limit = 100

# Recently shown pages are not repeated; the history is trimmed to
# history_retain entries once it grows past history_limit
history_limit = 50
history_retain = 40

# Page shown when no content can be fetched
default_url = "https://en.wikipedia.org/wiki/Special:Random"

[preload]
# Give up on a background page load after this many seconds
timeout_secs = 30

# Look-ahead URLs queued ahead of the feed
max_queue = 3

[renderer]
# Run browser in headless mode (no visible window)
headless = true

# Viewport size
window_width = 375
window_height = 667

# Require a user gesture before media plays
block_media_autoplay = true
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
