//! # browse-forward
//!
//! An endless, randomized stream of curated web pages.
//!
//! ## Architecture
//!
//! Content flows from a signed document store through a per-category cache
//! into a random selector, and the chosen URLs are loaded ahead of time in a
//! hidden browser page:
//!
//! ```text
//! Signer → Transport (retry + dedup) → Content service → Cache → Selector → Feed → Preload
//! ```
//!
//! - [`signer`]: SigV4 request signing
//! - [`fetcher`]: HTTP transport with retries and in-flight deduplication
//! - [`content`]: Document store queries and the REST content API
//! - [`preload`]: Single-slot predictive preloading
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick a few categories
//! browse-forward prefs add science
//! browse-forward prefs add technology --subcategory ai
//!
//! # Draw pages from the feed
//! browse-forward next -n 5 --open
//!
//! # Preload the next pages in a headless browser
//! browse-forward preload -n 3
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// preference store, content service, cache, feed.
pub mod app;

/// Per-category cache of content pools with a TTL.
pub mod cache;

/// Command-line interface using clap.
///
/// - `fetch` / `feed` - Query the document store
/// - `categories` / `subcategories` - Discover what is available
/// - `next` - Draw pages from the discovery feed
/// - `preload` - Drive the preload pipeline
/// - `prefs` - Manage category preferences
/// - `api` - Query the REST content API
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/browse-forward/config.toml`, with one section per
/// component: store, api, cache, feed, preload, renderer.
pub mod config;

/// Content access.
///
/// - [`DynamoContentService`](content::DynamoContentService): typed queries against the document store
/// - [`ApiClient`](content::ApiClient): the REST content API
/// - [`ContentSource`](content::ContentSource): what the feed draws pools from
pub mod content;

/// Core domain models.
///
/// - [`ContentItem`](domain::ContentItem): A full content record
/// - [`FeedItem`](domain::FeedItem): The lightweight projection used by the feed
/// - [`BrowsePreferences`](domain::BrowsePreferences): Selected categories
pub mod domain;

/// Document store wire format: typed attribute values and query expressions.
pub mod dynamo;

/// The discovery feed that turns preferences into the next URL to show.
pub mod feed;

/// HTTP transport.
///
/// - [`HttpTransport`](fetcher::HttpTransport): Async trait for raw requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`RetryingTransport`](fetcher::retry::RetryingTransport): Signing, retries and request coalescing
pub mod fetcher;

/// Background page preloading.
pub mod preload;

/// Hidden page renderers.
///
/// Uses headless Chrome via chromiumoxide.
pub mod renderer;

/// Random selection that avoids recently shown pages.
pub mod selector;

/// AWS Signature Version 4.
pub mod signer;

/// Preference persistence.
///
/// - [`PreferenceStore`](store::PreferenceStore): Key-value trait
/// - [`SqlitePreferenceStore`](store::SqlitePreferenceStore): SQLite implementation
pub mod store;
