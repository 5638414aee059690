pub mod api;
pub mod service;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FeedItem, FeedTarget};

pub use api::ApiClient;
pub use service::DynamoContentService;

/// Where the discovery feed gets its candidate pools from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Active lightweight items for `target`. An empty pool is
    /// [`BrowseError::NoItemsFound`](crate::app::BrowseError::NoItemsFound).
    async fn feed_items(&self, target: &FeedTarget, limit: u32) -> Result<Vec<FeedItem>>;
}
