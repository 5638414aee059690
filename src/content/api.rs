//! Client for the `/browse-content` REST API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::app::{BrowseError, Result};
use crate::content::ContentSource;
use crate::domain::{FeedItem, FeedTarget};
use crate::fetcher::HttpTransport;

const ENDPOINT_PATH: &str = "browse-content";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItems {
    #[serde(default)]
    pub items: Vec<FeedItem>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub scanned_count: Option<u64>,
    #[serde(default)]
    pub last_evaluated_key: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubcategoriesResponse {
    subcategories: Vec<String>,
}

pub struct ApiClient {
    transport: Arc<dyn HttpTransport + Send + Sync>,
    base_url: Url,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport + Send + Sync>, mut base_url: Url) -> Self {
        // `join` replaces the last segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            transport,
            base_url,
        }
    }

    fn endpoint(&self, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(ENDPOINT_PATH)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.transport.get(url.as_str()).await?;
        if response.status != 200 {
            return Err(BrowseError::Network(format!(
                "HTTP {}: {}",
                response.status,
                response.body_text()
            )));
        }
        if response.body.is_empty() {
            return Err(BrowseError::InvalidResponse);
        }
        serde_json::from_slice(&response.body).map_err(|e| BrowseError::Parse(e.to_string()))
    }

    pub async fn feed_items(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        active_only: bool,
        limit: u32,
    ) -> Result<ApiItems> {
        let limit = limit.to_string();
        let mut params = vec![
            ("isActiveOnly", if active_only { "true" } else { "false" }),
            ("limit", limit.as_str()),
        ];
        if let Some(category) = category {
            params.push(("category", category));
        }
        if let Some(subcategory) = subcategory {
            params.push(("subcategory", subcategory));
        }

        self.get_json(self.endpoint(&params)?).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let response: CategoriesResponse = self
            .get_json(self.endpoint(&[("endpoint", "categories")])?)
            .await?;
        Ok(response.categories)
    }

    pub async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        let response: SubcategoriesResponse = self
            .get_json(self.endpoint(&[("endpoint", "subcategories"), ("category", category)])?)
            .await?;
        Ok(response.subcategories)
    }

    pub async fn by_source(&self, source: &str, limit: u32) -> Result<Vec<FeedItem>> {
        let limit = limit.to_string();
        let response: ApiItems = self
            .get_json(self.endpoint(&[("source", source), ("limit", limit.as_str())])?)
            .await?;
        Ok(response.items)
    }

    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<FeedItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.to_string();
        let response: ApiItems = self
            .get_json(self.endpoint(&[
                ("endpoint", "search"),
                ("q", query),
                ("limit", limit.as_str()),
            ])?)
            .await?;
        Ok(response.items)
    }
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn feed_items(&self, target: &FeedTarget, limit: u32) -> Result<Vec<FeedItem>> {
        let response = ApiClient::feed_items(
            self,
            target.category.as_deref(),
            target.subcategory.as_deref(),
            true,
            limit,
        )
        .await?;
        if response.items.is_empty() {
            return Err(BrowseError::NoItemsFound);
        }
        Ok(response.items)
    }
}
