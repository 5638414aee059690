use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::{BrowseError, Result};
use crate::content::ContentSource;
use crate::domain::{ContentItem, ContentQuery, FeedItem, FeedTarget, Page, SortHint};
use crate::dynamo::{decode_page, FromAttributes, Operation, QueryBuilder};
use crate::fetcher::retry::RetryingTransport;

/// Scan size used when discovering the category taxonomy.
const DISCOVERY_LIMIT: u32 = 200;
const BF_CATEGORY_TAG: &str = "bf-category:";

/// Typed fetch operations over the document store.
pub struct DynamoContentService {
    transport: RetryingTransport,
    builder: QueryBuilder,
}

impl DynamoContentService {
    pub fn new(transport: RetryingTransport, builder: QueryBuilder) -> Self {
        Self { transport, builder }
    }

    async fn run<T: FromAttributes>(&self, query: &ContentQuery) -> Result<Page<T>> {
        let expression = self.builder.build(query);
        match expression.operation() {
            Operation::Query => debug!(
                "Querying {} via {}",
                expression.table_name,
                expression.index_name.as_deref().unwrap_or_default()
            ),
            Operation::Scan => debug!("Scanning {} (limit {})", expression.table_name, expression.limit),
        }

        let body = self.transport.execute(&expression).await?;
        decode_page(&body)
    }

    /// One page of full items, sorted by the query's hint. The cursor for
    /// the following page is in [`Page::next`].
    pub async fn fetch_page(&self, query: &ContentQuery) -> Result<Page<ContentItem>> {
        let mut page = self.run::<ContentItem>(query).await?;
        query.sort.apply(&mut page.items);
        Ok(page)
    }

    pub async fn fetch_with_query(&self, query: &ContentQuery) -> Result<Vec<ContentItem>> {
        let page = self.fetch_page(query).await?;
        if page.items.is_empty() {
            return Err(BrowseError::NoItemsFound);
        }
        info!("Fetched {} items", page.items.len());
        Ok(page.items)
    }

    pub async fn fetch_by_category(
        &self,
        category: &str,
        subcategory: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ContentItem>> {
        let mut query = ContentQuery::with_limit(limit).category(category);
        if let Some(subcategory) = subcategory {
            query = query.subcategory(subcategory);
        }
        self.fetch_with_query(&query).await
    }

    /// Lightweight items for the discovery feed.
    pub async fn fetch_feed_items(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        active_only: bool,
        limit: u32,
    ) -> Result<Vec<FeedItem>> {
        let mut query = ContentQuery::with_limit(limit).active_only(active_only);
        if let Some(category) = category {
            query = query.category(category);
        }
        if let Some(subcategory) = subcategory {
            query = query.subcategory(subcategory);
        }

        let page = self.run::<FeedItem>(&query).await?;
        if page.items.is_empty() {
            return Err(BrowseError::NoItemsFound);
        }
        debug!("Fetched {} feed items", page.items.len());
        Ok(page.items)
    }

    pub async fn fetch_by_source(&self, source: &str, limit: u32) -> Result<Vec<ContentItem>> {
        self.fetch_with_query(&ContentQuery::with_limit(limit).source(source))
            .await
    }

    pub async fn fetch_popular(&self, limit: u32) -> Result<Vec<ContentItem>> {
        self.fetch_with_query(&ContentQuery::with_limit(limit).sort(SortHint::Popularity))
            .await
    }

    pub async fn fetch_recent(&self, limit: u32) -> Result<Vec<ContentItem>> {
        self.fetch_with_query(&ContentQuery::with_limit(limit).sort(SortHint::Recent))
            .await
    }

    /// Items carrying every one of `tags` (matched lower-cased).
    pub async fn fetch_by_tags(&self, tags: &[String], limit: u32) -> Result<Vec<ContentItem>> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.fetch_with_query(&ContentQuery::with_limit(limit).tags(tags))
            .await
    }

    /// Distinct categories among active content, sorted.
    pub async fn available_categories(&self) -> Result<Vec<String>> {
        let page = self
            .run::<ContentItem>(&ContentQuery::with_limit(DISCOVERY_LIMIT).active_only(true))
            .await?;

        let categories: BTreeSet<String> = page
            .items
            .into_iter()
            .filter_map(|item| item.bf_category)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        let page = self
            .run::<ContentItem>(&ContentQuery::with_limit(DISCOVERY_LIMIT).category(category))
            .await?;

        let subcategories: BTreeSet<String> = page
            .items
            .into_iter()
            .filter_map(|item| item.bf_subcategory)
            .filter(|s| !s.is_empty())
            .collect();
        Ok(subcategories.into_iter().collect())
    }

    /// Categories advertised through `bf-category:<name>` tags.
    pub async fn bf_category_tags(&self) -> Result<Vec<String>> {
        let page = self
            .run::<ContentItem>(&ContentQuery::with_limit(DISCOVERY_LIMIT).active_only(true))
            .await?;

        let categories: BTreeSet<String> = page
            .items
            .iter()
            .flat_map(|item| item.tags.iter())
            .filter_map(|tag| tag.strip_prefix(BF_CATEGORY_TAG))
            .filter(|name| !name.is_empty())
            .map(capitalize)
            .collect();
        Ok(categories.into_iter().collect())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl ContentSource for DynamoContentService {
    async fn feed_items(&self, target: &FeedTarget, limit: u32) -> Result<Vec<FeedItem>> {
        self.fetch_feed_items(
            target.category.as_deref(),
            target.subcategory.as_deref(),
            true,
            limit,
        )
        .await
    }
}
