use serde::{Deserialize, Serialize};

use crate::domain::ContentItem;

/// Ordering applied after decode; the store itself can only filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortHint {
    /// Upvotes, descending
    #[default]
    Popularity,
    /// `fetchedAt`, newest first
    Recent,
    /// Title, case-insensitive ascending
    Title,
}

impl SortHint {
    pub fn apply(self, items: &mut [ContentItem]) {
        match self {
            SortHint::Popularity => items.sort_by(|a, b| b.upvotes.cmp(&a.upvotes)),
            SortHint::Recent => items.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at)),
            SortHint::Title => {
                items.sort_by_key(|item| item.title.to_lowercase());
            }
        }
    }
}

impl std::str::FromStr for SortHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "popularity" | "popular" => Ok(SortHint::Popularity),
            "recent" => Ok(SortHint::Recent),
            "title" => Ok(SortHint::Title),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Opaque pagination cursor echoed back from the previous page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub serde_json::Value);

/// Semantic filter handed to the query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub active_only: Option<bool>,
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    pub limit: u32,
    pub sort: SortHint,
    pub cursor: Option<Cursor>,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            category: None,
            subcategory: None,
            active_only: None,
            source: None,
            tags: None,
            limit: 50,
            sort: SortHint::Popularity,
            cursor: None,
        }
    }
}

impl ContentQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = Some(active_only);
        self
    }

    pub fn sort(mut self, sort: SortHint) -> Self {
        self.sort = sort;
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// One decoded page plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: Option<u64>,
    pub scanned_count: Option<u64>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}
