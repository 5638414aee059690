use serde::{Deserialize, Serialize};

/// A fully decoded page record from the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub url: String,
    pub id: String,
    pub title: String,
    pub domain: String,
    pub category: String,
    pub bf_category: Option<String>,
    pub bf_subcategory: Option<String>,
    pub source: String,
    pub upvotes: i64,
    pub interactions: i64,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub created_date: Option<String>,
    pub post_date: Option<String>,
    pub fetched_at: String,
    pub updated_at: String,
    pub text_content: Option<String>,
    pub ai_summary: Option<String>,
    pub reading_time_minutes: Option<i64>,
    pub word_count: Option<i64>,
    pub ai_topics: Option<Vec<String>>,
    pub content_type: Option<String>,
    pub quality_score: Option<i64>,
    pub ai_keywords: Option<Vec<String>>,
    pub related_categories: Option<Vec<String>>,
    pub comment_count: Option<i64>,
    pub like_count: Option<i64>,
    pub save_count: Option<i64>,
    pub is_active: bool,
}

impl ContentItem {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    pub fn is_high_quality(&self) -> bool {
        self.quality_score.unwrap_or(0) >= 7 || self.upvotes >= 100 || self.interactions >= 50
    }

    /// Narrow a full record down to the discovery-feed shape.
    pub fn to_feed_item(&self) -> FeedItem {
        FeedItem {
            url: self.url.clone(),
            title: self.title.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            domain: self.domain.clone(),
            category: self.category.clone(),
            bf_category: self.bf_category.clone(),
            is_active: self.is_active,
            word_count: self.word_count,
        }
    }
}

/// The eight-field record used by the high-volume discovery feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub domain: String,
    pub category: String,
    #[serde(default)]
    pub bf_category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub word_count: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl FeedItem {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_content_item(url: &str) -> ContentItem {
    ContentItem {
        url: url.to_string(),
        id: format!("id-{}", url),
        title: "Sample".into(),
        domain: "example.com".into(),
        category: "science".into(),
        bf_category: Some("Science".into()),
        bf_subcategory: None,
        source: "test".into(),
        upvotes: 0,
        interactions: 0,
        tags: Vec::new(),
        thumbnail_url: String::new(),
        created_date: None,
        post_date: None,
        fetched_at: "2025-01-01T00:00:00Z".into(),
        updated_at: "2025-01-01T00:00:00Z".into(),
        text_content: None,
        ai_summary: None,
        reading_time_minutes: None,
        word_count: None,
        ai_topics: None,
        content_type: None,
        quality_score: None,
        ai_keywords: None,
        related_categories: None,
        comment_count: None,
        like_count: None,
        save_count: None,
        is_active: true,
    }
}
