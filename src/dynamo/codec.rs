//! Tagged-union attribute values and response decoding.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{BrowseError, Result};
use crate::domain::{ContentItem, Cursor, FeedItem, Page};
use crate::dynamo::query::QueryExpression;

/// One wire value. Exactly one tag is expected to be set, but decoding is
/// tolerant of anything the store sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(rename = "SS", default, skip_serializing_if = "Option::is_none")]
    pub ss: Option<Vec<String>>,
    #[serde(rename = "L", default, skip_serializing_if = "Option::is_none")]
    pub l: Option<Vec<AttributeValue>>,
    #[serde(rename = "M", default, skip_serializing_if = "Option::is_none")]
    pub m: Option<BTreeMap<String, AttributeValue>>,
    #[serde(rename = "NULL", default, skip_serializing_if = "Option::is_none")]
    pub null: Option<bool>,
    #[serde(rename = "BOOL", default, skip_serializing_if = "Option::is_none")]
    pub bool: Option<bool>,
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            s: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn number(value: i64) -> Self {
        Self {
            n: Some(value.to_string()),
            ..Default::default()
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            bool: Some(value),
            ..Default::default()
        }
    }

    pub fn list(values: Vec<AttributeValue>) -> Self {
        Self {
            l: Some(values),
            ..Default::default()
        }
    }

    pub fn string_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ss: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Normalize a multi-valued attribute stored either as `SS` or as an `L`
    /// of `{S: ..}` maps. `SS` wins when both are present.
    pub fn string_array(&self) -> Vec<String> {
        if let Some(ss) = &self.ss {
            return ss.clone();
        }
        match &self.l {
            Some(list) => list.iter().filter_map(|v| v.s.clone()).collect(),
            None => Vec::new(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.n.as_deref().and_then(|n| n.trim().parse().ok())
    }
}

pub type Attributes = HashMap<String, AttributeValue>;

/// Items that can be built from a raw attribute map.
///
/// Returns `None` when a required attribute is missing or unparseable; the
/// caller drops that item and keeps decoding the rest of the page.
pub trait FromAttributes: Sized {
    fn from_attributes(attrs: &Attributes) -> Option<Self>;
}

fn required_s(attrs: &Attributes, name: &str) -> Option<String> {
    attrs.get(name).and_then(|v| v.s.clone())
}

fn required_n(attrs: &Attributes, name: &str) -> Option<i64> {
    attrs.get(name).and_then(AttributeValue::as_i64)
}

fn optional_s(attrs: &Attributes, name: &str) -> Option<String> {
    attrs.get(name).and_then(|v| v.s.clone())
}

fn optional_n(attrs: &Attributes, name: &str) -> Option<i64> {
    attrs.get(name).and_then(AttributeValue::as_i64)
}

fn optional_array(attrs: &Attributes, name: &str) -> Option<Vec<String>> {
    attrs.get(name).map(AttributeValue::string_array)
}

impl FromAttributes for ContentItem {
    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        Some(ContentItem {
            url: required_s(attrs, "url")?,
            id: required_s(attrs, "id")?,
            title: required_s(attrs, "title")?,
            domain: required_s(attrs, "domain")?,
            category: required_s(attrs, "category")?,
            source: required_s(attrs, "source")?,
            upvotes: required_n(attrs, "upvotes")?,
            interactions: required_n(attrs, "interactions")?,
            thumbnail_url: required_s(attrs, "thumbnailUrl")?,
            fetched_at: required_s(attrs, "fetchedAt")?,
            updated_at: required_s(attrs, "updatedAt")?,
            bf_category: optional_s(attrs, "bfCategory"),
            bf_subcategory: optional_s(attrs, "bfSubcategory"),
            tags: optional_array(attrs, "tags").unwrap_or_default(),
            created_date: optional_s(attrs, "createdDate"),
            post_date: optional_s(attrs, "postDate"),
            text_content: optional_s(attrs, "text").or_else(|| optional_s(attrs, "textContent")),
            ai_summary: optional_s(attrs, "aiSummary"),
            reading_time_minutes: optional_n(attrs, "readingTimeMinutes"),
            word_count: optional_n(attrs, "wordCount"),
            ai_topics: optional_array(attrs, "aiTopics"),
            content_type: optional_s(attrs, "contentType"),
            quality_score: optional_n(attrs, "qualityScore"),
            ai_keywords: optional_array(attrs, "aiKeywords"),
            related_categories: optional_array(attrs, "relatedCategories"),
            comment_count: optional_n(attrs, "commentCount"),
            like_count: optional_n(attrs, "likeCount"),
            save_count: optional_n(attrs, "saveCount"),
            is_active: attrs.get("isActive").and_then(|v| v.bool).unwrap_or(true),
        })
    }
}

impl FromAttributes for FeedItem {
    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        Some(FeedItem {
            url: required_s(attrs, "url")?,
            title: required_s(attrs, "title")?,
            thumbnail_url: required_s(attrs, "thumbnailUrl")?,
            domain: required_s(attrs, "domain")?,
            category: required_s(attrs, "category")?,
            bf_category: optional_s(attrs, "bfCategory"),
            is_active: attrs.get("isActive").and_then(|v| v.bool).unwrap_or(true),
            word_count: optional_n(attrs, "wordCount"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseEnvelope {
    #[serde(default)]
    items: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    scanned_count: Option<u64>,
    #[serde(default)]
    last_evaluated_key: Option<serde_json::Value>,
}

/// Serialize a query expression into the request body.
pub fn encode_expression(expression: &QueryExpression) -> Result<Vec<u8>> {
    serde_json::to_vec(expression).map_err(|e| BrowseError::Parse(e.to_string()))
}

/// Decode a response body into a page of `T`.
///
/// Only a malformed envelope is an error; items that fail to decode are
/// dropped individually.
pub fn decode_page<T: FromAttributes>(body: &[u8]) -> Result<Page<T>> {
    let envelope: ResponseEnvelope =
        serde_json::from_slice(body).map_err(|e| BrowseError::Parse(e.to_string()))?;

    let raw_items = envelope.items.unwrap_or_default();
    let total = raw_items.len();

    let items: Vec<T> = raw_items
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<Attributes>(raw).ok())
        .filter_map(|attrs| T::from_attributes(&attrs))
        .collect();

    if items.len() < total {
        debug!("Dropped {} of {} items that failed to decode", total - items.len(), total);
    }

    Ok(Page {
        items,
        count: envelope.count,
        scanned_count: envelope.scanned_count,
        next: envelope
            .last_evaluated_key
            .filter(|key| !key.is_null())
            .map(Cursor),
    })
}
