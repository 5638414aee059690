//! Turns a [`ContentQuery`] into a store query or scan expression.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::{ContentQuery, SortHint};
use crate::dynamo::codec::AttributeValue;

pub const CATEGORY_INDEX: &str = "category-status-index";
pub const SOURCE_INDEX: &str = "source-index";
const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Scan,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Query => "Query",
            Operation::Scan => "Scan",
        }
    }
}

/// Request body for a Query or Scan call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryExpression {
    pub table_name: String,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: BTreeMap<String, AttributeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<serde_json::Value>,
    /// Applied after decode; never sent.
    #[serde(skip)]
    pub sort: SortHint,
}

impl QueryExpression {
    /// Index-backed expressions are Queries, everything else is a Scan.
    pub fn operation(&self) -> Operation {
        if self.index_name.is_some() {
            Operation::Query
        } else {
            Operation::Scan
        }
    }

    pub fn pending_key(&self) -> PendingRequestKey {
        PendingRequestKey {
            table: self.table_name.clone(),
            index: self.index_name.clone(),
            key_condition: self.key_condition_expression.clone(),
            filter: self.filter_expression.clone(),
            limit: self.limit,
            names: self
                .expression_attribute_names
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            values: self
                .expression_attribute_values
                .iter()
                .map(|(k, v)| {
                    let encoded = serde_json::to_string(v).unwrap_or_default();
                    (k.clone(), encoded)
                })
                .collect(),
            start_key: self.exclusive_start_key.as_ref().map(|k| k.to_string()),
        }
    }
}

/// Identity of an outbound request for in-flight deduplication.
///
/// Names and values are kept in sorted order so two logically identical
/// expressions always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingRequestKey {
    table: String,
    index: Option<String>,
    key_condition: Option<String>,
    filter: Option<String>,
    limit: u32,
    names: Vec<(String, String)>,
    values: Vec<(String, String)>,
    start_key: Option<String>,
}

impl fmt::Display for PendingRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/limit={}",
            self.table,
            self.index.as_deref().unwrap_or("scan"),
            self.limit
        )
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
}

impl QueryBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn build(&self, query: &ContentQuery) -> QueryExpression {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        let mut index_name = None;
        let mut key_condition = None;

        if let Some(category) = &query.category {
            index_name = Some(CATEGORY_INDEX.to_string());
            key_condition = Some("#bfCategory = :bfCategory AND #status = :status".to_string());
            names.insert("#bfCategory".to_string(), "bfCategory".to_string());
            names.insert("#status".to_string(), "status".to_string());
            values.insert(":bfCategory".to_string(), AttributeValue::string(category));
            values.insert(":status".to_string(), AttributeValue::string(ACTIVE_STATUS));
        } else if let Some(source) = &query.source {
            index_name = Some(SOURCE_INDEX.to_string());
            key_condition = Some("#source = :source".to_string());
            names.insert("#source".to_string(), "source".to_string());
            values.insert(":source".to_string(), AttributeValue::string(source));
        }

        let mut filters: Vec<String> = Vec::new();

        // The category index already encodes activity in its key. Scans
        // always filter.
        let needs_active_filter = match (&index_name, query.active_only) {
            (None, _) => true,
            (Some(index), Some(true)) => index != CATEGORY_INDEX,
            (Some(_), _) => false,
        };
        if needs_active_filter {
            filters.push("isActive = :isActive".to_string());
            values.insert(":isActive".to_string(), AttributeValue::boolean(true));
        }

        if let Some(subcategory) = &query.subcategory {
            filters.push("#bfSubcategory = :bfSubcategory".to_string());
            names.insert("#bfSubcategory".to_string(), "bfSubcategory".to_string());
            values.insert(":bfSubcategory".to_string(), AttributeValue::string(subcategory));
        }

        if let Some(tags) = query.tags.as_ref().filter(|t| !t.is_empty()) {
            names.insert("#tags".to_string(), "tags".to_string());
            for (i, tag) in tags.iter().enumerate() {
                filters.push(format!(
                    "(contains(#tags, :tag{i}) OR contains(#tags, :tagItem{i}))"
                ));
                values.insert(format!(":tag{i}"), AttributeValue::string(tag));
                values.insert(
                    format!(":tagItem{i}"),
                    AttributeValue::list(vec![AttributeValue::string(tag)]),
                );
            }
        }

        QueryExpression {
            table_name: self.table.clone(),
            limit: query.limit,
            index_name,
            key_condition_expression: key_condition,
            filter_expression: (!filters.is_empty()).then(|| filters.join(" AND ")),
            expression_attribute_names: names,
            expression_attribute_values: values,
            exclusive_start_key: query.cursor.as_ref().map(|c| c.0.clone()),
            sort: query.sort,
        }
    }
}
