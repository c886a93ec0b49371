//! Notion API request types
//!
//! Bodies for each backend call. Optional fields are skipped when absent so
//! nothing the caller left out is forwarded as `null`. Response payloads are
//! not modelled; they are passed through as `serde_json::Value`.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::notion::{DEFAULT_EMOJI, DEFAULT_PAGE_SIZE};
use crate::notion::blocks::BlockContent;

/// Parent of a page or database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: String },
    PageId { page_id: String },
}

/// Body of `POST /search`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    pub page_size: u32,
}

impl SearchRequest {
    /// Search restricted to databases, most recently edited first
    pub fn databases() -> Self {
        Self {
            query: None,
            filter: Some(json!({
                "property": "object",
                "value": "database"
            })),
            sort: Some(json!({
                "direction": "descending",
                "timestamp": "last_edited_time"
            })),
            start_cursor: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Body of `POST /databases/{id}/query`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    pub page_size: u32,
}

/// Body of `POST /pages`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePageRequest {
    pub parent: Parent,

    pub properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Value>>,
}

/// Body of `PATCH /pages/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePageRequest {
    pub properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// Body of `POST /databases`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDatabaseRequest {
    pub parent: Parent,

    pub title: Vec<Value>,

    pub properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Value>,
}

/// Body of `PATCH /databases/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateDatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// Query string of `GET /blocks/{id}/children`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListBlockChildrenQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    pub page_size: u32,
}

/// Body of `PATCH /blocks/{id}/children`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendBlockChildrenRequest {
    pub children: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// Body of `PATCH /blocks/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateBlockRequest {
    /// Serialized as a single field named after the block type
    #[serde(flatten)]
    pub content: BlockContent,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// Resolve a caller-supplied page size; absent or zero means the default.
pub fn page_size_or_default(page_size: Option<u32>) -> u32 {
    page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Decode a page size sent as any JSON number with a whole, non-negative value,
/// so `10` and `10.0` both mean ten.
pub fn deserialize_page_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let whole = match (number.as_u64(), number.as_f64()) {
        (Some(n), _) => u32::try_from(n).ok(),
        (None, Some(f)) if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) => {
            Some(f as u32)
        }
        _ => None,
    };

    whole.map(Some).ok_or_else(|| {
        de::Error::custom(format!(
            "invalid page_size {}: expected a whole number",
            number
        ))
    })
}

/// Treat an empty cursor the same as a missing one.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Fill in the default glyph for an emoji icon given without one.
pub fn with_default_emoji(mut icon: Value) -> Value {
    if let Some(obj) = icon.as_object_mut() {
        let is_emoji = obj.get("type").and_then(Value::as_str) == Some("emoji");
        let glyph_missing = match obj.get("emoji") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if is_emoji && glyph_missing {
            obj.insert("emoji".to_string(), Value::String(DEFAULT_EMOJI.to_string()));
        }
    }
    icon
}
