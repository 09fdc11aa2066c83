//! Default `Accept` header selection from a requested data type.

use serde::Deserialize;

const ALL_TYPES: &str = "*/*";

/// Data type tokens understood by the resolver. Anything else is `Unknown`
/// and falls back to `*/*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DataType {
    Any,
    Text,
    Html,
    Xml,
    Json,
    Unknown(String),
}

impl DataType {
    fn media_types(&self) -> Option<&'static str> {
        match self {
            DataType::Any => Some(ALL_TYPES),
            DataType::Text => Some("text/plain"),
            DataType::Html => Some("text/html"),
            DataType::Xml => Some("application/xml, text/xml"),
            DataType::Json => Some("application/json, text/javascript"),
            DataType::Unknown(_) => None,
        }
    }
}

impl From<&str> for DataType {
    fn from(token: &str) -> Self {
        match token {
            "*" => DataType::Any,
            "text" => DataType::Text,
            "html" => DataType::Html,
            "xml" => DataType::Xml,
            "json" => DataType::Json,
            other => DataType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for DataType {
    fn from(token: String) -> Self {
        DataType::from(token.as_str())
    }
}

/// The `Accept` value for `data_type`.
///
/// Matched tokens other than `*` get a low-priority `*/*` fallback appended.
pub fn resolve(data_type: Option<&DataType>) -> String {
    match data_type {
        Some(DataType::Any) | None => ALL_TYPES.to_string(),
        Some(dt) => match dt.media_types() {
            Some(types) => format!("{types}, {ALL_TYPES}; q=0.01"),
            None => ALL_TYPES.to_string(),
        },
    }
}
