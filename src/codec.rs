//! Body content kinds and the structured codecs behind them.
//!
//! `json` and `xml` are self-describing and go through serde. `text` is
//! output-only and renders a value with [`Value::render_text`]. `form` is
//! recognised by the request schema but has no codec.

use crate::error::CodecError;
use crate::reflect::{Shape, StructShape, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A body encoding named in a `body:"..."` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Xml,
    Text,
    Form,
}

impl ContentKind {
    /// Parse a tag value. Matching is exact, the vocabulary is lowercase.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "json" => Some(ContentKind::Json),
            "xml" => Some(ContentKind::Xml),
            "text" => Some(ContentKind::Text),
            "form" => Some(ContentKind::Form),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Xml => "xml",
            ContentKind::Text => "text",
            ContentKind::Form => "form",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a complete payload into a fresh `T`.
pub fn decode<T: DeserializeOwned>(kind: ContentKind, bytes: &[u8]) -> Result<T, CodecError> {
    match kind {
        ContentKind::Json => Ok(serde_json::from_slice(bytes)?),
        ContentKind::Xml => {
            let text = std::str::from_utf8(bytes)?;
            quick_xml::de::from_str(text).map_err(|e| CodecError::Xml(e.to_string()))
        }
        other => Err(CodecError::Unsupported(other)),
    }
}

/// Encode `value` for a response body.
///
/// `text` needs the dynamic view of the value, so the caller passes it
/// alongside the serde view. `shape` picks the xml root element for values
/// that are not records.
pub fn encode<T: Serialize + ?Sized>(
    kind: ContentKind,
    value: &T,
    shape: &Shape,
    dynamic: impl FnOnce() -> Value,
) -> Result<Vec<u8>, CodecError> {
    match kind {
        ContentKind::Json => Ok(serde_json::to_vec(value)?),
        ContentKind::Xml => match xml_root(shape) {
            Some(root) => quick_xml::se::to_string_with_root(root, value),
            None => quick_xml::se::to_string(value),
        }
        .map(String::into_bytes)
        .map_err(|e| CodecError::Xml(e.to_string())),
        ContentKind::Text => Ok(dynamic().render_text().into_bytes()),
        ContentKind::Form => Err(CodecError::Unsupported(ContentKind::Form)),
    }
}

/// Root element for a value that is not a record: `<string>nope</string>`,
/// `<u16>42</u16>`. Sequences repeat the element name of their items.
fn xml_root(shape: &Shape) -> Option<&str> {
    match shape {
        Shape::Struct(_) => None,
        Shape::Optional(inner) => xml_root(inner),
        other => Some(element_name(other)),
    }
}

fn element_name(shape: &Shape) -> &str {
    match shape {
        Shape::Optional(inner) | Shape::List(inner) | Shape::Array(_, inner) => {
            element_name(inner)
        }
        Shape::Struct(StructShape { name: Some(name), .. }) => {
            // `type_name` is fully qualified; keep the last segment without generics
            let base = name.split('<').next().unwrap_or_default();
            let start = base.rfind("::").map_or(0, |i| i + 2);
            &base[start..]
        }
        Shape::Struct(_) => "struct",
        Shape::Bool => "bool",
        Shape::Number(kind) => kind.name(),
        Shape::Str => "string",
        Shape::Failure => "error",
        Shape::Map(..) => "map",
        Shape::Blob(_) | Shape::Dynamic => "value",
    }
}
