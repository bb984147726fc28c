//! # Error Types — Validation Error Trees
//!
//! A failed validation never aborts the caller. Every failure is captured as
//! an [`ErrorDetail`]: a flat list of messages for a leaf value, a mapping by
//! field name for a schema, or a mapping by position for a list. Trees nest
//! arbitrarily deep and serialize to plain JSON:
//!
//! ```text
//! {"name": ["This field is required."], "tags": {"2": ["Not a valid string."]}}
//! ```
//!
//! Each message keeps a machine-readable `code` (`required`, `null`,
//! `invalid`, ...) next to its rendered text. Only the text is serialized;
//! the code exists for callers that branch on the failure kind.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A single rendered failure message and the kind of failure it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Machine-readable failure kind, e.g. `"required"` or `"invalid_choice"`.
    pub code: &'static str,
    /// Human-readable, fully rendered message.
    pub message: String,
}

impl ErrorMessage {
    /// Create a message with the given kind and rendered text.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Serialize for ErrorMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.message)
    }
}

/// Error tree produced by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    /// Failures of a single value.
    Messages(Vec<ErrorMessage>),
    /// Failures of a schema, keyed by declared field name in declaration order.
    Fields(IndexMap<String, ErrorDetail>),
    /// Failures of a sequence, keyed by the position of each failing item.
    Items(BTreeMap<usize, ErrorDetail>),
}

impl ErrorDetail {
    /// A leaf with a single message.
    pub fn message(code: &'static str, message: impl Into<String>) -> Self {
        Self::Messages(vec![ErrorMessage::new(code, message)])
    }

    /// Returns true if the tree carries no failure at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Messages(m) => m.is_empty(),
            Self::Fields(f) => f.values().all(ErrorDetail::is_empty),
            Self::Items(i) => i.values().all(ErrorDetail::is_empty),
        }
    }

    /// Look up the subtree for a field of a schema-level tree.
    pub fn field(&self, name: &str) -> Option<&ErrorDetail> {
        match self {
            Self::Fields(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Look up the subtree for a position of a list-level tree.
    pub fn item(&self, index: usize) -> Option<&ErrorDetail> {
        match self {
            Self::Items(items) => items.get(&index),
            _ => None,
        }
    }

    /// Leaf messages of this node (empty for interior nodes).
    pub fn messages(&self) -> &[ErrorMessage] {
        match self {
            Self::Messages(m) => m,
            _ => &[],
        }
    }

    /// Every failure kind in the tree, depth-first in tree order.
    pub fn codes(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.collect_codes(&mut out);
        out
    }

    fn collect_codes(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::Messages(m) => out.extend(m.iter().map(|m| m.code)),
            Self::Fields(f) => f.values().for_each(|d| d.collect_codes(out)),
            Self::Items(i) => i.values().for_each(|d| d.collect_codes(out)),
        }
    }

    /// Render the tree as a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Messages(m) => Value::Array(
                m.iter()
                    .map(|m| Value::String(m.message.clone()))
                    .collect(),
            ),
            Self::Fields(f) => Value::Object(
                f.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Items(i) => Value::Object(
                i.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ErrorDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Messages(messages) => {
                let mut seq = serializer.serialize_seq(Some(messages.len()))?;
                for m in messages {
                    seq.serialize_element(m)?;
                }
                seq.end()
            }
            Self::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Items(items) => {
                let mut map = serializer.serialize_map(Some(items.len()))?;
                for (k, v) in items {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// A recoverable validation failure carrying an error tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    detail: ErrorDetail,
}

impl ValidationError {
    /// Wrap an existing error tree.
    pub fn new(detail: ErrorDetail) -> Self {
        Self { detail }
    }

    /// A failure with a single rendered message.
    pub fn message(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorDetail::message(code, message))
    }

    /// A failure listing several messages for one value.
    pub fn messages(messages: Vec<ErrorMessage>) -> Self {
        Self::new(ErrorDetail::Messages(messages))
    }

    /// A schema-level failure keyed by field name.
    pub fn fields(fields: IndexMap<String, ErrorDetail>) -> Self {
        Self::new(ErrorDetail::Fields(fields))
    }

    /// A list-level failure keyed by item position.
    pub fn items(items: BTreeMap<usize, ErrorDetail>) -> Self {
        Self::new(ErrorDetail::Items(items))
    }

    /// Borrow the error tree.
    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    /// Consume the error and return its tree.
    pub fn into_detail(self) -> ErrorDetail {
        self.detail
    }

    /// Every failure kind in the tree.
    pub fn codes(&self) -> Vec<&'static str> {
        self.detail.codes()
    }
}

impl From<ErrorMessage> for ValidationError {
    fn from(message: ErrorMessage) -> Self {
        Self::messages(vec![message])
    }
}

impl From<ErrorDetail> for ValidationError {
    fn from(detail: ErrorDetail) -> Self {
        Self::new(detail)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {}", self.detail)
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.detail.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> ErrorDetail {
        let mut items = BTreeMap::new();
        items.insert(2, ErrorDetail::message("invalid", "Not a valid string."));
        items.insert(0, ErrorDetail::message("null", "This field may not be null."));

        let mut fields = IndexMap::new();
        fields.insert(
            "name".to_string(),
            ErrorDetail::message("required", "This field is required."),
        );
        fields.insert("tags".to_string(), ErrorDetail::Items(items));
        ErrorDetail::Fields(fields)
    }

    #[test]
    fn serializes_to_plain_json() {
        let value = serde_json::to_value(sample_tree()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": ["This field is required."],
                "tags": {"0": ["This field may not be null."], "2": ["Not a valid string."]}
            })
        );
        assert_eq!(value, sample_tree().to_json());
    }

    #[test]
    fn field_order_is_preserved() {
        let text = serde_json::to_string(&sample_tree()).unwrap();
        assert!(text.find("name").unwrap() < text.find("tags").unwrap());
    }

    #[test]
    fn codes_walk_the_whole_tree() {
        assert_eq!(sample_tree().codes(), vec!["required", "null", "invalid"]);
    }

    #[test]
    fn lookup_helpers() {
        let tree = sample_tree();
        let tags = tree.field("tags").unwrap();
        assert!(tags.item(1).is_none());
        assert_eq!(tags.item(2).unwrap().messages()[0].code, "invalid");
        assert!(tree.field("missing").is_none());
    }

    #[test]
    fn empty_tree_detection() {
        assert!(ErrorDetail::Messages(vec![]).is_empty());
        assert!(ErrorDetail::Fields(IndexMap::new()).is_empty());
        assert!(!sample_tree().is_empty());
    }

    #[test]
    fn display_is_json() {
        let err = ValidationError::message("blank", "This field may not be blank.");
        assert_eq!(
            err.to_string(),
            r#"validation failed: ["This field may not be blank."]"#
        );
    }
}
