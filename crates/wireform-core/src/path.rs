//! # Source Paths
//!
//! Every bound field carries a [`SourcePath`]: where its value lives inside
//! the validated tree and inside a model instance. A dotted source such as
//! `profile.city` addresses a nested mapping; the wildcard `*` binds the
//! field to the whole object.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Resolved location of a field's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourcePath {
    /// The wildcard `*`: the field reads the whole instance and its
    /// validated value is merged into the root of the output tree.
    Whole,
    /// Dotted path segments, outermost first. Never empty.
    Attrs(Vec<String>),
}

impl SourcePath {
    /// Parse a declared source. `"*"` is the wildcard; anything else is split
    /// on `.`.
    pub fn parse(source: &str) -> Self {
        if source == "*" {
            Self::Whole
        } else {
            Self::Attrs(source.split('.').map(str::to_string).collect())
        }
    }

    /// Path segments; empty for the wildcard.
    pub fn segments(&self) -> &[String] {
        match self {
            Self::Whole => &[],
            Self::Attrs(attrs) => attrs,
        }
    }

    /// Returns true for the wildcard path.
    pub fn is_whole(&self) -> bool {
        matches!(self, Self::Whole)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => f.write_str("*"),
            Self::Attrs(attrs) => f.write_str(&attrs.join(".")),
        }
    }
}

/// A value could not be written because the target position is not a mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot write at `{path}`: expected a mapping, found {found}")]
pub struct NotAMapping {
    /// The path being written.
    pub path: String,
    /// Type name of the value found in the way.
    pub found: &'static str,
}

/// Write `value` into `tree` at `path`.
///
/// Intermediate mappings along a dotted path are created on demand and
/// merged into when they already exist. The wildcard path merges the keys of
/// `value` into the root; a null value merges nothing.
pub fn set_value(
    tree: &mut Map<String, Value>,
    path: &SourcePath,
    value: Value,
) -> Result<(), NotAMapping> {
    let attrs = match path {
        SourcePath::Whole => {
            return match value {
                Value::Object(entries) => {
                    tree.extend(entries);
                    Ok(())
                }
                Value::Null => Ok(()),
                other => Err(NotAMapping {
                    path: path.to_string(),
                    found: crate::value::type_name(&other),
                }),
            };
        }
        SourcePath::Attrs(attrs) => attrs,
    };

    let Some((last, parents)) = attrs.split_last() else {
        return Ok(());
    };

    let mut current = tree;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            other => {
                return Err(NotAMapping {
                    path: path.to_string(),
                    found: crate::value::type_name(other),
                })
            }
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}
