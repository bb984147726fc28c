//! # Choice Tables
//!
//! A choice table enumerates the accepted keys of a choice field together
//! with their display values. Three declaration styles are accepted and may
//! be mixed:
//!
//! ```text
//! single:  1                       → key 1, display 1
//! paired:  [1, "First"]            → key 1, display "First"
//! grouped: ["Group", [[1, "1st"]]] → a labelled sub-table
//! ```
//!
//! Lookups go through the flattened table, where grouped entries are lifted
//! one level into the top-level table. Keys are matched by their text form,
//! so the input `"2"` resolves to the declared key `2`.

use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

use crate::value::to_text;

/// A declared choice.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    /// A key that is its own display value.
    Single(Value),
    /// A key and its display value.
    Pair(Value, Value),
    /// A labelled group of choices.
    Group(String, Vec<Choice>),
}

impl Choice {
    /// A key that displays as itself.
    pub fn single(key: impl Into<Value>) -> Self {
        Self::Single(key.into())
    }

    /// A key with a display value.
    pub fn pair(key: impl Into<Value>, display: impl Into<Value>) -> Self {
        Self::Pair(key.into(), display.into())
    }

    /// A labelled group.
    pub fn group(label: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::Group(label.into(), choices)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(mut parts) => {
                if parts.len() != 2 {
                    return Err(format!(
                        "a choice pair must have exactly two elements, got {}",
                        parts.len()
                    ));
                }
                let second = parts.pop().unwrap_or(Value::Null);
                let first = parts.pop().unwrap_or(Value::Null);
                match second {
                    Value::Array(subs) => {
                        let label = to_text(&first);
                        let choices = subs
                            .into_iter()
                            .map(Choice::from_value)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Self::Group(label, choices))
                    }
                    display => Ok(Self::Pair(first, display)),
                }
            }
            Value::Object(_) => Err("a choice must be a scalar or a pair".to_string()),
            key => Ok(Self::Single(key)),
        }
    }
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Choice::from_value(value).map_err(D::Error::custom)
    }
}

/// A normalized table entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceEntry {
    /// An option with its key and display value.
    Option {
        /// Declared key.
        key: Value,
        /// Display value.
        display: Value,
    },
    /// A labelled group of entries.
    Group {
        /// Group label.
        label: String,
        /// Entries of the group.
        entries: Vec<ChoiceEntry>,
    },
}

impl ChoiceEntry {
    fn from_choice(choice: Choice) -> Self {
        match choice {
            Choice::Single(key) => Self::Option {
                display: key.clone(),
                key,
            },
            Choice::Pair(key, display) => Self::Option { key, display },
            Choice::Group(label, choices) => Self::Group {
                label,
                entries: choices.into_iter().map(Self::from_choice).collect(),
            },
        }
    }

    fn display_value(&self) -> Value {
        match self {
            Self::Option { display, .. } => display.clone(),
            Self::Group { entries, .. } => Value::Object(
                entries
                    .iter()
                    .map(|e| (e.key_text(), e.display_value()))
                    .collect(),
            ),
        }
    }

    fn key_value(&self) -> Value {
        match self {
            Self::Option { key, .. } => key.clone(),
            Self::Group { label, .. } => Value::String(label.clone()),
        }
    }

    fn key_text(&self) -> String {
        to_text(&self.key_value())
    }
}

/// An ordered, grouped choice table with a flattened lookup index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChoiceTable {
    entries: Vec<ChoiceEntry>,
    flat: IndexMap<String, (Value, Value)>,
}

impl ChoiceTable {
    /// Build a table from declared choices. Later duplicates of a key replace
    /// earlier ones in the flattened index.
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        let entries: Vec<ChoiceEntry> = choices.into_iter().map(ChoiceEntry::from_choice).collect();
        let mut flat = IndexMap::new();
        for entry in &entries {
            match entry {
                ChoiceEntry::Option { key, display } => {
                    flat.insert(to_text(key), (key.clone(), display.clone()));
                }
                ChoiceEntry::Group { entries: subs, .. } => {
                    for sub in subs {
                        flat.insert(sub.key_text(), (sub.key_value(), sub.display_value()));
                    }
                }
            }
        }
        Self { entries, flat }
    }

    /// Grouped entries in declaration order.
    pub fn entries(&self) -> &[ChoiceEntry] {
        &self.entries
    }

    /// Flattened `(key, display)` pairs in declaration order.
    pub fn flattened(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.flat.values().map(|(k, d)| (k, d))
    }

    /// Resolve the declared key whose text form equals `text`.
    pub fn resolve(&self, text: &str) -> Option<&Value> {
        self.flat.get(text).map(|(key, _)| key)
    }

    /// Display value of the key whose text form equals `text`.
    pub fn display(&self, text: &str) -> Option<&Value> {
        self.flat.get(text).map(|(_, display)| display)
    }

    /// Number of flattened options.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Returns true if the table has no options.
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}

impl FromIterator<Choice> for ChoiceTable {
    fn from_iter<I: IntoIterator<Item = Choice>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_by_text_form() {
        let table = ChoiceTable::new([Choice::pair(1, "First"), Choice::pair(2, "Second")]);
        assert_eq!(table.resolve("2"), Some(&json!(2)));
        assert_eq!(table.display("1"), Some(&json!("First")));
        assert!(table.resolve("9").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn groups_flatten_one_level() {
        let table = ChoiceTable::new([
            Choice::group(
                "Category",
                vec![Choice::pair(1, "1st"), Choice::single(2)],
            ),
            Choice::pair(3, "Third"),
        ]);
        let keys: Vec<_> = table.flattened().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(table.display("2"), Some(&json!(2)));
        assert!(table.resolve("Category").is_none());
    }

    #[test]
    fn nested_groups_become_entries() {
        let table = ChoiceTable::new([Choice::group(
            "Outer",
            vec![Choice::group("Inner", vec![Choice::pair("a", "A")])],
        )]);
        assert_eq!(table.resolve("Inner"), Some(&json!("Inner")));
        assert_eq!(table.display("Inner"), Some(&json!({"a": "A"})));
    }

    #[test]
    fn deserializes_all_styles() {
        let choices: Vec<Choice> =
            serde_json::from_value(json!([1, [2, "Second"], ["Group", [[3, "Third"], 4]]]))
                .unwrap();
        assert_eq!(
            choices,
            vec![
                Choice::single(1),
                Choice::pair(2, "Second"),
                Choice::group("Group", vec![Choice::pair(3, "Third"), Choice::single(4)]),
            ]
        );
        assert!(serde_json::from_value::<Choice>(json!([1, 2, 3])).is_err());
    }
}
