//! Homogeneous sequences.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use wireform_core::{type_name, ErrorDetail, Instance, ValidationError};
use wireform_validators::{MaxLengthValidator, MinLengthValidator};

use crate::error::RepresentationError;
use crate::field::{declare_field, Ctx, Field, FieldBehavior, FieldOptions, Step};
use crate::fields::RawField;

/// A sequence whose items all pass through one child field.
///
/// Strings and mappings are rejected even though both are iterable. Every
/// item is validated; failures are collected by index and reported
/// together.
#[derive(Debug, Clone)]
pub struct ListField {
    options: FieldOptions,
    child: Box<Field>,
    allow_empty: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

declare_field!(ListField);

impl Default for ListField {
    fn default() -> Self {
        Self::new()
    }
}

impl ListField {
    /// A list accepting items of any shape.
    pub fn new() -> Self {
        Self::of(RawField::new())
    }

    /// A list whose items are validated by `child`.
    pub fn of(child: impl Into<Field>) -> Self {
        let mut child = child.into();
        child.options_mut().source = None;
        Self {
            options: FieldOptions::default(),
            child: Box::new(child),
            allow_empty: true,
            min_length: None,
            max_length: None,
        }
    }

    /// Whether an empty list is accepted. Defaults to true.
    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Minimum number of items.
    pub fn min_length(mut self, limit: usize) -> Self {
        self.min_length = Some(limit);
        self.rebuild_implied();
        self
    }

    /// Maximum number of items.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self.rebuild_implied();
        self
    }

    /// The item field.
    pub fn child(&self) -> &Field {
        &self.child
    }

    fn rebuild_implied(&mut self) {
        self.options.implied.clear();
        if let Some(limit) = self.max_length {
            self.options
                .implied
                .push(Arc::new(MaxLengthValidator::new(limit)));
        }
        if let Some(limit) = self.min_length {
            self.options
                .implied
                .push(Arc::new(MinLengthValidator::new(limit)));
        }
    }
}

impl FieldBehavior for ListField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[
            (
                "not_a_list",
                "Expected a list of items but got type \"{input_type}\".",
            ),
            ("empty", "This list may not be empty."),
        ]
    }

    fn type_initial(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        let Value::Array(items) = data else {
            return Err(self.fail("not_a_list", ctx, &[("input_type", &type_name(data))]));
        };
        if !self.allow_empty && items.is_empty() {
            return Err(self.fail("empty", ctx, &[]));
        }
        let mut validated = Vec::with_capacity(items.len());
        let mut errors: BTreeMap<usize, ErrorDetail> = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            match self.child.run_validation_in(Some(item), ctx) {
                Ok(Step::Value(value)) => validated.push(value),
                Ok(Step::Skip) => {}
                Err(err) => {
                    errors.insert(index, err.into_detail());
                }
            }
        }
        if errors.is_empty() {
            Ok(Value::Array(validated))
        } else {
            Err(ValidationError::items(errors))
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        match value {
            Instance::Objects(objects) => objects
                .into_iter()
                .map(|object| self.child.represent_in(Instance::Object(object), ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Instance::Value(value) => match &*value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.child.represent_in(Instance::from(item), ctx))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => {
                    tracing::warn!(
                        found = type_name(other),
                        "list field given a non-sequence value; passing it through"
                    );
                    Ok(other.clone())
                }
            },
            Instance::Object(object) => {
                tracing::warn!(
                    found = object.type_name(),
                    "list field given a single object; representing as null"
                );
                Ok(Value::Null)
            }
        }
    }
}
