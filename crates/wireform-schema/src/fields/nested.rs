//! Schemas used as fields.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use wireform_core::{type_name, ErrorDetail, Instance, ValidationError};
use wireform_validators::{run_validators, MaxLengthValidator, MinLengthValidator};

use crate::definition::SchemaDef;
use crate::error::RepresentationError;
use crate::field::{declare_field, Ctx, FieldBehavior, FieldOptions, Presence, Step};

/// A nested object, or with [`many`](Self::many) a list of them, validated
/// and represented by another schema definition.
///
/// Partial mode reaches the nested schema: absent nested values are skipped,
/// and an empty list that is not allowed is skipped rather than rejected.
#[derive(Debug, Clone)]
pub struct NestedField {
    options: FieldOptions,
    def: Arc<SchemaDef>,
    many: bool,
    allow_empty: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

declare_field!(NestedField);

impl NestedField {
    /// A single nested object described by `def`.
    pub fn new(def: &Arc<SchemaDef>) -> Self {
        Self {
            options: FieldOptions::default(),
            def: Arc::clone(def),
            many: false,
            allow_empty: true,
            min_length: None,
            max_length: None,
        }
    }

    /// A list of nested objects described by `def`.
    pub fn many(def: &Arc<SchemaDef>) -> Self {
        Self {
            many: true,
            ..Self::new(def)
        }
    }

    /// Whether an empty list is accepted. Only meaningful with `many`.
    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Minimum number of items. Only meaningful with `many`.
    pub fn min_length(mut self, limit: usize) -> Self {
        self.min_length = Some(limit);
        self.rebuild_implied();
        self
    }

    /// Maximum number of items. Only meaningful with `many`.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self.rebuild_implied();
        self
    }

    /// The nested definition.
    pub fn definition(&self) -> &Arc<SchemaDef> {
        &self.def
    }

    /// Whether the field holds a list.
    pub fn is_many(&self) -> bool {
        self.many
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

    fn validate_one(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        if !data.is_object() {
            return Err(self.fail("invalid", ctx, &[("datatype", &type_name(data))]));
        }
        self.def.validate_in(self.def.fields(), data, self.nested_ctx(ctx))
    }

    /// The nested definition runs under its own engine configuration.
    fn nested_ctx<'c>(&'c self, ctx: Ctx<'c>) -> Ctx<'c> {
        Ctx {
            config: self.def.config(),
            ..ctx
        }
    }

    fn represent_one(
        &self,
        instance: &Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        if instance.is_null() {
            return Ok(Value::Null);
        }
        self.def
            .represent_in(self.def.fields(), instance, self.nested_ctx(ctx))
            .map(Value::Object)
    }
}

impl FieldBehavior for NestedField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[
            (
                "invalid",
                "Invalid data. Expected a dictionary, but got {datatype}.",
            ),
            (
                "not_a_list",
                "Expected a list of items but got type \"{input_type}\".",
            ),
            ("empty", "This list may not be empty."),
        ]
    }

    fn type_initial(&self) -> Value {
        if self.many {
            return Value::Array(Vec::new());
        }
        Value::Object(
            self.def
                .fields()
                .iter()
                .map(|(name, bound)| (name.clone(), bound.field().initial_value()))
                .collect::<Map<String, Value>>(),
        )
    }

    fn run_validation(&self, data: Option<&Value>, ctx: Ctx<'_>) -> Result<Step, ValidationError> {
        let data = match self.validate_empty_values(data, ctx)? {
            Presence::Resolved(step) => return Ok(step),
            Presence::Present(data) => data,
        };
        if self.many && !self.allow_empty && data.as_array().is_some_and(Vec::is_empty) {
            if ctx.partial {
                return Ok(Step::Skip);
            }
            return Err(self.fail("empty", ctx, &[]));
        }
        let value = self.to_internal_value(data, ctx)?;
        run_validators(self.options.all_validators(), &value)?;
        Ok(Step::Value(value))
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        if !self.many {
            return self.validate_one(data, ctx);
        }
        let Value::Array(items) = data else {
            return Err(self.fail("not_a_list", ctx, &[("input_type", &type_name(data))]));
        };
        let mut validated = Vec::with_capacity(items.len());
        let mut errors: BTreeMap<usize, ErrorDetail> = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            let outcome = if item.is_null() {
                Err(self.fail("null", ctx, &[]))
            } else {
                self.validate_one(item, ctx)
            };
            match outcome {
                Ok(value) => validated.push(value),
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
        if !self.many {
            return self.represent_one(&value, ctx);
        }
        match &value {
            Instance::Objects(objects) => objects
                .iter()
                .map(|object| self.represent_one(&Instance::Object(*object), ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Instance::Value(inner) => match &**inner {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.represent_one(&Instance::from(item), ctx))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => {
                    tracing::warn!(
                        schema = %self.def.name(),
                        found = type_name(other),
                        "nested list field given a non-sequence value; passing it through"
                    );
                    Ok(other.clone())
                }
            },
            Instance::Object(object) => self
                .represent_one(&Instance::Object(*object), ctx)
                .map(|one| Value::Array(vec![one])),
        }
    }
}
