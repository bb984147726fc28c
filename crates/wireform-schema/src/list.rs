//! # List Schemas
//!
//! A [`ListSchema`] validates and represents a sequence of objects with one
//! child [`Schema`]. The child's bindings are made once and reused for every
//! item. List-level options (`allow_empty`, length bounds) belong to the
//! wrapper, never to the child.
//!
//! Item failures are collected by position; only failing positions appear
//! in the error tree. A failed list behaves exactly like a failed single
//! schema: `is_valid` is false, `errors` holds the tree, `validated_data`
//! is an empty list.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use serde_json::Value;

use wireform_core::{type_name, ErrorDetail, Instance, ValidationError};
use wireform_validators::{run_validators, MaxLengthValidator, MinLengthValidator, Validator};

use crate::definition::schema_failure;
use crate::error::{RepresentationError, SchemaError};
use crate::field::{Context, Ctx};
use crate::message::Message;
use crate::schema::{check_message_type, Outcome, Schema, Serializer};

/// A schema over a sequence of objects.
pub struct ListSchema<'a> {
    child: Schema<'a>,
    instance: Option<Instance<'a>>,
    request_data: Option<Value>,
    allow_empty: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    outcome: OnceCell<Outcome>,
}

impl<'a> ListSchema<'a> {
    /// Wrap `child`. Its partial flag and context apply to every item.
    pub fn new(child: Schema<'a>) -> Self {
        Self {
            child,
            instance: None,
            request_data: None,
            allow_empty: true,
            min_length: None,
            max_length: None,
            outcome: OnceCell::new(),
        }
    }

    /// The payload to validate; must be a list.
    pub fn request_data(mut self, data: Value) -> Self {
        self.request_data = Some(data);
        self
    }

    /// The sequence to represent: a JSON array or a list of objects.
    pub fn instance(mut self, instance: impl Into<Instance<'a>>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Skip absent fields of every item.
    pub fn partial(mut self, partial: bool) -> Self {
        self.child = self.child.partial(partial);
        self
    }

    /// Values passed to hooks and method fields.
    pub fn context(mut self, context: Context) -> Self {
        self.child = self.child.context(context);
        self
    }

    /// Whether an empty list is accepted. Defaults to true.
    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Minimum number of items.
    pub fn min_length(mut self, limit: usize) -> Self {
        self.min_length = Some(limit);
        self
    }

    /// Maximum number of items.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self
    }

    /// The schema applied to each item.
    pub fn child(&self) -> &Schema<'a> {
        &self.child
    }

    fn run_validation(&self, data: Option<&Value>, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        let data = match data {
            None => return Ok(Value::Array(Vec::new())),
            Some(Value::Null) => return Err(schema_failure(ctx.config, "null", &[])),
            Some(data) => data,
        };
        let Value::Array(items) = data else {
            return Err(schema_failure(
                ctx.config,
                "not_a_list",
                &[("input_type", &type_name(data))],
            ));
        };
        if !self.allow_empty && items.is_empty() {
            return Err(schema_failure(ctx.config, "empty", &[]));
        }
        let max = self.max_length.map(MaxLengthValidator::new);
        let min = self.min_length.map(MinLengthValidator::new);
        let limits = max
            .as_ref()
            .map(|v| v as &dyn Validator)
            .into_iter()
            .chain(min.as_ref().map(|v| v as &dyn Validator));
        run_validators(limits, data)?;

        let mut validated = Vec::with_capacity(items.len());
        let mut errors: BTreeMap<usize, ErrorDetail> = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            match self.child.run_validation(Some(item), ctx) {
                Ok(value) => validated.push(value),
                Err(err) => {
                    errors.insert(index, err.into_detail());
                }
            }
        }
        tracing::debug!(
            schema = %self.child.definition().name(),
            items = items.len(),
            failed = errors.len(),
            "list validation finished"
        );
        if errors.is_empty() {
            Ok(Value::Array(validated))
        } else {
            Err(ValidationError::items(errors))
        }
    }

    fn outcome(&self) -> &Outcome {
        self.outcome.get_or_init(|| {
            let result = self.run_validation(self.request_data.as_ref(), self.child.ctx());
            Outcome::from_result(result, Value::Array(Vec::new()))
        })
    }

    /// Validate the request data once; true when every item passed.
    pub fn is_valid(&self) -> bool {
        self.outcome().errors.is_none()
    }

    /// Validate and return the validated list, or the error tree as an error.
    pub fn validate(&self) -> Result<&Value, SchemaError> {
        let outcome = self.outcome();
        match &outcome.errors {
            Some(detail) => Err(ValidationError::new(detail.clone()).into()),
            None => Ok(&outcome.validated),
        }
    }

    /// The error tree, `None` when valid.
    pub fn errors(&self) -> Result<Option<&ErrorDetail>, SchemaError> {
        self.outcome
            .get()
            .map(|outcome| outcome.errors.as_ref())
            .ok_or(SchemaError::NotValidated { accessed: "errors" })
    }

    /// The validated list; empty when invalid.
    pub fn validated_data(&self) -> Result<&Value, SchemaError> {
        self.outcome
            .get()
            .map(|outcome| &outcome.validated)
            .ok_or(SchemaError::NotValidated {
                accessed: "validated_data",
            })
    }

    /// The representation of the instance, else the validated list, else
    /// the initial list.
    pub fn data(&self) -> Result<Value, SchemaError> {
        if self.request_data.is_some() && self.outcome.get().is_none() {
            return Err(SchemaError::NotValidated { accessed: "data" });
        }
        let outcome = self.outcome.get();
        let clean = outcome.map_or(true, |o| o.errors.is_none());
        if let (Some(instance), true) = (&self.instance, clean) {
            return Ok(Value::Array(self.to_representation(instance)?));
        }
        match outcome {
            Some(outcome) if outcome.errors.is_none() => Ok(outcome.validated.clone()),
            _ => Ok(self.initial()),
        }
    }

    /// The request data as represented by the child, or an empty list.
    pub fn initial(&self) -> Value {
        match &self.request_data {
            Some(data @ Value::Array(_)) => self
                .to_representation(&Instance::from(data))
                .map(Value::Array)
                .unwrap_or_else(|_| data.clone()),
            _ => Value::Array(Vec::new()),
        }
    }

    /// Represent every item of a sequence with the child schema.
    pub fn to_representation(
        &self,
        instance: &Instance<'_>,
    ) -> Result<Vec<Value>, RepresentationError> {
        let one = |item: &Instance<'_>| self.child.to_representation(item).map(Value::Object);
        match instance {
            Instance::Objects(objects) => objects
                .iter()
                .map(|object| one(&Instance::Object(*object)))
                .collect(),
            Instance::Value(value) => match &**value {
                Value::Array(items) => items.iter().map(|item| one(&Instance::from(item))).collect(),
                other => {
                    tracing::warn!(
                        schema = %self.child.definition().name(),
                        found = type_name(other),
                        "list schema given a non-sequence instance; representing it as one item"
                    );
                    one(instance).map(|item| vec![item])
                }
            },
            Instance::Object(_) => one(instance).map(|item| vec![item]),
        }
    }

    /// Decode every item of [`data`](Self::data) into the declared message
    /// type.
    pub fn messages<M: Message>(&self) -> Result<Vec<M>, SchemaError> {
        check_message_type::<M>(self.child.definition())?;
        match self.data()? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| M::from_representation(item).map_err(SchemaError::from))
                .collect(),
            other => Ok(vec![M::from_representation(other)?]),
        }
    }
}

impl Serializer for ListSchema<'_> {
    fn is_valid(&self) -> bool {
        ListSchema::is_valid(self)
    }

    fn errors(&self) -> Result<Option<&ErrorDetail>, SchemaError> {
        ListSchema::errors(self)
    }

    fn validated_data(&self) -> Result<&Value, SchemaError> {
        ListSchema::validated_data(self)
    }

    fn data(&self) -> Result<Value, SchemaError> {
        ListSchema::data(self)
    }
}
