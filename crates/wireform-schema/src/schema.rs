//! # Bound Schemas
//!
//! A [`Schema`] is one use of a [`SchemaDef`]: a payload to validate, an
//! instance to represent, or both, plus the call's partial flag and context.
//! It owns its own copy of the bound fields and its own outcome, so any
//! number of schemas over the same definition can run concurrently.
//!
//! ## Lifecycle
//!
//! ```text
//! Unbound ── fields() ──▶ Bound ── is_valid() ──▶ Valid | Invalid
//! ```
//!
//! The outcome is memoized: calling [`Schema::is_valid`] again returns the
//! cached result without re-running the pipeline.

use std::cell::OnceCell;
use std::sync::Arc;

use serde_json::{Map, Value};

use wireform_core::{ErrorDetail, Instance, ValidationError};

use crate::definition::{schema_failure, BoundFields, SchemaDef};
use crate::error::{ConfigError, RepresentationError, SchemaError};
use crate::field::{Context, Ctx};
use crate::list::ListSchema;
use crate::message::Message;

/// Common read surface of [`Schema`] and [`ListSchema`].
pub trait Serializer {
    /// Validate the request data once; true when it passed.
    fn is_valid(&self) -> bool;

    /// The error tree, `None` when valid.
    fn errors(&self) -> Result<Option<&ErrorDetail>, SchemaError>;

    /// The validated tree; empty when invalid.
    fn validated_data(&self) -> Result<&Value, SchemaError>;

    /// The representation of the instance, else the validated data, else
    /// the initial values.
    fn data(&self) -> Result<Value, SchemaError>;
}

/// Where a bound schema is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Nothing has been touched yet.
    Unbound,
    /// Fields are bound; no validation has run.
    Bound,
    /// Validation passed.
    Valid,
    /// Validation failed.
    Invalid,
}

/// Memoized result of validating a request payload.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub validated: Value,
    pub errors: Option<ErrorDetail>,
}

impl Outcome {
    pub(crate) fn from_result(result: Result<Value, ValidationError>, empty: Value) -> Self {
        match result {
            Ok(validated) => Self {
                validated,
                errors: None,
            },
            Err(err) => Self {
                validated: empty,
                errors: Some(err.into_detail()),
            },
        }
    }
}

/// One use of a schema definition.
pub struct Schema<'a> {
    def: Arc<SchemaDef>,
    instance: Option<Instance<'a>>,
    request_data: Option<Value>,
    partial: bool,
    context: Context,
    fields: OnceCell<BoundFields>,
    outcome: OnceCell<Outcome>,
}

impl<'a> Schema<'a> {
    /// A schema over `def` with nothing bound yet.
    pub fn new(def: &Arc<SchemaDef>) -> Self {
        Self {
            def: Arc::clone(def),
            instance: None,
            request_data: None,
            partial: false,
            context: Context::new(),
            fields: OnceCell::new(),
            outcome: OnceCell::new(),
        }
    }

    /// A list schema whose items are validated by a schema over `def`.
    pub fn many(def: &Arc<SchemaDef>) -> ListSchema<'a> {
        ListSchema::new(Self::new(def))
    }

    /// The payload to validate.
    pub fn request_data(mut self, data: Value) -> Self {
        self.request_data = Some(data);
        self
    }

    /// The model instance to represent.
    pub fn instance(mut self, instance: impl Into<Instance<'a>>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Skip absent fields instead of applying defaults or failing `required`.
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Values passed to hooks and method fields.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// The definition.
    pub fn definition(&self) -> &Arc<SchemaDef> {
        &self.def
    }

    /// Whether partial mode is on.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// The call context.
    pub fn context_values(&self) -> &Context {
        &self.context
    }

    /// This schema's own copy of the bound fields, made on first use.
    pub fn fields(&self) -> &BoundFields {
        self.fields.get_or_init(|| self.def.fields().clone())
    }

    /// Lifecycle state.
    pub fn state(&self) -> SchemaState {
        match (self.outcome.get(), self.fields.get()) {
            (Some(outcome), _) if outcome.errors.is_none() => SchemaState::Valid,
            (Some(_), _) => SchemaState::Invalid,
            (None, Some(_)) => SchemaState::Bound,
            (None, None) => SchemaState::Unbound,
        }
    }

    pub(crate) fn ctx(&self) -> Ctx<'_> {
        Ctx {
            partial: self.partial,
            context: &self.context,
            config: self.def.config(),
        }
    }

    /// Validate one payload with this schema's bindings. Absent data is an
    /// empty mapping; null is rejected.
    pub(crate) fn run_validation(
        &self,
        data: Option<&Value>,
        ctx: Ctx<'_>,
    ) -> Result<Value, ValidationError> {
        match data {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Null) => Err(schema_failure(ctx.config, "null", &[])),
            Some(data) => self.def.validate_in(self.fields(), data, ctx),
        }
    }

    fn outcome(&self) -> &Outcome {
        self.outcome.get_or_init(|| {
            let result = self.run_validation(self.request_data.as_ref(), self.ctx());
            Outcome::from_result(result, Value::Object(Map::new()))
        })
    }

    /// Validate the request data once; true when it passed.
    pub fn is_valid(&self) -> bool {
        self.outcome().errors.is_none()
    }

    /// Validate and return the validated tree, or the error tree as an error.
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

    /// The validated tree; an empty mapping when invalid.
    pub fn validated_data(&self) -> Result<&Value, SchemaError> {
        self.outcome
            .get()
            .map(|outcome| &outcome.validated)
            .ok_or(SchemaError::NotValidated {
                accessed: "validated_data",
            })
    }

    /// The representation of the instance, else the validated data, else
    /// the initial values.
    pub fn data(&self) -> Result<Value, SchemaError> {
        if self.request_data.is_some() && self.outcome.get().is_none() {
            return Err(SchemaError::NotValidated { accessed: "data" });
        }
        let outcome = self.outcome.get();
        let clean = outcome.map_or(true, |o| o.errors.is_none());
        if let (Some(instance), true) = (&self.instance, clean) {
            return Ok(Value::Object(self.to_representation(instance)?));
        }
        match outcome {
            Some(outcome) if outcome.errors.is_none() => Ok(outcome.validated.clone()),
            _ => Ok(self.initial()),
        }
    }

    /// Initial values: the fields present in the request data when there is
    /// any, otherwise each field's initial value.
    pub fn initial(&self) -> Value {
        let fields = self.fields();
        match &self.request_data {
            Some(Value::Object(data)) => Value::Object(
                fields
                    .keys()
                    .filter_map(|name| data.get(name).map(|v| (name.clone(), v.clone())))
                    .collect(),
            ),
            Some(_) => Value::Object(Map::new()),
            None => Value::Object(
                fields
                    .iter()
                    .map(|(name, bound)| (name.clone(), bound.field().initial_value()))
                    .collect(),
            ),
        }
    }

    /// Convert a payload directly, without touching the memoized outcome.
    pub fn to_internal_value(&self, data: &Value) -> Result<Value, ValidationError> {
        self.def.validate_in(self.fields(), data, self.ctx())
    }

    /// Represent any instance with this schema's bindings.
    pub fn to_representation(
        &self,
        instance: &Instance<'_>,
    ) -> Result<Map<String, Value>, RepresentationError> {
        self.def.represent_in(self.fields(), instance, self.ctx())
    }

    /// Decode [`data`](Self::data) into the declared message type.
    pub fn message<M: Message>(&self) -> Result<M, SchemaError> {
        check_message_type::<M>(&self.def)?;
        Ok(M::from_representation(self.data()?)?)
    }
}

/// Fails unless `def` targets `M`.
pub(crate) fn check_message_type<M: Message>(def: &SchemaDef) -> Result<(), ConfigError> {
    match def.message_type() {
        None => Err(ConfigError::MissingMessageType {
            schema: def.name().to_string(),
        }),
        Some(declared) if declared != M::TYPE_NAME => Err(ConfigError::MessageTypeMismatch {
            schema: def.name().to_string(),
            declared: declared.to_string(),
            requested: M::TYPE_NAME.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

impl Serializer for Schema<'_> {
    fn is_valid(&self) -> bool {
        Schema::is_valid(self)
    }

    fn errors(&self) -> Result<Option<&ErrorDetail>, SchemaError> {
        Schema::errors(self)
    }

    fn validated_data(&self) -> Result<&Value, SchemaError> {
        Schema::validated_data(self)
    }

    fn data(&self) -> Result<Value, SchemaError> {
        Schema::data(self)
    }
}
