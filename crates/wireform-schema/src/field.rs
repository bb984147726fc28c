//! # Fields — Typed Leaf Transforms
//!
//! A field converts one untrusted input value into its validated internal
//! form (`to_internal_value`) and one model value back into its wire form
//! (`to_representation`). Around the type-specific conversion, every field
//! applies the same contract:
//!
//! 1. **Absent values.** In partial mode the field is skipped. Otherwise a
//!    required field fails with `required`, and an optional field yields its
//!    default, or is skipped when it has none.
//! 2. **Null values.** A non-nullable field fails with `null`. A nullable
//!    field yields null without running conversion or validators, except
//!    for wildcard-bound fields, which still see the null.
//! 3. **Conversion.** Type-specific; malformed input fails with a typed
//!    message, never a generic one.
//! 4. **Validators.** Every attached validator runs, in declaration order,
//!    and all failures are reported together.
//!
//! The outcome of one field is a [`Step`]: a value to write, or a skip.
//! Skips never reach the error tree or the output tree.
//!
//! ## Messages
//!
//! A failure kind is rendered from the first template found in: the
//! field's own overrides, the engine configuration, the field type's
//! defaults, the common defaults (`required`, `null`). Unknown kinds render
//! as `Invalid Argument`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use wireform_core::{render, Instance, ValidationError};
use wireform_validators::{run_validators, Validator};

use crate::config::EngineConfig;
use crate::error::RepresentationError;
use crate::fields::{
    BooleanField, CharField, ChoiceField, FloatField, IntegerField, ListField, MethodField,
    NestedField, NullBooleanField, RawField, TemporalField,
};

/// Caller-supplied values available to hooks and method fields.
pub type Context = Map<String, Value>;

/// Message used when no template exists for a failure kind.
pub const FALLBACK_MESSAGE: &str = "Invalid Argument";

const COMMON_MESSAGES: &[(&str, &str)] = &[
    ("required", "This field is required."),
    ("null", "This field may not be null."),
];

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The validated value to write into the output tree.
    Value(Value),
    /// The field contributes nothing.
    Skip,
}

impl Step {
    /// The value, if the field was not skipped.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Skip => None,
        }
    }
}

/// A default or initial value: fixed, or produced on demand.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Value(Value),
    /// A producer called each time the value is needed.
    Callable(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// The value, calling the producer if there is one.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Callable(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// Options shared by every field type.
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub(crate) required: bool,
    pub(crate) allow_null: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) initial: Option<DefaultValue>,
    pub(crate) source: Option<String>,
    pub(crate) validators: Vec<Arc<dyn Validator>>,
    /// Validators implied by type-specific limits; run after `validators`.
    pub(crate) implied: Vec<Arc<dyn Validator>>,
    pub(crate) error_messages: IndexMap<String, String>,
    pub(crate) help_text: Option<String>,
}

impl FieldOptions {
    /// Whether an absent value is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether null is accepted.
    pub fn allows_null(&self) -> bool {
        self.allow_null
    }

    /// Declared source path, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Help text for documentation surfaces.
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    /// Whether a default is configured.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn is_wildcard(&self) -> bool {
        self.source.as_deref() == Some("*")
    }

    pub(crate) fn all_validators(&self) -> impl Iterator<Item = &dyn Validator> {
        self.validators
            .iter()
            .chain(self.implied.iter())
            .map(|v| v.as_ref())
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("required", &self.required)
            .field("allow_null", &self.allow_null)
            .field("default", &self.default)
            .field("source", &self.source)
            .field("validators", &(self.validators.len() + self.implied.len()))
            .finish_non_exhaustive()
    }
}

/// Builder methods common to every field type.
pub trait DeclareField: Sized {
    /// Mutable access to the shared options.
    fn options_mut(&mut self) -> &mut FieldOptions;

    /// Make an absent value an error.
    fn required(mut self, required: bool) -> Self {
        self.options_mut().required = required;
        self
    }

    /// Accept explicit null.
    fn allow_null(mut self, allow_null: bool) -> Self {
        self.options_mut().allow_null = allow_null;
        self
    }

    /// Value used when the input omits the field.
    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Producer called whenever the input omits the field.
    fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options_mut().default = Some(DefaultValue::Callable(Arc::new(producer)));
        self
    }

    /// Value reported by an unbound schema's `data`.
    fn initial(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().initial = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Producer for the initial value.
    fn initial_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options_mut().initial = Some(DefaultValue::Callable(Arc::new(producer)));
        self
    }

    /// Dotted source path, or `*` for the whole object.
    fn source(mut self, source: impl Into<String>) -> Self {
        self.options_mut().source = Some(source.into());
        self
    }

    /// Append a validator.
    fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.options_mut().validators.push(Arc::new(validator));
        self
    }

    /// Append an already shared validator.
    fn shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.options_mut().validators.push(validator);
        self
    }

    /// Override the message template of a failure kind.
    fn error_message(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        self.options_mut()
            .error_messages
            .insert(code.into(), template.into());
        self
    }

    /// Attach help text.
    fn help_text(mut self, text: impl Into<String>) -> Self {
        self.options_mut().help_text = Some(text.into());
        self
    }
}

/// Per-call state threaded through a validation or representation pass.
#[derive(Clone, Copy)]
pub(crate) struct Ctx<'c> {
    pub partial: bool,
    pub context: &'c Context,
    pub config: &'c EngineConfig,
}

/// Result of resolving absent and null input.
pub(crate) enum Presence<'v> {
    /// The field's outcome is already decided.
    Resolved(Step),
    /// Continue with conversion.
    Present(&'v Value),
}

/// Behaviour implemented by every concrete field type.
pub(crate) trait FieldBehavior {
    fn options(&self) -> &FieldOptions;

    /// Type-specific message templates by failure kind.
    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Initial value when neither the field nor the caller supplies one.
    fn type_initial(&self) -> Value {
        Value::Null
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError>;

    fn to_representation(
        &self,
        value: Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError>;

    fn message(&self, code: &str, ctx: Ctx<'_>) -> String {
        let options = self.options();
        options
            .error_messages
            .get(code)
            .or_else(|| ctx.config.messages.get(code))
            .cloned()
            .or_else(|| {
                self.default_messages()
                    .iter()
                    .chain(COMMON_MESSAGES)
                    .find(|(k, _)| *k == code)
                    .map(|(_, m)| m.to_string())
            })
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
    }

    fn fail(
        &self,
        code: &'static str,
        ctx: Ctx<'_>,
        params: &[(&str, &dyn fmt::Display)],
    ) -> ValidationError {
        ValidationError::message(code, render(&self.message(code, ctx), params))
    }

    fn validate_empty_values<'v>(
        &self,
        data: Option<&'v Value>,
        ctx: Ctx<'_>,
    ) -> Result<Presence<'v>, ValidationError> {
        let options = self.options();
        match data {
            None => {
                if ctx.partial {
                    return Ok(Presence::Resolved(Step::Skip));
                }
                if options.required {
                    return Err(self.fail("required", ctx, &[]));
                }
                Ok(Presence::Resolved(match &options.default {
                    Some(default) => Step::Value(default.resolve()),
                    None => Step::Skip,
                }))
            }
            Some(Value::Null) => {
                if !options.allow_null {
                    return Err(self.fail("null", ctx, &[]));
                }
                if options.is_wildcard() {
                    return Ok(Presence::Present(&Value::Null));
                }
                Ok(Presence::Resolved(Step::Value(Value::Null)))
            }
            Some(value) => Ok(Presence::Present(value)),
        }
    }

    fn run_validation(&self, data: Option<&Value>, ctx: Ctx<'_>) -> Result<Step, ValidationError> {
        let data = match self.validate_empty_values(data, ctx)? {
            Presence::Resolved(step) => return Ok(step),
            Presence::Present(data) => data,
        };
        let value = self.to_internal_value(data, ctx)?;
        run_validators(self.options().all_validators(), &value)?;
        Ok(Step::Value(value))
    }
}

/// Convert an instance to the JSON value a scalar field represents.
pub(crate) fn scalar_of(value: Instance<'_>, field: &'static str) -> Value {
    let type_name = value.type_name();
    match value.into_value() {
        Some(v) => v,
        None => {
            tracing::warn!(
                field,
                instance = %type_name,
                "object instance has no value form; representing as null"
            );
            Value::Null
        }
    }
}

/// Any field, as stored in a schema definition.
#[derive(Clone, Debug)]
pub enum Field {
    /// See [`BooleanField`].
    Boolean(BooleanField),
    /// See [`NullBooleanField`].
    NullBoolean(NullBooleanField),
    /// See [`CharField`].
    Char(CharField),
    /// See [`IntegerField`].
    Integer(IntegerField),
    /// See [`FloatField`].
    Float(FloatField),
    /// See [`TemporalField`].
    Temporal(TemporalField),
    /// See [`ChoiceField`].
    Choice(ChoiceField),
    /// See [`ListField`].
    List(ListField),
    /// See [`MethodField`].
    Method(MethodField),
    /// See [`RawField`].
    Raw(RawField),
    /// See [`NestedField`].
    Nested(NestedField),
}

macro_rules! dispatch {
    ($field:expr, $inner:ident => $body:expr) => {
        match $field {
            Field::Boolean($inner) => $body,
            Field::NullBoolean($inner) => $body,
            Field::Char($inner) => $body,
            Field::Integer($inner) => $body,
            Field::Float($inner) => $body,
            Field::Temporal($inner) => $body,
            Field::Choice($inner) => $body,
            Field::List($inner) => $body,
            Field::Method($inner) => $body,
            Field::Raw($inner) => $body,
            Field::Nested($inner) => $body,
        }
    };
}

macro_rules! into_field {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Field {
                fn from(field: $ty) -> Self {
                    Field::$variant(field)
                }
            }
        )*
    };
}

into_field!(
    Boolean(BooleanField),
    NullBoolean(NullBooleanField),
    Char(CharField),
    Integer(IntegerField),
    Float(FloatField),
    Temporal(TemporalField),
    Choice(ChoiceField),
    List(ListField),
    Method(MethodField),
    Raw(RawField),
    Nested(NestedField),
);

impl Field {
    /// Shared options.
    pub fn options(&self) -> &FieldOptions {
        dispatch!(self, f => f.options())
    }

    pub(crate) fn options_mut(&mut self) -> &mut FieldOptions {
        dispatch!(self, f => f.options_mut())
    }

    /// Short name of the field type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::NullBoolean(_) => "null_boolean",
            Self::Char(_) => "char",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Temporal(t) => t.kind().name(),
            Self::Choice(_) => "choice",
            Self::List(_) => "list",
            Self::Method(_) => "method",
            Self::Raw(_) => "raw",
            Self::Nested(_) => "nested",
        }
    }

    /// The value reported by an unbound schema.
    pub fn initial_value(&self) -> Value {
        match &self.options().initial {
            Some(initial) => initial.resolve(),
            None => dispatch!(self, f => f.type_initial()),
        }
    }

    /// Validate one input value outside any schema, with the default engine
    /// configuration. `None` is an absent value.
    pub fn run_validation(&self, data: Option<&Value>) -> Result<Step, ValidationError> {
        let config = EngineConfig::default();
        let context = Context::new();
        self.run_validation_in(
            data,
            Ctx {
                partial: false,
                context: &context,
                config: &config,
            },
        )
    }

    /// Represent one model value outside any schema.
    pub fn to_representation(&self, value: &Value) -> Result<Value, RepresentationError> {
        let config = EngineConfig::default();
        let context = Context::new();
        self.represent_in(
            Instance::from(value),
            Ctx {
                partial: false,
                context: &context,
                config: &config,
            },
        )
    }

    pub(crate) fn run_validation_in(
        &self,
        data: Option<&Value>,
        ctx: Ctx<'_>,
    ) -> Result<Step, ValidationError> {
        dispatch!(self, f => f.run_validation(data, ctx))
    }

    pub(crate) fn represent_in(
        &self,
        value: Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        if value.is_null() && !matches!(self, Self::Method(_)) {
            return Ok(Value::Null);
        }
        dispatch!(self, f => f.to_representation(value, ctx))
    }
}

/// Implements [`DeclareField`] and the options accessor for a field struct
/// with an `options: FieldOptions` member.
macro_rules! declare_field {
    ($ty:ty) => {
        impl $crate::field::DeclareField for $ty {
            fn options_mut(&mut self) -> &mut $crate::field::FieldOptions {
                &mut self.options
            }
        }
    };
}
pub(crate) use declare_field;
