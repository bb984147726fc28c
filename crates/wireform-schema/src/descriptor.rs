//! # Schema Descriptors — Declarative Schemas from YAML
//!
//! Schemas can be declared in code with [`SchemaBuilder`](crate::SchemaBuilder)
//! or described in YAML and built at load time. A descriptor covers every
//! field type except method fields, which need code.
//!
//! ```yaml
//! name: User
//! message_type: user.v1.User
//! fields:
//!   - name: email
//!     type: char
//!     required: true
//!     validators:
//!       - kind: email
//!   - name: age
//!     type: integer
//!     min_value: 0
//!   - name: tags
//!     type: list
//!     child: { type: char, max_length: 16 }
//! ```
//!
//! A document may also hold several schemas under `schemas:`. They are
//! built in order, and a `nested` field may refer to an earlier schema by
//! name instead of declaring its fields inline.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use wireform_core::Choice;
use wireform_validators::{
    validate_integer, DecimalValidator, EmailValidator, FileExtensionValidator,
    IdentifierProtocol, IdentifierValidator, IpAddressValidator, IpProtocol, MaxLengthValidator,
    MaxValueValidator, MinLengthValidator, MinValueValidator, PasswordLevel, PasswordValidator,
    PhoneValidator, RegexValidator, UrlValidator, Validator,
};

use crate::config::{EngineConfig, Offset};
use crate::definition::SchemaDef;
use crate::error::ConfigError;
use crate::field::{DefaultValue, Field};
use crate::fields::{
    BooleanField, CharField, ChoiceField, FloatField, IntegerField, ListField, NestedField,
    NullBooleanField, RawField, TemporalField, TemporalKind,
};

/// Deserializes any present value, explicit null included, as `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// One schema.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDescriptor {
    /// Schema name, used in errors and logs.
    pub name: String,
    /// Target message type for the message bridge.
    #[serde(default)]
    pub message_type: Option<String>,
    /// Declared fields in order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// A document of several schemas.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSet {
    /// Schemas in build order.
    pub schemas: Vec<SchemaDescriptor>,
}

/// A field: options shared by every type plus the type-specific part.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Field name. Ignored for list children.
    #[serde(default)]
    pub name: String,
    /// Shared options.
    #[serde(flatten)]
    pub common: CommonOptions,
    /// Type and type-specific options.
    #[serde(flatten)]
    pub kind: KindDescriptor,
}

/// Options every field type accepts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommonOptions {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub allow_null: Option<bool>,
    /// Explicit `null` is a null default, not an absent one.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub initial: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub error_messages: IndexMap<String, String>,
    #[serde(default)]
    pub validators: Vec<ValidatorDescriptor>,
}

/// Field types, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindDescriptor {
    Boolean,
    NullBoolean,
    Char {
        #[serde(default)]
        allow_blank: bool,
        #[serde(default)]
        trim_whitespace: Option<bool>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
    Integer {
        #[serde(default)]
        min_value: Option<Value>,
        #[serde(default)]
        max_value: Option<Value>,
    },
    Float {
        #[serde(default)]
        min_value: Option<Value>,
        #[serde(default)]
        max_value: Option<Value>,
    },
    #[serde(rename = "datetime")]
    DateTime(TemporalDescriptor),
    Date(TemporalDescriptor),
    Time(TemporalDescriptor),
    Choice {
        choices: Vec<Choice>,
        #[serde(default)]
        allow_blank: bool,
    },
    List {
        #[serde(default)]
        child: Option<Box<FieldDescriptor>>,
        #[serde(default)]
        allow_empty: Option<bool>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
    Raw,
    Nested {
        /// An earlier schema of the same document.
        #[serde(default)]
        schema: Option<String>,
        /// Inline fields, used when `schema` is not given.
        #[serde(default)]
        fields: Vec<FieldDescriptor>,
        #[serde(default)]
        many: bool,
        #[serde(default)]
        allow_empty: Option<bool>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
    /// Accepted so the error names the problem; never buildable.
    Method,
}

/// Options of the temporal field types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemporalDescriptor {
    /// `strftime` pattern; explicit null passes values through.
    #[serde(default, deserialize_with = "present")]
    pub output_format: Option<Option<String>>,
    #[serde(default)]
    pub input_offset: Option<Offset>,
    #[serde(default)]
    pub output_offset: Option<Offset>,
}

/// A validator and its optional message override.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorDescriptor {
    #[serde(flatten)]
    pub kind: ValidatorKind,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validator types, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorKind {
    Regex {
        pattern: String,
        #[serde(default)]
        inverse: bool,
        #[serde(default)]
        case_insensitive: bool,
    },
    Integer,
    MinValue {
        limit: Value,
    },
    MaxValue {
        limit: Value,
    },
    MinLength {
        limit: usize,
    },
    MaxLength {
        limit: usize,
    },
    Url {
        #[serde(default)]
        schemes: Option<Vec<String>>,
    },
    Email,
    Ip {
        #[serde(default)]
        protocol: IpProtocol,
    },
    Phone {
        #[serde(default)]
        pattern: Option<String>,
    },
    Identifier {
        protocol: IdentifierProtocol,
    },
    Password {
        level: PasswordLevel,
        #[serde(default)]
        pattern: Option<String>,
    },
    Decimal {
        #[serde(default)]
        max_digits: Option<u64>,
        #[serde(default)]
        decimal_places: Option<u64>,
    },
    FileExtension {
        #[serde(default)]
        allowed: Option<Vec<String>>,
    },
}

/// Where a field is being built, for error reporting and name lookup.
struct Scope<'s> {
    schema: &'s str,
    field: &'s str,
    config: &'s Arc<EngineConfig>,
    known: &'s IndexMap<String, Arc<SchemaDef>>,
}

impl Scope<'_> {
    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Descriptor {
            schema: self.schema.to_string(),
            field: self.field.to_string(),
            reason: reason.into(),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl SchemaDescriptor {
    /// Parse one schema from YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse one schema.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&read(path)?)
    }

    /// Build the definition. Nested fields must declare their fields inline.
    pub fn build(&self, config: Arc<EngineConfig>) -> Result<Arc<SchemaDef>, ConfigError> {
        self.build_with(&config, &IndexMap::new())
    }

    fn build_with(
        &self,
        config: &Arc<EngineConfig>,
        known: &IndexMap<String, Arc<SchemaDef>>,
    ) -> Result<Arc<SchemaDef>, ConfigError> {
        let mut builder = SchemaDef::builder(self.name.as_str()).config(Arc::clone(config));
        if let Some(message_type) = &self.message_type {
            builder = builder.message_type(message_type.as_str());
        }
        for descriptor in &self.fields {
            let scope = Scope {
                schema: &self.name,
                field: &descriptor.name,
                config,
                known,
            };
            if descriptor.name.is_empty() {
                return Err(scope.error("field has no name"));
            }
            builder = builder.field(descriptor.name.as_str(), descriptor.to_field(&scope)?);
        }
        let def = builder.build()?;
        tracing::debug!(
            schema = %def.name(),
            fields = def.fields().len(),
            "schema built from descriptor"
        );
        Ok(def)
    }
}

impl SchemaSet {
    /// Parse a document holding one schema or a `schemas:` list.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_yaml::from_str(text)?;
        if document.get("schemas").is_some() {
            Ok(serde_json::from_value(document).map_err(yaml_shape)?)
        } else {
            let one: SchemaDescriptor = serde_json::from_value(document).map_err(yaml_shape)?;
            Ok(Self { schemas: vec![one] })
        }
    }

    /// Read and parse a document.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&read(path)?)
    }

    /// Build every schema in order, keyed by name.
    pub fn build(
        &self,
        config: Arc<EngineConfig>,
    ) -> Result<IndexMap<String, Arc<SchemaDef>>, ConfigError> {
        let mut built: IndexMap<String, Arc<SchemaDef>> = IndexMap::new();
        for descriptor in &self.schemas {
            let def = descriptor.build_with(&config, &built)?;
            built.insert(descriptor.name.clone(), def);
        }
        Ok(built)
    }
}

/// Reports a shape error found after YAML parsing through the YAML error
/// type, so callers see one error kind for a malformed document.
fn yaml_shape(err: serde_json::Error) -> ConfigError {
    use serde::de::Error as _;
    ConfigError::Yaml(serde_yaml::Error::custom(err.to_string()))
}

impl FieldDescriptor {
    fn to_field(&self, scope: &Scope<'_>) -> Result<Field, ConfigError> {
        let mut field = self.kind.to_field(scope)?;
        self.common.apply(&mut field, scope)?;
        Ok(field)
    }
}

impl CommonOptions {
    fn apply(&self, field: &mut Field, scope: &Scope<'_>) -> Result<(), ConfigError> {
        let mut validators = Vec::with_capacity(self.validators.len());
        for descriptor in &self.validators {
            validators.push(descriptor.build(scope)?);
        }
        let options = field.options_mut();
        if let Some(required) = self.required {
            options.required = required;
        }
        if let Some(allow_null) = self.allow_null {
            options.allow_null = allow_null;
        }
        if let Some(default) = &self.default {
            options.default = Some(DefaultValue::Value(default.clone()));
        }
        if let Some(initial) = &self.initial {
            options.initial = Some(DefaultValue::Value(initial.clone()));
        }
        if let Some(source) = &self.source {
            options.source = Some(source.clone());
        }
        if let Some(help_text) = &self.help_text {
            options.help_text = Some(help_text.clone());
        }
        options.error_messages.extend(
            self.error_messages
                .iter()
                .map(|(code, template)| (code.clone(), template.clone())),
        );
        options.validators.extend(validators);
        Ok(())
    }
}

impl KindDescriptor {
    fn to_field(&self, scope: &Scope<'_>) -> Result<Field, ConfigError> {
        let field = match self {
            Self::Boolean => BooleanField::new().into(),
            Self::NullBoolean => NullBooleanField::new().into(),
            Self::Char {
                allow_blank,
                trim_whitespace,
                min_length,
                max_length,
            } => {
                let mut field = CharField::new().allow_blank(*allow_blank);
                if let Some(trim) = trim_whitespace {
                    field = field.trim_whitespace(*trim);
                }
                if let Some(limit) = min_length {
                    field = field.min_length(*limit);
                }
                if let Some(limit) = max_length {
                    field = field.max_length(*limit);
                }
                field.into()
            }
            Self::Integer {
                min_value,
                max_value,
            } => {
                let mut field = IntegerField::new();
                if let Some(limit) = max_value {
                    field = field.max_value(limit.clone());
                }
                if let Some(limit) = min_value {
                    field = field.min_value(limit.clone());
                }
                field.into()
            }
            Self::Float {
                min_value,
                max_value,
            } => {
                let mut field = FloatField::new();
                if let Some(limit) = max_value {
                    field = field.max_value(limit.clone());
                }
                if let Some(limit) = min_value {
                    field = field.min_value(limit.clone());
                }
                field.into()
            }
            Self::DateTime(options) => options.to_field(TemporalKind::DateTime).into(),
            Self::Date(options) => options.to_field(TemporalKind::Date).into(),
            Self::Time(options) => options.to_field(TemporalKind::Time).into(),
            Self::Choice {
                choices,
                allow_blank,
            } => ChoiceField::new(choices.iter().cloned())
                .allow_blank(*allow_blank)
                .into(),
            Self::List {
                child,
                allow_empty,
                min_length,
                max_length,
            } => {
                let mut field = match child {
                    Some(child) => ListField::of(child.to_field(scope)?),
                    None => ListField::new(),
                };
                if let Some(allow_empty) = allow_empty {
                    field = field.allow_empty(*allow_empty);
                }
                if let Some(limit) = min_length {
                    field = field.min_length(*limit);
                }
                if let Some(limit) = max_length {
                    field = field.max_length(*limit);
                }
                field.into()
            }
            Self::Raw => RawField::new().into(),
            Self::Nested {
                schema,
                fields,
                many,
                allow_empty,
                min_length,
                max_length,
            } => {
                let def = match schema {
                    Some(name) => scope
                        .known
                        .get(name)
                        .cloned()
                        .ok_or_else(|| scope.error(format!("unknown nested schema `{name}`")))?,
                    None if fields.is_empty() => {
                        return Err(scope.error("nested field needs `schema` or `fields`"))
                    }
                    None => SchemaDescriptor {
                        name: format!("{}.{}", scope.schema, scope.field),
                        message_type: None,
                        fields: fields.clone(),
                    }
                    .build_with(scope.config, scope.known)?,
                };
                let mut field = if *many {
                    NestedField::many(&def)
                } else {
                    NestedField::new(&def)
                };
                if let Some(allow_empty) = allow_empty {
                    field = field.allow_empty(*allow_empty);
                }
                if let Some(limit) = min_length {
                    field = field.min_length(*limit);
                }
                if let Some(limit) = max_length {
                    field = field.max_length(*limit);
                }
                field.into()
            }
            Self::Method => {
                return Err(scope.error("method fields must be declared in code"));
            }
        };
        Ok(field)
    }
}

impl TemporalDescriptor {
    fn to_field(&self, kind: TemporalKind) -> TemporalField {
        let mut field = TemporalField::new(kind);
        if let Some(format) = &self.output_format {
            field = field.output_format(format.clone());
        }
        if let Some(offset) = self.input_offset {
            field = field.input_offset(offset);
        }
        if let Some(offset) = self.output_offset {
            field = field.output_offset(offset);
        }
        field
    }
}

/// Applies an optional message override to a validator.
macro_rules! with_message {
    ($validator:expr, $message:expr) => {{
        let validator = $validator;
        match $message {
            Some(m) => validator.with_message(m),
            None => validator,
        }
    }};
}

impl ValidatorDescriptor {
    fn build(&self, scope: &Scope<'_>) -> Result<Arc<dyn Validator>, ConfigError> {
        let message = self.message.clone();
        let fixed_message = |name: &str| {
            scope.error(format!(
                "the {name} validator takes no `message`; override its codes with `error_messages`"
            ))
        };
        let validator: Arc<dyn Validator> = match &self.kind {
            ValidatorKind::Regex {
                pattern,
                inverse,
                case_insensitive,
            } => {
                let mut v = if *case_insensitive {
                    RegexValidator::case_insensitive(pattern)?
                } else {
                    RegexValidator::new(pattern)?
                };
                if *inverse {
                    v = v.inverse();
                }
                Arc::new(with_message!(v, message))
            }
            ValidatorKind::Integer => {
                if message.is_some() {
                    return Err(fixed_message("integer"));
                }
                Arc::new(validate_integer)
            }
            ValidatorKind::MinValue { limit } => {
                Arc::new(with_message!(MinValueValidator::new(limit.clone()), message))
            }
            ValidatorKind::MaxValue { limit } => {
                Arc::new(with_message!(MaxValueValidator::new(limit.clone()), message))
            }
            ValidatorKind::MinLength { limit } => {
                Arc::new(with_message!(MinLengthValidator::new(*limit), message))
            }
            ValidatorKind::MaxLength { limit } => {
                Arc::new(with_message!(MaxLengthValidator::new(*limit), message))
            }
            ValidatorKind::Url { schemes } => {
                let v = match schemes {
                    Some(schemes) => UrlValidator::new().with_schemes(schemes.iter().cloned()),
                    None => UrlValidator::new(),
                };
                Arc::new(with_message!(v, message))
            }
            ValidatorKind::Email => Arc::new(with_message!(EmailValidator::new(), message)),
            ValidatorKind::Ip { protocol } => {
                Arc::new(with_message!(IpAddressValidator::new(*protocol), message))
            }
            ValidatorKind::Phone { pattern } => {
                let v = match pattern {
                    Some(pattern) => PhoneValidator::new().with_pattern(pattern)?,
                    None => PhoneValidator::new(),
                };
                Arc::new(with_message!(v, message))
            }
            ValidatorKind::Identifier { protocol } => {
                Arc::new(with_message!(IdentifierValidator::new(*protocol), message))
            }
            ValidatorKind::Password { level, pattern } => {
                let mut v = PasswordValidator::new(*level);
                if pattern.is_some() && *level != PasswordLevel::Custom {
                    return Err(scope.error("a password `pattern` needs `level: custom`"));
                }
                if let Some(pattern) = pattern {
                    v = v.with_pattern(pattern)?;
                }
                Arc::new(with_message!(v, message))
            }
            ValidatorKind::Decimal {
                max_digits,
                decimal_places,
            } => {
                if message.is_some() {
                    return Err(fixed_message("decimal"));
                }
                Arc::new(DecimalValidator::new(*max_digits, *decimal_places))
            }
            ValidatorKind::FileExtension { allowed } => {
                let v = match allowed {
                    Some(allowed) => FileExtensionValidator::new(allowed.iter().cloned()),
                    None => FileExtensionValidator::any(),
                };
                Arc::new(with_message!(v, message))
            }
        };
        Ok(validator)
    }
}
