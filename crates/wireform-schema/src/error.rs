//! # Error Types — Schema Errors
//!
//! Three families of failure leave a schema:
//!
//! - [`ConfigError`]: programmer errors. Raised when a definition is built
//!   (duplicate fields, redundant sources, unresolvable methods) or when a
//!   surface that needs configuration is first touched (a message target
//!   that was never declared). Never a per-request failure.
//! - [`ValidationError`]: the recoverable, aggregated error tree of a
//!   rejected payload.
//! - [`RepresentationError`]: a model instance that cannot be represented,
//!   e.g. a required attribute that does not exist.
//!
//! [`SchemaError`] unifies them for the bound-schema surface and implements
//! the RPC status contract so request handlers can forward it directly.

use thiserror::Error;

use wireform_core::{LookupError, RpcStatus, StatusCode, ValidationError};
use wireform_validators::ValidatorConfigError;

/// A schema definition or engine configuration is wrong.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two fields of one definition share a name.
    #[error("field `{field}` is declared twice in schema `{schema}`")]
    DuplicateField {
        /// Schema being built.
        schema: String,
        /// The repeated field name.
        field: String,
    },

    /// A field names its own name as its source.
    #[error(
        "it is redundant to specify source `{field}` on field `{field}` in schema `{schema}`, \
         because it is the same as the field name"
    )]
    RedundantSource {
        /// Schema being built.
        schema: String,
        /// The field.
        field: String,
    },

    /// A method field names its default method explicitly.
    #[error(
        "it is redundant to specify method `{method}` on field `{field}` in schema `{schema}`, \
         because it is the same as the default method name"
    )]
    RedundantMethodName {
        /// Schema being built.
        schema: String,
        /// The field.
        field: String,
        /// The redundant method name.
        method: String,
    },

    /// A method field refers to a method that was never registered.
    #[error("schema `{schema}` has no method `{method}` for field `{field}`")]
    MissingMethod {
        /// Schema being built.
        schema: String,
        /// The field.
        field: String,
        /// The method that could not be found.
        method: String,
    },

    /// A message was requested from a schema that declares no target type.
    #[error("schema `{schema}` does not declare a message type")]
    MissingMessageType {
        /// The schema.
        schema: String,
    },

    /// A message of one type was requested from a schema targeting another.
    #[error("schema `{schema}` targets message `{declared}`, not `{requested}`")]
    MessageTypeMismatch {
        /// The schema.
        schema: String,
        /// Declared target type.
        declared: String,
        /// Requested type.
        requested: String,
    },

    /// A UTC offset could not be parsed.
    #[error("invalid timezone offset `{0}`; expected `UTC`, `Z` or `+HH:MM`")]
    InvalidTimezone(String),

    /// A declarative descriptor uses a field kind that cannot be described
    /// declaratively.
    #[error("field `{field}` of schema `{schema}`: {reason}")]
    Descriptor {
        /// Schema being described.
        schema: String,
        /// The offending field.
        field: String,
        /// What is wrong.
        reason: String,
    },

    /// A validator could not be constructed.
    #[error("validator error: {0}")]
    Validator(#[from] ValidatorConfigError),

    /// YAML parsing failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration or descriptor file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A model instance cannot be represented.
#[derive(Error, Debug)]
pub enum RepresentationError {
    /// A required field's source path does not exist on the instance.
    #[error(
        "got {source} when attempting to get a value for field `{field}` on schema `{schema}`; \
         the field might be named incorrectly and not match any attribute or key on the instance"
    )]
    MissingAttribute {
        /// The schema.
        schema: String,
        /// The field.
        field: String,
        /// The failed lookup.
        #[source]
        source: LookupError,
    },

    /// An integer field was handed a number outside `i64` and `u64`.
    #[error("integer {value} is outside the representable range")]
    IntegerOutOfRange {
        /// The offending value, as JSON.
        value: String,
    },

    /// A method field or post-process hook rejected the value.
    #[error("field `{field}` could not be represented: {source}")]
    Hook {
        /// The field.
        field: String,
        /// The error raised by the hook.
        #[source]
        source: ValidationError,
    },
}

/// Everything a bound schema can fail with.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The definition or configuration is wrong.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The payload was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The instance could not be represented.
    #[error("representation error: {0}")]
    Representation(#[from] RepresentationError),

    /// The representation could not be decoded into the target message.
    #[error("message decoding failed: {0}")]
    Message(#[from] serde_json::Error),

    /// A result was read before the payload was validated.
    #[error("you must call `is_valid()` before accessing `{accessed}`")]
    NotValidated {
        /// The accessor that was called.
        accessed: &'static str,
    },
}

impl RpcStatus for SchemaError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(err) => err.status(),
            _ => StatusCode::Internal,
        }
    }

    fn details(&self) -> String {
        match self {
            Self::Validation(err) => err.details(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_invalid_argument() {
        let err: SchemaError = ValidationError::message("required", "This field is required.").into();
        assert_eq!(err.status(), StatusCode::InvalidArgument);
        assert_eq!(err.details(), r#"["This field is required."]"#);
    }

    #[test]
    fn programmer_errors_are_internal() {
        let err: SchemaError = ConfigError::MissingMessageType {
            schema: "User".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::Internal);
        assert!(err.details().contains("does not declare a message type"));
    }
}
