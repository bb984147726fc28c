//! # wireform-schema — Declarative Schemas
//!
//! Declares payload schemas once and runs them in both directions:
//!
//! - **Validation** turns an untrusted request payload into a validated
//!   tree, or a nested error tree keyed by field name and list index.
//! - **Representation** turns a model instance (a JSON mapping, or any
//!   [`AttributeSource`]) into an output mapping.
//!
//! ## Building Blocks
//!
//! | Type | Role |
//! |---|---|
//! | [`Field`] and the [`fields`] catalogue | convert and check one value |
//! | [`SchemaDef`] / [`SchemaBuilder`] | immutable field set plus hooks |
//! | [`Schema`] | one call: payload, instance, partial flag, context |
//! | [`ListSchema`] | the same over a sequence |
//! | [`Message`] | bridge from a representation to a typed message |
//! | [`SchemaDescriptor`] | schemas described in YAML |
//!
//! ## Sharing
//!
//! A [`SchemaDef`] is built once, wrapped in `Arc`, and shared freely across
//! threads. Every [`Schema`] takes its own copy of the bound fields and
//! memoizes its own outcome, so concurrent calls never observe each other.
//!
//! ```
//! use serde_json::json;
//! use wireform_schema::{CharField, DeclareField, IntegerField, Schema, SchemaDef};
//!
//! let user = SchemaDef::builder("User")
//!     .field("name", CharField::new().required(true).max_length(32))
//!     .field("age", IntegerField::new().min_value(0))
//!     .build()
//!     .unwrap();
//!
//! let schema = Schema::new(&user).request_data(json!({"name": " Ada ", "age": "36"}));
//! assert!(schema.is_valid());
//! assert_eq!(schema.validated_data().unwrap(), &json!({"name": "Ada", "age": 36}));
//! ```

pub mod config;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod fields;
pub mod list;
pub mod message;
pub mod schema;

// Re-export primary types for ergonomic imports.
pub use config::{EngineConfig, Offset, TimezoneConfig};
pub use definition::{
    BoundField, BoundFields, CleanFieldFn, CleanFn, CleanRepresentationFn, PostProcessFn,
    SchemaBuilder, SchemaDef,
};
pub use descriptor::{FieldDescriptor, SchemaDescriptor, SchemaSet};
pub use error::{ConfigError, RepresentationError, SchemaError};
pub use field::{Context, DeclareField, DefaultValue, Field, FieldOptions, Step, FALLBACK_MESSAGE};
pub use fields::{
    BooleanField, CharField, ChoiceField, FloatField, IntegerField, ListField, MethodField,
    MethodFn, NestedField, NullBooleanField, RawField, TemporalField, TemporalKind,
};
pub use list::ListSchema;
pub use message::Message;
pub use schema::{Schema, SchemaState, Serializer};

pub use wireform_core::{
    Attribute, AttributeSource, Choice, ErrorDetail, Instance, RpcStatus, StatusCode,
    ValidationError,
};
