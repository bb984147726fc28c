//! # Schema Definitions
//!
//! A [`SchemaDef`] is the immutable, shareable description of one schema
//! type: its ordered fields bound to their names and source paths, the
//! functions backing method fields, cleaning hooks, schema-level validators,
//! the target message type and the engine configuration. It is built once
//! with a [`SchemaBuilder`] and shared behind an `Arc` by every bound
//! [`Schema`](crate::Schema), on any thread.
//!
//! ## Authoring checks
//!
//! [`SchemaBuilder::build`] rejects, before any payload is seen:
//! - a field name declared twice in one builder;
//! - a `source` equal to the field's own name;
//! - a method field naming its default method (`get_<field>`) explicitly;
//! - a method field whose method was never registered.
//!
//! ## Composition
//!
//! [`SchemaBuilder::extends`] starts from a parent definition: its fields
//! come first, in the parent's order, and a field declared again replaces
//! the inherited one in place. Hooks and methods are inherited unless
//! registered again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use wireform_core::{render, set_value, type_name, ErrorDetail, Instance, SourcePath, ValidationError};
use wireform_validators::{run_validators, Validator};

use crate::config::EngineConfig;
use crate::error::{ConfigError, RepresentationError};
use crate::field::{Context, Ctx, Field, Step, FALLBACK_MESSAGE};
use crate::fields::{default_method_name, MethodFn};
use crate::message::Message;

/// Rewrites one validated field value.
pub type CleanFieldFn = Arc<dyn Fn(Value, &Context) -> Result<Value, ValidationError> + Send + Sync>;

/// Rewrites one represented field value, given the whole instance.
pub type PostProcessFn =
    Arc<dyn Fn(&Instance<'_>, Value, &Context) -> Result<Value, ValidationError> + Send + Sync>;

/// Rewrites the whole validated mapping.
pub type CleanFn = Arc<
    dyn Fn(Map<String, Value>, &Context) -> Result<Map<String, Value>, ValidationError>
        + Send
        + Sync,
>;

/// Rewrites the whole represented mapping.
pub type CleanRepresentationFn =
    Arc<dyn Fn(Map<String, Value>, &Context) -> Map<String, Value> + Send + Sync>;

/// Default templates for schema-level failures.
const SCHEMA_MESSAGES: &[(&str, &str)] = &[
    ("invalid", "Invalid data. Expected a dictionary, but got {datatype}."),
    ("null", "This field may not be null."),
    (
        "not_a_list",
        "Expected a list of items but got type \"{input_type}\".",
    ),
    ("empty", "This list may not be empty."),
    (
        "unplaceable",
        "Cannot place this value at \"{source}\": expected a mapping, found {found}.",
    ),
];

/// Render a schema-level failure, honouring engine-wide overrides.
pub(crate) fn schema_failure(
    config: &EngineConfig,
    code: &'static str,
    params: &[(&str, &dyn fmt::Display)],
) -> ValidationError {
    let template = config
        .messages
        .get(code)
        .map(String::as_str)
        .or_else(|| {
            SCHEMA_MESSAGES
                .iter()
                .find(|(k, _)| *k == code)
                .map(|(_, m)| *m)
        })
        .unwrap_or(FALLBACK_MESSAGE);
    ValidationError::message(code, render(template, params))
}

/// A field bound to its name and resolved source path.
#[derive(Debug, Clone)]
pub struct BoundField {
    name: String,
    source: SourcePath,
    field: Field,
}

impl BoundField {
    /// The declared field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the value lives in the validated tree and on instances.
    pub fn source(&self) -> &SourcePath {
        &self.source
    }

    /// The field.
    pub fn field(&self) -> &Field {
        &self.field
    }
}

/// Ordered bound fields of one schema.
pub type BoundFields = IndexMap<String, BoundField>;

/// An immutable schema description.
pub struct SchemaDef {
    name: String,
    fields: BoundFields,
    methods: HashMap<String, MethodFn>,
    clean_fields: HashMap<String, CleanFieldFn>,
    post_process: HashMap<String, PostProcessFn>,
    clean: Option<CleanFn>,
    clean_representation: Option<CleanRepresentationFn>,
    validators: Vec<Arc<dyn Validator>>,
    message_type: Option<String>,
    config: Arc<EngineConfig>,
}

impl fmt::Debug for SchemaDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDef")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("message_type", &self.message_type)
            .finish_non_exhaustive()
    }
}

impl SchemaDef {
    /// Start building a definition.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound fields in declaration order.
    pub fn fields(&self) -> &BoundFields {
        &self.fields
    }

    /// One bound field by name.
    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.fields.get(name)
    }

    /// The declared target message type.
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    /// Engine configuration read by every call.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convert a payload mapping into the validated tree.
    ///
    /// Every field is run; failures are collected by field name. Skipped
    /// fields contribute nothing. When all fields pass, schema-level
    /// validators and the `clean` hook run on the assembled mapping.
    pub(crate) fn validate_in(
        &self,
        fields: &BoundFields,
        data: &Value,
        ctx: Ctx<'_>,
    ) -> Result<Value, ValidationError> {
        let Value::Object(input) = data else {
            return Err(schema_failure(
                ctx.config,
                "invalid",
                &[("datatype", &type_name(data))],
            ));
        };

        let mut validated = Map::new();
        let mut errors: IndexMap<String, ErrorDetail> = IndexMap::new();
        for (name, bound) in fields {
            let outcome = bound
                .field
                .run_validation_in(input.get(name), ctx)
                .and_then(|step| match (step, self.clean_fields.get(name)) {
                    (Step::Value(value), Some(hook)) => hook(value, ctx.context).map(Step::Value),
                    (step, _) => Ok(step),
                });
            match outcome {
                Ok(Step::Value(value)) => {
                    if let Err(err) = set_value(&mut validated, &bound.source, value) {
                        let failure = schema_failure(
                            ctx.config,
                            "unplaceable",
                            &[("source", &err.path), ("found", &err.found)],
                        );
                        errors.insert(name.clone(), failure.into_detail());
                    }
                }
                Ok(Step::Skip) => {
                    tracing::trace!(schema = %self.name, field = %name, "field skipped");
                }
                Err(err) => {
                    errors.insert(name.clone(), err.into_detail());
                }
            }
        }

        let result = if errors.is_empty() {
            self.finish_validation(validated, ctx)
        } else {
            Err(ValidationError::fields(errors))
        };
        tracing::debug!(
            schema = %self.name,
            valid = result.is_ok(),
            errors = result.as_ref().err().map_or(0, |e| e.codes().len()),
            "schema validation finished"
        );
        result
    }

    fn finish_validation(
        &self,
        validated: Map<String, Value>,
        ctx: Ctx<'_>,
    ) -> Result<Value, ValidationError> {
        let validated = Value::Object(validated);
        run_validators(self.validators.iter().map(|v| v.as_ref()), &validated)?;
        match (validated, &self.clean) {
            (Value::Object(map), Some(clean)) => clean(map, ctx.context).map(Value::Object),
            (other, _) => Ok(other),
        }
    }

    /// Build the flat representation mapping of `instance`.
    pub(crate) fn represent_in(
        &self,
        fields: &BoundFields,
        instance: &Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Map<String, Value>, RepresentationError> {
        let mut output = Map::new();
        for (name, bound) in fields {
            let attribute = match instance.walk(bound.source.segments()) {
                Ok(attribute) => attribute,
                Err(source) => match Missing::resolve(bound, ctx) {
                    Missing::Value(value) => Instance::from(value),
                    Missing::Skip => {
                        tracing::trace!(schema = %self.name, field = %name, "field skipped");
                        continue;
                    }
                    Missing::Required => {
                        return Err(RepresentationError::MissingAttribute {
                            schema: self.name.clone(),
                            field: name.clone(),
                            source,
                        })
                    }
                },
            };
            let mut value = bound.field.represent_in(attribute, ctx)?;
            if let Some(hook) = self.post_process.get(name) {
                value = hook(instance, value, ctx.context).map_err(|source| {
                    RepresentationError::Hook {
                        field: name.clone(),
                        source,
                    }
                })?;
            }
            output.insert(name.clone(), value);
        }
        Ok(match &self.clean_representation {
            Some(clean) => clean(output, ctx.context),
            None => output,
        })
    }
}

/// What a field represents when its source path does not exist on the
/// instance.
enum Missing {
    Value(Value),
    Skip,
    Required,
}

impl Missing {
    /// The default (skipped in partial mode), then null when allowed, then
    /// a skip for optional fields.
    fn resolve(bound: &BoundField, ctx: Ctx<'_>) -> Self {
        let options = bound.field.options();
        if let Some(default) = &options.default {
            return if ctx.partial {
                Self::Skip
            } else {
                Self::Value(default.resolve())
            };
        }
        if options.allow_null {
            return Self::Value(Value::Null);
        }
        if options.required {
            return Self::Required;
        }
        Self::Skip
    }
}

/// Builder for [`SchemaDef`].
pub struct SchemaBuilder {
    name: String,
    inherited: IndexMap<String, Field>,
    declared: Vec<(String, Field)>,
    methods: HashMap<String, MethodFn>,
    clean_fields: HashMap<String, CleanFieldFn>,
    post_process: HashMap<String, PostProcessFn>,
    clean: Option<CleanFn>,
    clean_representation: Option<CleanRepresentationFn>,
    validators: Vec<Arc<dyn Validator>>,
    message_type: Option<String>,
    config: Option<Arc<EngineConfig>>,
}

impl SchemaBuilder {
    /// An empty builder for a schema called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherited: IndexMap::new(),
            declared: Vec::new(),
            methods: HashMap::new(),
            clean_fields: HashMap::new(),
            post_process: HashMap::new(),
            clean: None,
            clean_representation: None,
            validators: Vec::new(),
            message_type: None,
            config: None,
        }
    }

    /// Inherit everything from `parent`.
    pub fn extends(mut self, parent: &SchemaDef) -> Self {
        for (name, bound) in &parent.fields {
            self.inherited.insert(name.clone(), bound.field.clone());
        }
        for (name, method) in &parent.methods {
            self.methods
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(method));
        }
        for (name, hook) in &parent.clean_fields {
            self.clean_fields
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(hook));
        }
        for (name, hook) in &parent.post_process {
            self.post_process
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(hook));
        }
        if self.clean.is_none() {
            self.clean = parent.clean.clone();
        }
        if self.clean_representation.is_none() {
            self.clean_representation = parent.clean_representation.clone();
        }
        self.validators.extend(parent.validators.iter().cloned());
        if self.message_type.is_none() {
            self.message_type = parent.message_type.clone();
        }
        if self.config.is_none() {
            self.config = Some(Arc::clone(&parent.config));
        }
        self
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.declared.push((name.into(), field.into()));
        self
    }

    /// Register the function behind a method field.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Instance<'_>, &Context) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Register a hook that may rewrite or reject one field's validated value.
    pub fn clean_field<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Value, &Context) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        self.clean_fields.insert(field.into(), Arc::new(hook));
        self
    }

    /// Register a hook that may rewrite one field's represented value.
    pub fn post_process<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Instance<'_>, Value, &Context) -> Result<Value, ValidationError>
            + Send
            + Sync
            + 'static,
    {
        self.post_process.insert(field.into(), Arc::new(hook));
        self
    }

    /// Register a hook over the whole validated mapping.
    pub fn clean<F>(mut self, hook: F) -> Self
    where
        F: Fn(Map<String, Value>, &Context) -> Result<Map<String, Value>, ValidationError>
            + Send
            + Sync
            + 'static,
    {
        self.clean = Some(Arc::new(hook));
        self
    }

    /// Register a hook over the whole represented mapping.
    pub fn clean_representation<F>(mut self, hook: F) -> Self
    where
        F: Fn(Map<String, Value>, &Context) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.clean_representation = Some(Arc::new(hook));
        self
    }

    /// Append a validator run on the whole validated mapping.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Target the message type `M`.
    pub fn message<M: Message>(self) -> Self {
        self.message_type(M::TYPE_NAME)
    }

    /// Target a message type by name.
    pub fn message_type(mut self, name: impl Into<String>) -> Self {
        self.message_type = Some(name.into());
        self
    }

    /// Use `config` instead of the default engine configuration.
    pub fn config(mut self, config: Arc<EngineConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Check and freeze the definition.
    pub fn build(self) -> Result<Arc<SchemaDef>, ConfigError> {
        let mut fields = self.inherited;
        let mut seen: Vec<&str> = Vec::with_capacity(self.declared.len());
        for (name, _) in &self.declared {
            if seen.contains(&name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    schema: self.name.clone(),
                    field: name.clone(),
                });
            }
            seen.push(name);
        }
        for (name, field) in self.declared {
            fields.insert(name, field);
        }

        let mut bound = BoundFields::with_capacity(fields.len());
        for (name, mut field) in fields {
            if let Field::Method(method) = &mut field {
                let default_name = default_method_name(&name);
                if method.explicit_method_name() == Some(default_name.as_str()) {
                    return Err(ConfigError::RedundantMethodName {
                        schema: self.name.clone(),
                        field: name,
                        method: default_name,
                    });
                }
                let method_name = method.resolved_method_name(&name);
                let Some(function) = self.methods.get(&method_name) else {
                    return Err(ConfigError::MissingMethod {
                        schema: self.name.clone(),
                        field: name,
                        method: method_name,
                    });
                };
                method.bind(&name, Arc::clone(function));
            } else if field.options().source() == Some(name.as_str()) {
                return Err(ConfigError::RedundantSource {
                    schema: self.name.clone(),
                    field: name,
                });
            }
            let source = SourcePath::parse(field.options().source().unwrap_or(&name));
            bound.insert(
                name.clone(),
                BoundField {
                    name,
                    source,
                    field,
                },
            );
        }

        Ok(Arc::new(SchemaDef {
            name: self.name,
            fields: bound,
            methods: self.methods,
            clean_fields: self.clean_fields,
            post_process: self.post_process,
            clean: self.clean,
            clean_representation: self.clean_representation,
            validators: self.validators,
            message_type: self.message_type,
            config: self.config.unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DeclareField;
    use crate::fields::{CharField, IntegerField, MethodField, RawField};
    use serde_json::json;

    fn ctx<'c>(context: &'c Context, config: &'c EngineConfig, partial: bool) -> Ctx<'c> {
        Ctx {
            partial,
            context,
            config,
        }
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = SchemaDef::builder("User")
            .field("name", CharField::new())
            .field("name", CharField::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateField { ref field, .. } if field == "name"));
    }

    #[test]
    fn redundant_source_is_rejected() {
        let err = SchemaDef::builder("User")
            .field("name", CharField::new().source("name"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RedundantSource { .. }));
    }

    #[test]
    fn method_resolution() {
        let err = SchemaDef::builder("User")
            .field("title", MethodField::new().method_name("get_title"))
            .method("get_title", |_: &Instance<'_>, _: &Context| Ok(Value::Null))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RedundantMethodName { .. }));

        let err = SchemaDef::builder("User")
            .field("title", MethodField::new())
            .build()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingMethod { ref method, .. } if method == "get_title")
        );
    }

    #[test]
    fn extends_overrides_in_place() {
        let parent = SchemaDef::builder("Base")
            .field("id", IntegerField::new())
            .field("name", CharField::new())
            .message_type("pkg.Base")
            .build()
            .unwrap();
        let child = SchemaDef::builder("Child")
            .extends(&parent)
            .field("name", CharField::new().required(true))
            .field("email", CharField::new())
            .build()
            .unwrap();
        let names: Vec<&str> = child.fields().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert!(child.field("name").unwrap().field().options().is_required());
        assert_eq!(child.message_type(), Some("pkg.Base"));
    }

    #[test]
    fn validation_collects_field_errors_and_skips() {
        let def = SchemaDef::builder("User")
            .field("name", CharField::new().required(true))
            .field("age", IntegerField::new())
            .field("nick", CharField::new())
            .build()
            .unwrap();
        let context = Context::new();
        let config = EngineConfig::default();
        let err = def
            .validate_in(def.fields(), &json!({"age": "x"}), ctx(&context, &config, false))
            .unwrap_err();
        assert_eq!(
            err.detail().to_json(),
            json!({"name": ["This field is required."], "age": ["A valid integer is required."]})
        );

        let ok = def
            .validate_in(def.fields(), &json!({"name": "a"}), ctx(&context, &config, false))
            .unwrap();
        assert_eq!(ok, json!({"name": "a"}));
    }

    #[test]
    fn colliding_sources_are_reported_not_dropped() {
        let def = SchemaDef::builder("Row")
            .field("a", RawField::new())
            .field("x", RawField::new().source("a.b"))
            .build()
            .unwrap();
        let context = Context::new();
        let config = EngineConfig::default();
        let err = def
            .validate_in(def.fields(), &json!({"a": 1, "x": 2}), ctx(&context, &config, false))
            .unwrap_err();
        assert_eq!(
            err.detail().to_json(),
            json!({"x": ["Cannot place this value at \"a.b\": expected a mapping, found int."]})
        );

        let whole = SchemaDef::builder("Whole")
            .field("extra", RawField::new().source("*"))
            .build()
            .unwrap();
        let err = whole
            .validate_in(whole.fields(), &json!({"extra": [1]}), ctx(&context, &config, false))
            .unwrap_err();
        assert_eq!(err.codes(), vec!["unplaceable"]);
        assert_eq!(
            whole
                .validate_in(whole.fields(), &json!({"extra": {"k": 1}}), ctx(&context, &config, false))
                .unwrap(),
            json!({"k": 1})
        );
    }

    #[test]
    fn non_mappings_are_invalid() {
        let def = SchemaDef::builder("User").build().unwrap();
        let context = Context::new();
        let config = EngineConfig::default();
        let err = def
            .validate_in(def.fields(), &json!([1]), ctx(&context, &config, false))
            .unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Invalid data. Expected a dictionary, but got array."
        );
    }

    #[test]
    fn hooks_run_in_both_directions() {
        let def = SchemaDef::builder("User")
            .field("name", CharField::new())
            .clean_field("name", |value: Value, _: &Context| {
                Ok(json!(value.as_str().unwrap_or_default().to_lowercase()))
            })
            .post_process("name", |_: &Instance<'_>, value: Value, _: &Context| {
                Ok(json!(format!("<{}>", value.as_str().unwrap_or_default())))
            })
            .clean(|mut map: Map<String, Value>, _: &Context| {
                map.insert("cleaned".into(), json!(true));
                Ok(map)
            })
            .build()
            .unwrap();
        let context = Context::new();
        let config = EngineConfig::default();
        let c = ctx(&context, &config, false);
        assert_eq!(
            def.validate_in(def.fields(), &json!({"name": "ADA"}), c).unwrap(),
            json!({"name": "ada", "cleaned": true})
        );
        let instance = json!({"name": "ada"});
        assert_eq!(
            Value::Object(def.represent_in(def.fields(), &Instance::from(&instance), c).unwrap()),
            json!({"name": "<ada>"})
        );
    }

    #[test]
    fn missing_attributes() {
        let def = SchemaDef::builder("User")
            .field("name", CharField::new().required(true))
            .field("nick", CharField::new())
            .field("age", IntegerField::new().default_value(18))
            .field("bio", CharField::new().allow_null(true))
            .build()
            .unwrap();
        let context = Context::new();
        let config = EngineConfig::default();
        let instance = json!({"name": "ada"});
        let out = def
            .represent_in(def.fields(), &Instance::from(&instance), ctx(&context, &config, false))
            .unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"name": "ada", "age": 18, "bio": null})
        );

        let partial = def
            .represent_in(def.fields(), &Instance::from(&instance), ctx(&context, &config, true))
            .unwrap();
        assert!(!partial.contains_key("age"));

        let empty = json!({});
        let err = def
            .represent_in(def.fields(), &Instance::from(&empty), ctx(&context, &config, false))
            .unwrap_err();
        assert!(matches!(err, RepresentationError::MissingAttribute { ref field, .. } if field == "name"));
    }
}
