//! Computed fields backed by a schema-registered function.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use wireform_core::{Instance, ValidationError};

use crate::error::RepresentationError;
use crate::field::{declare_field, Context, Ctx, FieldBehavior, FieldOptions};

/// A function registered on a schema for a method field.
///
/// During validation it receives the raw input value of the field and
/// returns a mapping merged into the root of the validated tree. During
/// representation it receives the whole instance and returns the field's
/// output.
pub type MethodFn =
    Arc<dyn Fn(&Instance<'_>, &Context) -> Result<Value, ValidationError> + Send + Sync>;

/// A field computed by a function registered on the owning schema.
///
/// The function is looked up when the schema is built, under
/// `get_<field name>` unless [`method_name`](Self::method_name) names
/// another one. The source is always the whole object.
#[derive(Clone)]
pub struct MethodField {
    options: FieldOptions,
    method_name: Option<String>,
    bound: Option<(String, MethodFn)>,
}

declare_field!(MethodField);

impl Default for MethodField {
    fn default() -> Self {
        Self {
            options: FieldOptions {
                source: Some("*".to_string()),
                ..FieldOptions::default()
            },
            method_name: None,
            bound: None,
        }
    }
}

impl fmt::Debug for MethodField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodField")
            .field("method_name", &self.method_name)
            .field("bound", &self.bound.as_ref().map(|(name, _)| name))
            .finish_non_exhaustive()
    }
}

impl MethodField {
    /// A method field using the default method name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a method other than `get_<field name>`.
    pub fn method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    /// The explicitly configured method name, if any.
    pub fn explicit_method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// The method name used for a field called `field_name`.
    pub fn resolved_method_name(&self, field_name: &str) -> String {
        self.method_name
            .clone()
            .unwrap_or_else(|| default_method_name(field_name))
    }

    pub(crate) fn bind(&mut self, field_name: &str, method: MethodFn) {
        self.options.source = Some("*".to_string());
        self.bound = Some((field_name.to_string(), method));
    }

    fn call(&self, value: &Instance<'_>, context: &Context) -> Option<Result<Value, ValidationError>> {
        self.bound.as_ref().map(|(_, method)| method(value, context))
    }
}

/// `get_<field_name>`.
pub(crate) fn default_method_name(field_name: &str) -> String {
    format!("get_{field_name}")
}

impl FieldBehavior for MethodField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        match self.call(&Instance::from(data), ctx.context) {
            Some(result) => result,
            None => {
                tracing::error!(
                    method = ?self.method_name,
                    "method field used outside a built schema"
                );
                Err(self.fail("invalid", ctx, &[]))
            }
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let field = self
            .bound
            .as_ref()
            .map_or_else(String::new, |(name, _)| name.clone());
        match self.call(&value, ctx.context) {
            Some(result) => result.map_err(|source| RepresentationError::Hook { field, source }),
            None => {
                tracing::error!(
                    method = ?self.method_name,
                    "method field used outside a built schema"
                );
                Ok(Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Step};
    use serde_json::json;

    fn shout() -> MethodFn {
        Arc::new(|value: &Instance<'_>, _: &Context| {
            let text = value
                .get("name")
                .and_then(|name| name.into_value())
                .and_then(|name| name.as_str().map(str::to_uppercase))
                .unwrap_or_default();
            Ok(json!(text))
        })
    }

    #[test]
    fn default_name() {
        let field = MethodField::new();
        assert_eq!(field.resolved_method_name("title"), "get_title");
        let named = MethodField::new().method_name("compute");
        assert_eq!(named.resolved_method_name("title"), "compute");
        assert_eq!(field.options().source(), Some("*"));
    }

    #[test]
    fn bound_method_computes_representation() {
        let mut field = MethodField::new();
        field.bind("title", shout());
        let field = Field::from(field);
        assert_eq!(
            field.to_representation(&json!({"name": "ada"})).unwrap(),
            json!("ADA")
        );
    }

    #[test]
    fn validation_passes_the_raw_value() {
        let mut field = MethodField::new();
        field.bind(
            "tags",
            Arc::new(|value: &Instance<'_>, _: &Context| {
                let joined = value.as_value().map(|v| v.to_string()).unwrap_or_default();
                Ok(json!({ "tags_text": joined }))
            }),
        );
        let field = Field::from(field);
        assert_eq!(
            field.run_validation(Some(&json!(["a"]))).unwrap(),
            Step::Value(json!({"tags_text": "[\"a\"]"}))
        );
    }

    #[test]
    fn unbound_method_is_invalid() {
        let field = Field::from(MethodField::new());
        assert!(field.run_validation(Some(&json!(1))).is_err());
    }
}
