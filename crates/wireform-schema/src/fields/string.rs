//! Text fields.

use std::sync::Arc;

use serde_json::Value;

use wireform_core::{to_text, Instance, ValidationError};
use wireform_validators::{run_validators, MaxLengthValidator, MinLengthValidator};

use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions, Presence, Step};

/// A string. Numbers are accepted and converted to their text form;
/// booleans and containers are not.
///
/// Empty input, or whitespace-only input when trimming, fails with `blank`
/// unless [`allow_blank`](Self::allow_blank) is set, in which case it
/// validates to the empty string without running validators.
#[derive(Debug, Clone)]
pub struct CharField {
    options: FieldOptions,
    allow_blank: bool,
    trim_whitespace: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

declare_field!(CharField);

impl Default for CharField {
    fn default() -> Self {
        Self {
            options: FieldOptions::default(),
            allow_blank: false,
            trim_whitespace: true,
            min_length: None,
            max_length: None,
        }
    }
}

impl CharField {
    /// A new text field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept empty strings.
    pub fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// Strip surrounding whitespace on the way in and out. On by default.
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Minimum length in characters.
    pub fn min_length(mut self, limit: usize) -> Self {
        self.min_length = Some(limit);
        self.rebuild_implied();
        self
    }

    /// Maximum length in characters.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self.rebuild_implied();
        self
    }

    fn rebuild_implied(&mut self) {
        self.options.implied.clear();
        if let Some(limit) = self.min_length {
            self.options
                .implied
                .push(Arc::new(MinLengthValidator::new(limit)));
        }
        if let Some(limit) = self.max_length {
            self.options
                .implied
                .push(Arc::new(MaxLengthValidator::new(limit)));
        }
    }

    fn is_blank(&self, text: &str) -> bool {
        text.is_empty() || (self.trim_whitespace && text.trim().is_empty())
    }

    fn finish(&self, text: String) -> String {
        if self.trim_whitespace {
            text.trim().to_string()
        } else {
            text
        }
    }
}

impl FieldBehavior for CharField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("invalid", "Not a valid string."),
            ("blank", "This field may not be blank."),
        ]
    }

    fn type_initial(&self) -> Value {
        Value::String(String::new())
    }

    fn run_validation(&self, data: Option<&Value>, ctx: Ctx<'_>) -> Result<Step, ValidationError> {
        if let Some(Value::String(text)) = data {
            if self.is_blank(text) {
                if !self.allow_blank {
                    return Err(self.fail("blank", ctx, &[]));
                }
                return Ok(Step::Value(Value::String(String::new())));
            }
        }
        let data = match self.validate_empty_values(data, ctx)? {
            Presence::Resolved(step) => return Ok(step),
            Presence::Present(data) => data,
        };
        let value = self.to_internal_value(data, ctx)?;
        run_validators(self.options.all_validators(), &value)?;
        Ok(Step::Value(value))
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        match data {
            Value::String(s) => Ok(Value::String(self.finish(s.clone()))),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(self.fail("invalid", ctx, &[])),
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "char");
        Ok(Value::String(self.finish(to_text(&value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DeclareField, Field};
    use serde_json::json;

    #[test]
    fn trims_and_converts_numbers() {
        let field = Field::from(CharField::new());
        assert_eq!(
            field.run_validation(Some(&json!("  hi  "))).unwrap(),
            Step::Value(json!("hi"))
        );
        assert_eq!(
            field.run_validation(Some(&json!(42))).unwrap(),
            Step::Value(json!("42"))
        );
        let keep = Field::from(CharField::new().trim_whitespace(false));
        assert_eq!(
            keep.run_validation(Some(&json!(" x "))).unwrap(),
            Step::Value(json!(" x "))
        );
    }

    #[test]
    fn rejects_booleans_and_containers() {
        let field = Field::from(CharField::new());
        for bad in [json!(true), json!([1]), json!({"a": 1})] {
            let err = field.run_validation(Some(&bad)).unwrap_err();
            assert_eq!(err.codes(), vec!["invalid"]);
            assert_eq!(err.detail().messages()[0].message, "Not a valid string.");
        }
    }

    #[test]
    fn blank_handling() {
        let strict = Field::from(CharField::new().required(true));
        assert_eq!(
            strict.run_validation(Some(&json!("   "))).unwrap_err().codes(),
            vec!["blank"]
        );
        let lax = Field::from(CharField::new().allow_blank(true).min_length(3));
        assert_eq!(
            lax.run_validation(Some(&json!(" "))).unwrap(),
            Step::Value(json!(""))
        );
    }

    #[test]
    fn length_limits() {
        let field = Field::from(CharField::new().min_length(2).max_length(4));
        assert!(field.run_validation(Some(&json!("abc"))).is_ok());
        let err = field.run_validation(Some(&json!("a"))).unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Ensure this value has at least 2 character (it has 1)"
        );
        assert_eq!(
            field.run_validation(Some(&json!("abcde"))).unwrap_err().codes(),
            vec!["max_length"]
        );
    }

    #[test]
    fn representation_is_text() {
        let field = Field::from(CharField::new());
        assert_eq!(field.to_representation(&json!(12)).unwrap(), json!("12"));
        assert_eq!(field.to_representation(&json!(" a ")).unwrap(), json!("a"));
    }
}
