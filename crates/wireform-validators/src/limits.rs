//! # Bound Validators
//!
//! Value bounds compare with strict `<` / `>` against the configured limit,
//! so the limit itself is always accepted. Numbers compare numerically
//! (exactly when both sides are integers), strings compare lexicographically.
//! A value that cannot be ordered against the limit is left to the field's
//! own type check and passes here.
//!
//! Length bounds measure with a length function that defaults to the element
//! count of strings, arrays and objects.

use std::cmp::Ordering;

use serde_json::Value;

use wireform_core::{length_of, render, to_text, ValidationError};

use crate::Validator;

/// Order two JSON values, if they are comparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Rejects values greater than the limit.
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
    limit: Value,
    message: String,
}

impl MaxValueValidator {
    /// Default message template.
    pub const MESSAGE: &'static str = "Ensure this value is less than or equal to {limit_value}";

    /// Limit values to at most `limit`.
    pub fn new(limit: impl Into<Value>) -> Self {
        Self {
            limit: limit.into(),
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Replace the message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Validator for MaxValueValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if compare(value, &self.limit) == Some(Ordering::Greater) {
            let msg = render(
                &self.message,
                &[
                    ("limit_value", &to_text(&self.limit)),
                    ("show_value", &to_text(value)),
                ],
            );
            return Err(ValidationError::message("max_value", msg));
        }
        Ok(())
    }
}

/// Rejects values less than the limit.
#[derive(Debug, Clone)]
pub struct MinValueValidator {
    limit: Value,
    message: String,
}

impl MinValueValidator {
    /// Default message template.
    pub const MESSAGE: &'static str = "Ensure this value is greater than or equal to {limit_value}";

    /// Limit values to at least `limit`.
    pub fn new(limit: impl Into<Value>) -> Self {
        Self {
            limit: limit.into(),
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Replace the message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Validator for MinValueValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if compare(value, &self.limit) == Some(Ordering::Less) {
            let msg = render(
                &self.message,
                &[
                    ("limit_value", &to_text(&self.limit)),
                    ("show_value", &to_text(value)),
                ],
            );
            return Err(ValidationError::message("min_value", msg));
        }
        Ok(())
    }
}

/// Measures a value for the length validators.
pub type LengthFn = fn(&Value) -> Option<usize>;

/// Element count, falling back to the character count of the text form for
/// scalars.
fn default_length(value: &Value) -> Option<usize> {
    length_of(value).or_else(|| match value {
        Value::Null => None,
        other => Some(to_text(other).chars().count()),
    })
}

/// Rejects values shorter than the limit.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    limit: usize,
    message: String,
    length: LengthFn,
}

impl MinLengthValidator {
    /// Default message template.
    pub const MESSAGE: &'static str =
        "Ensure this value has at least {limit_value} character (it has {show_value})";

    /// Require at least `limit` elements.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            message: Self::MESSAGE.to_string(),
            length: default_length,
        }
    }

    /// Replace the message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Measure with a custom length function.
    pub fn with_length(mut self, length: LengthFn) -> Self {
        self.length = length;
        self
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match (self.length)(value) {
            Some(len) if len < self.limit => Err(ValidationError::message(
                "min_length",
                render(
                    &self.message,
                    &[("limit_value", &self.limit), ("show_value", &len)],
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Rejects values longer than the limit.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    limit: usize,
    message: String,
    length: LengthFn,
}

impl MaxLengthValidator {
    /// Default message template.
    pub const MESSAGE: &'static str =
        "Ensure this value has at most {limit_value} character (it has {show_value})";

    /// Allow at most `limit` elements.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            message: Self::MESSAGE.to_string(),
            length: default_length,
        }
    }

    /// Replace the message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Measure with a custom length function.
    pub fn with_length(mut self, length: LengthFn) -> Self {
        self.length = length;
        self
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match (self.length)(value) {
            Some(len) if len > self.limit => Err(ValidationError::message(
                "max_length",
                render(
                    &self.message,
                    &[("limit_value", &self.limit), ("show_value", &len)],
                ),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_bounds_are_strict() {
        let max = MaxValueValidator::new(10);
        assert!(max.validate(&json!(10)).is_ok());
        assert!(max.validate(&json!(9.5)).is_ok());
        let err = max.validate(&json!(11)).unwrap_err();
        assert_eq!(err.codes(), vec!["max_value"]);
        assert_eq!(
            err.detail().messages()[0].message,
            "Ensure this value is less than or equal to 10"
        );

        let min = MinValueValidator::new(-1.5);
        assert!(min.validate(&json!(-1.5)).is_ok());
        assert_eq!(min.validate(&json!(-2)).unwrap_err().codes(), vec!["min_value"]);
    }

    #[test]
    fn large_integers_compare_exactly() {
        let max = MaxValueValidator::new(i64::MAX - 1);
        assert!(max.validate(&json!(i64::MAX)).is_err());
    }

    #[test]
    fn strings_compare_lexicographically() {
        let min = MinValueValidator::new("b");
        assert!(min.validate(&json!("c")).is_ok());
        assert!(min.validate(&json!("a")).is_err());
    }

    #[test]
    fn incomparable_values_pass() {
        assert!(MaxValueValidator::new(1).validate(&json!("zzz")).is_ok());
    }

    #[test]
    fn lengths() {
        let min = MinLengthValidator::new(3);
        let err = min.validate(&json!("ab")).unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Ensure this value has at least 3 character (it has 2)"
        );
        assert!(min.validate(&json!([1, 2, 3])).is_ok());

        let max = MaxLengthValidator::new(2);
        assert!(max.validate(&json!({"a": 1, "b": 2})).is_ok());
        assert_eq!(max.validate(&json!("héllo")).unwrap_err().codes(), vec!["max_length"]);
    }

    #[test]
    fn custom_length_function() {
        fn bytes(v: &Value) -> Option<usize> {
            v.as_str().map(str::len)
        }
        let max = MaxLengthValidator::new(4).with_length(bytes);
        assert!(max.validate(&json!("héllo")).is_err());
        assert!(max.validate(&json!("héy")).is_ok());
    }
}
