//! Boolean fields.

use serde_json::Value;

use wireform_core::{is_truthy, Instance, ValidationError};

use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions};

const MESSAGES: &[(&str, &str)] = &[("invalid", "Must be a valid boolean.")];

/// Closed literal sets, compared case-insensitively against strings.
struct Tokens {
    truthy: &'static [&'static str],
    falsy: &'static [&'static str],
    null: &'static [&'static str],
}

const BOOLEAN: Tokens = Tokens {
    truthy: &["t", "y", "yes", "true", "on", "1"],
    falsy: &["f", "n", "no", "false", "off", "0"],
    null: &["null", ""],
};

const NULL_BOOLEAN: Tokens = Tokens {
    truthy: &["t", "true", "1"],
    falsy: &["f", "false", "0"],
    null: &["n", "null", ""],
};

impl Tokens {
    /// `Some(Some(b))` for a boolean token, `Some(None)` for a null token,
    /// `None` for anything else.
    fn classify(&self, value: &Value) -> Option<Option<bool>> {
        match value {
            Value::Bool(b) => Some(Some(*b)),
            Value::Null => Some(None),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Some(Some(true)),
                Some(f) if f == 0.0 => Some(Some(false)),
                _ => None,
            },
            Value::String(s) => {
                let token = s.to_ascii_lowercase();
                if self.truthy.contains(&token.as_str()) {
                    Some(Some(true))
                } else if self.falsy.contains(&token.as_str()) {
                    Some(Some(false))
                } else if self.null.contains(&token.as_str()) {
                    Some(None)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// A boolean parsed from a closed set of literal tokens.
///
/// Accepts JSON booleans, the numbers 1 and 0, and the strings `t`, `y`,
/// `yes`, `true`, `on`, `1` / `f`, `n`, `no`, `false`, `off`, `0` in any
/// case. When null is allowed, `null` and the empty string map to null.
#[derive(Debug, Clone, Default)]
pub struct BooleanField {
    options: FieldOptions,
}

declare_field!(BooleanField);

impl BooleanField {
    /// A new boolean field.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldBehavior for BooleanField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        MESSAGES
    }

    fn type_initial(&self) -> Value {
        Value::Bool(false)
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        match BOOLEAN.classify(data) {
            Some(Some(b)) => Ok(Value::Bool(b)),
            Some(None) if self.options.allow_null => Ok(Value::Null),
            _ => Err(self.fail("invalid", ctx, &[])),
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "boolean");
        Ok(match BOOLEAN.classify(&value) {
            Some(Some(b)) => Value::Bool(b),
            Some(None) if self.options.allow_null => Value::Null,
            _ => Value::Bool(is_truthy(&value)),
        })
    }
}

/// A tri-state boolean: always nullable, with `n`, `null` and the empty
/// string mapping to null.
#[derive(Debug, Clone)]
pub struct NullBooleanField {
    options: FieldOptions,
}

declare_field!(NullBooleanField);

impl Default for NullBooleanField {
    fn default() -> Self {
        Self {
            options: FieldOptions {
                allow_null: true,
                ..FieldOptions::default()
            },
        }
    }
}

impl NullBooleanField {
    /// A new nullable boolean field.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldBehavior for NullBooleanField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        MESSAGES
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        match NULL_BOOLEAN.classify(data) {
            Some(Some(b)) => Ok(Value::Bool(b)),
            Some(None) => Ok(Value::Null),
            None => Err(self.fail("invalid", ctx, &[])),
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "null_boolean");
        Ok(match NULL_BOOLEAN.classify(&value) {
            Some(Some(b)) => Value::Bool(b),
            Some(None) => Value::Null,
            None => Value::Bool(is_truthy(&value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DeclareField, Field, Step};
    use serde_json::json;

    fn accept(field: &Field, input: Value) -> Value {
        match field.run_validation(Some(&input)).unwrap() {
            Step::Value(v) => v,
            Step::Skip => panic!("unexpected skip"),
        }
    }

    #[test]
    fn token_sets() {
        let field = Field::from(BooleanField::new());
        for token in [json!("YES"), json!("On"), json!("t"), json!(1), json!(true)] {
            assert_eq!(accept(&field, token), json!(true));
        }
        for token in [json!("no"), json!("OFF"), json!("0"), json!(0.0), json!(false)] {
            assert_eq!(accept(&field, token), json!(false));
        }
        let err = field.run_validation(Some(&json!("maybe"))).unwrap_err();
        assert_eq!(err.codes(), vec!["invalid"]);
        assert_eq!(err.detail().messages()[0].message, "Must be a valid boolean.");
        assert!(field.run_validation(Some(&json!(2))).is_err());
        assert!(field.run_validation(Some(&json!(""))).is_err());
    }

    #[test]
    fn null_tokens_require_allow_null() {
        let field = Field::from(BooleanField::new().allow_null(true));
        assert_eq!(accept(&field, json!("NULL")), Value::Null);
        assert_eq!(accept(&field, json!("")), Value::Null);
    }

    #[test]
    fn null_boolean() {
        let field = Field::from(NullBooleanField::new());
        assert!(field.options().allows_null());
        assert_eq!(accept(&field, json!("n")), Value::Null);
        assert_eq!(accept(&field, json!("TRUE")), json!(true));
        assert!(field.run_validation(Some(&json!("yes"))).is_err());
        assert_eq!(field.initial_value(), Value::Null);
    }

    #[test]
    fn representation_falls_back_to_truthiness() {
        let field = Field::from(BooleanField::new());
        assert_eq!(field.to_representation(&json!("yes")).unwrap(), json!(true));
        assert_eq!(field.to_representation(&json!("anything")).unwrap(), json!(true));
        assert_eq!(field.to_representation(&json!([])).unwrap(), json!(false));
    }
}
