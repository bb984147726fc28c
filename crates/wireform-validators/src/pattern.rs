//! Regular-expression validators.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::{Validator, ValidatorConfigError};

/// Compile a built-in pattern once per process.
///
/// Returns `None` only if the pattern does not compile; callers treat that
/// as a rejection so that a broken pattern never accepts input.
pub(crate) fn builtin(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Matches the text form of a value against a pattern.
///
/// With `inverse_match`, a value is accepted only when the pattern does
/// *not* match. The pattern is searched, not anchored; anchor it explicitly
/// when the whole value must match.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: String,
    code: &'static str,
    inverse_match: bool,
}

impl RegexValidator {
    /// Default rejection message.
    pub const MESSAGE: &'static str = "Enter a valid value";

    /// Compile `pattern` into a validator.
    pub fn new(pattern: &str) -> Result<Self, ValidatorConfigError> {
        Self::builder(pattern, false)
    }

    /// Compile `pattern` case-insensitively.
    pub fn case_insensitive(pattern: &str) -> Result<Self, ValidatorConfigError> {
        Self::builder(pattern, true)
    }

    fn builder(pattern: &str, case_insensitive: bool) -> Result<Self, ValidatorConfigError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| ValidatorConfigError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self::from_regex(regex))
    }

    /// Wrap an already compiled pattern.
    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            message: Self::MESSAGE.to_string(),
            code: "invalid",
            inverse_match: false,
        }
    }

    /// Replace the rejection message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the failure kind.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    /// Accept only values the pattern does not match.
    pub fn inverse(mut self) -> Self {
        self.inverse_match = true;
        self
    }

    /// The compiled pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let found = self.regex.is_match(&to_text(value));
        if found == self.inverse_match {
            return Err(ValidationError::message(self.code, self.message.clone()));
        }
        Ok(())
    }
}

static INTEGER: OnceLock<Option<Regex>> = OnceLock::new();

/// Accepts an optionally negative run of decimal digits.
pub fn validate_integer(value: &Value) -> Result<(), ValidationError> {
    let text = to_text(value);
    match builtin(&INTEGER, r"^-?\d+\z") {
        Some(re) if re.is_match(&text) => Ok(()),
        _ => Err(ValidationError::message("invalid", "Enter a valid integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_semantics() {
        let v = RegexValidator::new(r"\d").unwrap();
        assert!(v.validate(&json!("ab1")).is_ok());
        assert!(v.validate(&json!(7)).is_ok());
        let err = v.validate(&json!("abc")).unwrap_err();
        assert_eq!(err.detail().messages()[0].message, "Enter a valid value");
    }

    #[test]
    fn inverse_match() {
        let v = RegexValidator::new(r"\s").unwrap().inverse().with_message("No spaces");
        assert!(v.validate(&json!("abc")).is_ok());
        let err = v.validate(&json!("a c")).unwrap_err();
        assert_eq!(err.detail().messages()[0].message, "No spaces");
    }

    #[test]
    fn case_insensitive_flag() {
        let v = RegexValidator::case_insensitive("^abc$").unwrap();
        assert!(v.validate(&json!("ABC")).is_ok());
    }

    #[test]
    fn bad_patterns_are_config_errors() {
        assert!(matches!(
            RegexValidator::new("("),
            Err(ValidatorConfigError::Pattern { .. })
        ));
    }

    #[test]
    fn integers() {
        assert!(validate_integer(&json!("-42")).is_ok());
        assert!(validate_integer(&json!(17)).is_ok());
        assert!(validate_integer(&json!("4.2")).is_err());
        assert!(validate_integer(&json!("42\n")).is_err());
    }
}
