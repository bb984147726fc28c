//! Email address validation.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::pattern::builtin;
use crate::Validator;

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();

/// Accepts `local@domain.tld` addresses whose local part and domain labels
/// are made of letters, digits, `_` and `-`. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    message: String,
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailValidator {
    /// Default rejection message.
    pub const MESSAGE: &'static str = "Enter a valid email address";

    /// Validator with the default message.
    pub fn new() -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Replace the rejection message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Check `text` as an email address.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        let valid = !text.is_empty()
            && text.contains('@')
            && builtin(
                &EMAIL,
                r"(?i)^[a-z0-9_-]+@[a-z0-9_-]+(?:\.[a-z0-9_-]+)+$",
            )
            .is_some_and(|re| re.is_match(text));
        if valid {
            Ok(())
        } else {
            Err(ValidationError::message("invalid", self.message.clone()))
        }
    }
}

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(&to_text(value))
    }
}
