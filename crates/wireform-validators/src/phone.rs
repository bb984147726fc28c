//! # Phone Numbers and Account Identifiers
//!
//! Phone numbers follow the mainland-China mobile numbering plan: eleven
//! digits starting with an allocated three-digit prefix.
//!
//! ```text
//! 13x       145-149   15x   166   170-178   18x   198-199
//! ```
//!
//! An identifier is a login name that is either a phone number or an email
//! address.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::email::EmailValidator;
use crate::pattern::builtin;
use crate::{Validator, ValidatorConfigError};

static PHONE: OnceLock<Option<Regex>> = OnceLock::new();

const PHONE_PATTERN: &str = r"^(?:13[0-9]|14[5-9]|15[0-9]|16[6]|17[0-8]|18[0-9]|19[8-9])\d{8}$";

/// Validates mobile phone numbers.
#[derive(Debug, Clone)]
pub struct PhoneValidator {
    message: String,
    custom: Option<Regex>,
}

impl Default for PhoneValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneValidator {
    /// Default rejection message.
    pub const MESSAGE: &'static str = "Enter a valid phone number";

    /// Validator for the built-in numbering plan.
    pub fn new() -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
            custom: None,
        }
    }

    /// Validate against a different numbering-plan pattern.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, ValidatorConfigError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ValidatorConfigError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        self.custom = Some(regex);
        Ok(self)
    }

    /// Replace the rejection message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Check `text` as a phone number.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        let digits = !text.is_empty() && text.chars().all(|c| c.is_ascii_digit());
        let regex = match &self.custom {
            Some(re) => Some(re),
            None => builtin(&PHONE, PHONE_PATTERN),
        };
        if digits && regex.is_some_and(|re| re.is_match(text)) {
            Ok(())
        } else {
            Err(ValidationError::message("invalid", self.message.clone()))
        }
    }
}

impl Validator for PhoneValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(&to_text(value))
    }
}

/// Which identifier kinds are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierProtocol {
    /// A phone number or an email address.
    #[default]
    Both,
    /// Phone numbers only.
    Phone,
    /// Email addresses only.
    Email,
}

/// Validates a phone number, an email address, or either.
#[derive(Debug, Clone, Default)]
pub struct IdentifierValidator {
    protocol: IdentifierProtocol,
    message: Option<String>,
    phone: PhoneValidator,
    email: EmailValidator,
}

impl IdentifierValidator {
    /// Accept identifiers of the given kind.
    pub fn new(protocol: IdentifierProtocol) -> Self {
        Self {
            protocol,
            ..Self::default()
        }
    }

    /// Replace the message reported for empty or unclassifiable input.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn fail(&self) -> ValidationError {
        let message = self.message.clone().unwrap_or_else(|| {
            match self.protocol {
                IdentifierProtocol::Both => "Enter a valid phone number or email address",
                IdentifierProtocol::Phone => PhoneValidator::MESSAGE,
                IdentifierProtocol::Email => EmailValidator::MESSAGE,
            }
            .to_string()
        });
        ValidationError::message("invalid", message)
    }
}

impl Validator for IdentifierValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let text = to_text(value);
        if text.is_empty() {
            return Err(self.fail());
        }
        match self.protocol {
            IdentifierProtocol::Both if text.contains('@') => self.email.check(&text),
            IdentifierProtocol::Both if text.chars().all(|c| c.is_ascii_digit()) => {
                self.phone.check(&text)
            }
            IdentifierProtocol::Both => Err(self.fail()),
            IdentifierProtocol::Email => self.email.check(&text),
            IdentifierProtocol::Phone => self.phone.check(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phone_numbers() {
        let v = PhoneValidator::new();
        assert!(v.check("13800138000").is_ok());
        assert!(v.check("19812345678").is_ok());
        assert!(v.check("12800138000").is_err());
        assert!(v.check("1380013800").is_err());
        assert!(v.check("138001380001").is_err());
        assert!(v.check("1380013800a").is_err());
        assert!(v.validate(&json!(13800138000_i64)).is_ok());
    }

    #[test]
    fn custom_plan() {
        let v = PhoneValidator::new().with_pattern(r"^0\d{9}$").unwrap();
        assert!(v.check("0123456789").is_ok());
        assert!(v.check("13800138000").is_err());
    }

    #[test]
    fn identifiers() {
        let both = IdentifierValidator::new(IdentifierProtocol::Both);
        assert!(both.validate(&json!("13800138000")).is_ok());
        assert!(both.validate(&json!("ada@example.com")).is_ok());
        let err = both.validate(&json!("ada")).unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Enter a valid phone number or email address"
        );
        let err = both.validate(&json!("ada@")).unwrap_err();
        assert_eq!(err.detail().messages()[0].message, "Enter a valid email address");

        let phone = IdentifierValidator::new(IdentifierProtocol::Phone);
        assert!(phone.validate(&json!("ada@example.com")).is_err());
    }
}
