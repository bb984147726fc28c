//! # Password Strength Tiers
//!
//! | level | rule |
//! |---|---|
//! | `number` | exactly six ASCII digits |
//! | `normal` | 6-18 ASCII letters and digits, neither all digits nor all letters |
//! | `high` | 6-18 characters drawn from lower case, upper case, digits and symbols, with at least two of those classes present |
//! | `any` | accepts everything |
//! | `custom` | the custom pattern, or everything when none is set |
//!
//! A named tier always wins: a custom pattern only decides under `custom`.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::{Validator, ValidatorConfigError};

/// Strength tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordLevel {
    /// Six digits.
    #[default]
    Number,
    /// Mixed letters and digits.
    Normal,
    /// At least two character classes.
    High,
    /// No constraint.
    Any,
    /// The custom pattern given by [`PasswordValidator::with_pattern`].
    Custom,
}

impl PasswordLevel {
    fn default_message(self) -> &'static str {
        match self {
            Self::Number => "Enter a valid 6-digit password",
            Self::Normal => "Enter a valid 6-18-digit alphanumeric password",
            Self::High => {
                "Enter a 6-18 bit must contain any combination of upper \
                 and lower case letters, numbers, symbols password"
            }
            Self::Any | Self::Custom => "Enter a valid password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
}

/// Classify a character for the `high` tier. Whitespace, CJK ideographs and
/// parentheses belong to no class and are rejected outright.
fn classify(c: char) -> Option<CharClass> {
    match c {
        'a'..='z' => Some(CharClass::Lower),
        'A'..='Z' => Some(CharClass::Upper),
        '0'..='9' => Some(CharClass::Digit),
        '(' | ')' | '\u{4e00}'..='\u{9fa5}' => None,
        c if c.is_whitespace() => None,
        _ => Some(CharClass::Symbol),
    }
}

fn check_number(text: &str) -> bool {
    text.len() == 6 && text.bytes().all(|b| b.is_ascii_digit())
}

fn check_normal(text: &str) -> bool {
    let len = text.chars().count();
    (6..=18).contains(&len)
        && text.chars().all(|c| c.is_ascii_alphanumeric())
        && !text.chars().all(|c| c.is_ascii_digit())
        && !text.chars().all(|c| c.is_ascii_alphabetic())
}

fn check_high(text: &str) -> bool {
    let len = text.chars().count();
    if !(6..=18).contains(&len) {
        return false;
    }
    let mut seen: Vec<CharClass> = Vec::with_capacity(4);
    for c in text.chars() {
        match classify(c) {
            Some(class) if !seen.contains(&class) => seen.push(class),
            Some(_) => {}
            None => return false,
        }
    }
    seen.len() >= 2
}

/// Validates password strength.
#[derive(Debug, Clone, Default)]
pub struct PasswordValidator {
    level: PasswordLevel,
    message: Option<String>,
    custom: Option<Regex>,
}

impl PasswordValidator {
    /// Validator for the given tier.
    pub fn new(level: PasswordLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Set a case-insensitive custom pattern, matched from the start of the
    /// text. It only applies under [`PasswordLevel::Custom`].
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
        self.message = Some(message.into());
        self
    }

    /// The configured tier.
    pub fn level(&self) -> PasswordLevel {
        self.level
    }

    /// Check `text` against the tier.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        let valid = match self.level {
            PasswordLevel::Number => check_number(text),
            PasswordLevel::Normal => check_normal(text),
            PasswordLevel::High => check_high(text),
            PasswordLevel::Any => true,
            PasswordLevel::Custom => self
                .custom
                .as_ref()
                .map_or(true, |re| re.find(text).is_some_and(|m| m.start() == 0)),
        };
        if valid {
            return Ok(());
        }
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| self.level.default_message().to_string());
        Err(ValidationError::message("invalid", message))
    }
}

impl Validator for PasswordValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(&to_text(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_tier() {
        let v = PasswordValidator::new(PasswordLevel::Number);
        assert!(v.check("123456").is_ok());
        assert!(v.check("12345").is_err());
        assert!(v.check("12345a").is_err());
    }

    #[test]
    fn normal_tier() {
        let v = PasswordValidator::new(PasswordLevel::Normal);
        assert!(v.check("abc123").is_ok());
        assert!(v.check("ABC123def").is_ok());
        assert!(v.check("123456").is_err());
        assert!(v.check("abcdef").is_err());
        assert!(v.check("ab12").is_err());
        assert!(v.check("abc123!").is_err());
        assert!(v.check(&"a1".repeat(10)).is_err());
        let err = v.check("abcdef").unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Enter a valid 6-18-digit alphanumeric password"
        );
    }

    #[test]
    fn high_tier() {
        let v = PasswordValidator::new(PasswordLevel::High);
        assert!(v.check("abc123").is_ok());
        assert!(v.check("abc!@#").is_ok());
        assert!(v.check("ABCdef").is_ok());
        assert!(v.check("abcdef").is_err());
        assert!(v.check("!@#$%^").is_err());
        assert!(v.check("abc 123").is_err());
        assert!(v.check("abc(123").is_err());
        assert!(v.check("ab1").is_err());
    }

    #[test]
    fn any_and_custom() {
        assert!(PasswordValidator::new(PasswordLevel::Any).check("").is_ok());
        let v = PasswordValidator::new(PasswordLevel::Custom)
            .with_pattern(r"^x+$")
            .unwrap();
        assert!(v.check("XXX").is_ok());
        assert!(v.check("abc123").is_err());
        assert!(PasswordValidator::new(PasswordLevel::Custom).check("anything").is_ok());
    }

    #[test]
    fn named_tiers_take_precedence_over_a_pattern() {
        let v = PasswordValidator::new(PasswordLevel::Normal)
            .with_pattern(r"^x+$")
            .unwrap();
        assert!(v.check("abc123").is_ok());
        let err = v.check("XXX").unwrap_err();
        assert_eq!(
            err.detail().messages()[0].message,
            "Enter a valid 6-18-digit alphanumeric password"
        );
    }
}
