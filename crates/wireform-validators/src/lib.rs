//! # wireform-validators — Leaf Predicates
//!
//! A [`Validator`] inspects one already-converted value and either accepts it
//! or rejects it with a rendered message. Validators hold only their
//! configured limits and message templates, never per-call state, so a
//! single instance is safely shared by every binding of a schema across
//! threads.
//!
//! ## Catalogue
//!
//! | validator | failure kind |
//! |---|---|
//! | [`RegexValidator`], [`validate_integer`] | `invalid` |
//! | [`MinValueValidator`] / [`MaxValueValidator`] | `min_value` / `max_value` |
//! | [`MinLengthValidator`] / [`MaxLengthValidator`] | `min_length` / `max_length` |
//! | [`UrlValidator`], [`EmailValidator`], [`IpAddressValidator`] | `invalid` |
//! | [`PhoneValidator`], [`IdentifierValidator`], [`PasswordValidator`] | `invalid` |
//! | [`DecimalValidator`] | `max_digits`, `max_decimal_places`, `max_whole_digits` |
//! | [`FileExtensionValidator`] | `invalid_extension` |
//!
//! Any `Fn(&Value) -> Result<(), ValidationError>` closure is a validator too.

use serde_json::Value;
use thiserror::Error;

use wireform_core::{ErrorDetail, ErrorMessage, ValidationError};

pub mod decimal;
pub mod email;
pub mod extension;
pub mod ip;
pub mod limits;
pub mod password;
pub mod pattern;
pub mod phone;
pub mod urls;

pub use decimal::DecimalValidator;
pub use email::EmailValidator;
pub use extension::FileExtensionValidator;
pub use ip::{IpAddressValidator, IpProtocol};
pub use limits::{MaxLengthValidator, MaxValueValidator, MinLengthValidator, MinValueValidator};
pub use password::{PasswordLevel, PasswordValidator};
pub use pattern::{validate_integer, RegexValidator};
pub use phone::{IdentifierProtocol, IdentifierValidator, PhoneValidator};
pub use urls::UrlValidator;

/// A pure predicate over a single value.
pub trait Validator: Send + Sync {
    /// Accept `value` or reject it with a validation error.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self(value)
    }
}

/// A validator could not be constructed from its configuration.
#[derive(Error, Debug)]
pub enum ValidatorConfigError {
    /// A user-supplied pattern does not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        /// The rejected pattern.
        pattern: String,
        /// Compiler diagnostic.
        #[source]
        source: regex::Error,
    },
}

/// Run every validator against `value` without stopping at the first
/// failure.
///
/// Leaf messages from all failing validators are concatenated in validator
/// order. A validator that reports a structured (field- or item-keyed) tree
/// is returned as-is when it is the first failure, since such trees cannot
/// be merged into a flat message list.
pub fn run_validators<'v, I>(validators: I, value: &Value) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'v dyn Validator>,
{
    let mut messages: Vec<ErrorMessage> = Vec::new();
    for validator in validators {
        if let Err(err) = validator.validate(value) {
            match err.into_detail() {
                ErrorDetail::Messages(m) => messages.extend(m),
                structured if messages.is_empty() => return Err(ValidationError::new(structured)),
                _ => {}
            }
        }
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::messages(messages))
    }
}
