//! # Fixed-Point Precision
//!
//! A decimal literal is decomposed into its significant digit tuple and a
//! base-ten exponent, the same decomposition a decimal arithmetic library
//! uses:
//!
//! ```text
//! "123.45"  → digits (1,2,3,4,5), exponent -2
//! "0.0012"  → digits (1,2),       exponent -4
//! "1.20"    → digits (1,2,0),     exponent -2
//! "12e3"    → digits (1,2),       exponent  3
//! ```
//!
//! Leading zeros are not part of the tuple. When the fractional places
//! outnumber the significant digits, every place past the decimal point is
//! counted as a digit; zeros before the point never are, so that
//! `max_digits == decimal_places` stays satisfiable.

use serde_json::Value;

use wireform_core::{render, to_text, ValidationError};

use crate::Validator;

/// Significant digits and exponent of a decimal literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalParts {
    /// Significant digits, without leading zeros. `[0]` for zero.
    pub digits: Vec<u8>,
    /// Power of ten applied to the digit tuple.
    pub exponent: i64,
}

impl DecimalParts {
    /// Parse a finite decimal literal: optional sign, digits with an optional
    /// fractional part, optional `e`/`E` exponent.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
        let (mantissa, exp) = match unsigned.find(['e', 'E']) {
            Some(i) => (&unsigned[..i], unsigned[i + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut digits: Vec<u8> = whole
            .bytes()
            .chain(frac.bytes())
            .map(|b| b - b'0')
            .skip_while(|d| *d == 0)
            .collect();
        if digits.is_empty() {
            digits.push(0);
        }
        let exponent = exp.checked_sub(i64::try_from(frac.len()).ok()?)?;
        Some(Self { digits, exponent })
    }

    /// Total digit count, fractional places and whole digits.
    pub fn counts(&self) -> (u64, u64, u64) {
        let significant = self.digits.len() as u64;
        if self.exponent >= 0 {
            let digits = significant + self.exponent.unsigned_abs();
            return (digits, 0, digits);
        }
        let decimals = self.exponent.unsigned_abs();
        let digits = significant.max(decimals);
        (digits, decimals, digits - decimals)
    }
}

/// Bounds the precision of a decimal value.
#[derive(Debug, Clone)]
pub struct DecimalValidator {
    max_digits: Option<u64>,
    decimal_places: Option<u64>,
}

impl DecimalValidator {
    /// Limit total digits and fractional places. `None` disables a bound.
    pub fn new(max_digits: Option<u64>, decimal_places: Option<u64>) -> Self {
        Self {
            max_digits,
            decimal_places,
        }
    }
}

impl Validator for DecimalValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let parts = DecimalParts::parse(&to_text(value))
            .ok_or_else(|| ValidationError::message("invalid", "A valid number is required."))?;
        let (digits, decimals, whole) = parts.counts();

        if let Some(max) = self.max_digits {
            if digits > max {
                return Err(ValidationError::message(
                    "max_digits",
                    render(
                        "Ensure that there are no more than {max} digit in total",
                        &[("max", &max)],
                    ),
                ));
            }
        }
        if let Some(places) = self.decimal_places {
            if decimals > places {
                return Err(ValidationError::message(
                    "max_decimal_places",
                    render(
                        "Ensure that there are no more than {max} decimal place",
                        &[("max", &places)],
                    ),
                ));
            }
        }
        if let (Some(max), Some(places)) = (self.max_digits, self.decimal_places) {
            let allowed = max.saturating_sub(places);
            if whole > allowed {
                return Err(ValidationError::message(
                    "max_whole_digits",
                    render(
                        "Ensure that there are no more than {max} digit before the decimal point",
                        &[("max", &allowed)],
                    ),
                ));
            }
        }
        Ok(())
    }
}
