//! Integer and floating-point fields.

use std::sync::Arc;

use serde_json::{Number, Value};

use wireform_core::{Instance, ValidationError};
use wireform_validators::{MaxValueValidator, MinValueValidator, Validator};

use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions};

/// Value bounds shared by both numeric fields.
#[derive(Debug, Clone, Default)]
struct Bounds {
    min: Option<Value>,
    max: Option<Value>,
}

impl Bounds {
    fn validators(&self) -> Vec<Arc<dyn Validator>> {
        let mut implied: Vec<Arc<dyn Validator>> = Vec::new();
        if let Some(max) = &self.max {
            implied.push(Arc::new(MaxValueValidator::new(max.clone())));
        }
        if let Some(min) = &self.min {
            implied.push(Arc::new(MinValueValidator::new(min.clone())));
        }
        implied
    }
}

/// Rejects oversized numeric strings before any parsing is attempted.
fn check_string_length<F: FieldBehavior + ?Sized>(
    field: &F,
    data: &Value,
    ctx: Ctx<'_>,
) -> Result<(), ValidationError> {
    match data {
        Value::String(s) if s.chars().count() > ctx.config.max_string_length => {
            Err(field.fail("max_string_length", ctx, &[]))
        }
        _ => Ok(()),
    }
}

/// Drop a zero fractional part and trailing whitespace: `"1.00 "` → `"1"`.
fn strip_zero_fraction(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rfind('.') {
        Some(dot) if trimmed[dot + 1..].bytes().all(|b| b == b'0') => &trimmed[..dot],
        _ => trimmed,
    }
}

/// Why a text or float is not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotAnInteger {
    Malformed,
    OutOfRange,
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// A whole `f` as a JSON integer. Integers are carried as `i64` or `u64`,
/// so anything outside `-2^63 ..= 2^64 - 1` is out of range.
fn whole_number(f: f64) -> Result<Value, NotAnInteger> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(NotAnInteger::Malformed);
    }
    if (-TWO_POW_63..TWO_POW_63).contains(&f) {
        Ok(Value::from(f as i64))
    } else if (TWO_POW_63..TWO_POW_64).contains(&f) {
        Ok(Value::from(f as u64))
    } else {
        Err(NotAnInteger::OutOfRange)
    }
}

fn parse_integer(text: &str) -> Result<Value, NotAnInteger> {
    let text = strip_zero_fraction(text).trim_start();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
        return Err(NotAnInteger::Malformed);
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(NotAnInteger::Malformed);
    }
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Ok(n) = cleaned.parse::<i64>() {
        return Ok(Value::from(n));
    }
    cleaned
        .parse::<u64>()
        .map(Value::from)
        .map_err(|_| NotAnInteger::OutOfRange)
}

/// A whole number.
///
/// Strings are parsed after dropping a zero-valued fractional suffix, so
/// `"7"`, `"7.0"` and `"7.000 "` all validate to `7` while `"7.5"` fails.
/// Floats with no fractional part are accepted; booleans are not. Values
/// must fit `i64` or `u64`; larger magnitudes fail with `out_of_range`
/// when validating and with [`RepresentationError::IntegerOutOfRange`]
/// when representing.
#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    options: FieldOptions,
    bounds: Bounds,
}

declare_field!(IntegerField);

impl IntegerField {
    /// A new integer field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive upper bound.
    pub fn max_value(mut self, limit: impl Into<Value>) -> Self {
        self.bounds.max = Some(limit.into());
        self.options.implied = self.bounds.validators();
        self
    }

    /// Inclusive lower bound.
    pub fn min_value(mut self, limit: impl Into<Value>) -> Self {
        self.bounds.min = Some(limit.into());
        self.options.implied = self.bounds.validators();
        self
    }
}

impl FieldBehavior for IntegerField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("invalid", "A valid integer is required."),
            ("out_of_range", "Integer value out of range."),
            ("max_string_length", "String value too large."),
        ]
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        check_string_length(self, data, ctx)?;
        let parsed = match data {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
            Value::Number(n) => n.as_f64().map_or(Err(NotAnInteger::Malformed), whole_number),
            Value::String(s) => parse_integer(s),
            _ => Err(NotAnInteger::Malformed),
        };
        parsed.map_err(|reason| match reason {
            NotAnInteger::Malformed => self.fail("invalid", ctx, &[]),
            NotAnInteger::OutOfRange => self.fail("out_of_range", ctx, &[]),
        })
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "integer");
        let converted = match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(None),
            Value::Number(n) => match n.as_f64() {
                Some(f) => whole_number(f.trunc()).map(Some),
                None => Ok(None),
            },
            Value::Bool(b) => Ok(Some(Value::from(i64::from(*b)))),
            Value::String(s) => match parse_integer(s) {
                Err(NotAnInteger::Malformed) => Ok(None),
                other => other.map(Some),
            },
            _ => Ok(None),
        };
        match converted {
            Ok(converted) => Ok(converted.unwrap_or(value)),
            Err(_) => Err(RepresentationError::IntegerOutOfRange {
                value: value.to_string(),
            }),
        }
    }
}

/// A floating-point number. Numeric strings are parsed; booleans are not
/// numbers.
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    options: FieldOptions,
    bounds: Bounds,
}

declare_field!(FloatField);

impl FloatField {
    /// A new float field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive upper bound.
    pub fn max_value(mut self, limit: impl Into<Value>) -> Self {
        self.bounds.max = Some(limit.into());
        self.options.implied = self.bounds.validators();
        self
    }

    /// Inclusive lower bound.
    pub fn min_value(mut self, limit: impl Into<Value>) -> Self {
        self.bounds.min = Some(limit.into());
        self.options.implied = self.bounds.validators();
        self
    }
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

impl FieldBehavior for FloatField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("invalid", "A valid number is required."),
            ("max_string_length", "String value too large."),
        ]
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        check_string_length(self, data, ctx)?;
        let parsed = match data {
            Value::Number(n) => n.as_f64().and_then(float_value),
            Value::String(s) => s.trim().parse::<f64>().ok().and_then(float_value),
            _ => None,
        };
        parsed.ok_or_else(|| self.fail("invalid", ctx, &[]))
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "float");
        let as_float = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        Ok(as_float.and_then(float_value).unwrap_or(value))
    }
}
