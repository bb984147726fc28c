//! # Temporal Fields
//!
//! Datetime, date and time fields share one parser and one internal form:
//! an RFC 3339 UTC timestamp string (`2024-05-01T02:30:00Z`). They differ
//! only in the default output format.
//!
//! ## Input
//!
//! - RFC 3339 strings carry their own offset.
//! - Naive datetimes (`2024-05-01 10:30:00`, `2024-05-01T10:30`), dates
//!   (`2024-05-01`, read as midnight) and times (`10:30:00`, anchored to
//!   1970-01-01) are read in the input offset.
//! - Numbers are Unix timestamps in seconds.
//!
//! ## Output
//!
//! Values are parsed the same way, shifted into the output offset and
//! formatted with a `strftime` pattern. Falsy values represent as null; a
//! field without an output format passes values through untouched.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;

use wireform_core::{is_truthy, Instance, ValidationError};

use crate::config::Offset;
use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Which temporal value a field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// Date and time of day.
    DateTime,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
}

impl TemporalKind {
    /// Default `strftime` output pattern.
    pub fn default_format(self) -> &'static str {
        match self {
            Self::DateTime => "%Y-%m-%d %H:%M:%S",
            Self::Date => "%Y-%m-%d",
            Self::Time => "%H:%M:%S",
        }
    }

    /// Short name used in diagnostics and descriptors.
    pub fn name(self) -> &'static str {
        match self {
            Self::DateTime => "datetime",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    fn messages(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::DateTime => &[("invalid", "Datetime has wrong format.")],
            Self::Date => &[("invalid", "Date has wrong format.")],
            Self::Time => &[("invalid", "Time has wrong format.")],
        }
    }
}

/// Parse a temporal input in `input` unless it carries its own offset.
fn parse_instant(value: &Value, input: FixedOffset) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_text(text.trim(), input),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return DateTime::<Utc>::from_timestamp(secs, 0);
            }
            let f = n.as_f64().filter(|f| f.is_finite())?;
            let secs = f.floor();
            let nanos = ((f - secs) * 1e9).round() as u32;
            DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
        }
        _ => None,
    }
}

fn parse_text(text: &str, input: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            let time = NAIVE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())?;
            NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(time))
        })?;
    input
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render `instant` in `offset` with a `strftime` pattern. `None` when the
/// pattern is malformed.
fn format_instant(instant: DateTime<Utc>, offset: FixedOffset, pattern: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(
        out,
        "{}",
        instant.with_timezone(&offset).format_with_items(items.into_iter())
    )
    .ok()?;
    Some(out)
}

/// A datetime, date or time.
#[derive(Debug, Clone)]
pub struct TemporalField {
    options: FieldOptions,
    kind: TemporalKind,
    output_format: Option<String>,
    input_offset: Option<Offset>,
    output_offset: Option<Offset>,
}

declare_field!(TemporalField);

impl TemporalField {
    /// A field of the given kind with its default output format.
    pub fn new(kind: TemporalKind) -> Self {
        Self {
            options: FieldOptions::default(),
            kind,
            output_format: Some(kind.default_format().to_string()),
            input_offset: None,
            output_offset: None,
        }
    }

    /// A datetime field.
    pub fn datetime() -> Self {
        Self::new(TemporalKind::DateTime)
    }

    /// A date field.
    pub fn date() -> Self {
        Self::new(TemporalKind::Date)
    }

    /// A time field.
    pub fn time() -> Self {
        Self::new(TemporalKind::Time)
    }

    /// Replace the output pattern; `None` passes values through.
    pub fn output_format(mut self, format: Option<String>) -> Self {
        self.output_format = format;
        self
    }

    /// Offset for naive input, overriding the engine configuration.
    pub fn input_offset(mut self, offset: Offset) -> Self {
        self.input_offset = Some(offset);
        self
    }

    /// Offset for output, overriding the engine configuration.
    pub fn output_offset(mut self, offset: Offset) -> Self {
        self.output_offset = Some(offset);
        self
    }

    /// The kind of value carried.
    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    fn input(&self, ctx: Ctx<'_>) -> FixedOffset {
        self.input_offset
            .unwrap_or(ctx.config.timezone.input)
            .fixed()
    }

    fn output(&self, ctx: Ctx<'_>) -> FixedOffset {
        self.output_offset
            .unwrap_or(ctx.config.timezone.output)
            .fixed()
    }
}

impl FieldBehavior for TemporalField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        self.kind.messages()
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        let instant =
            parse_instant(data, self.input(ctx)).ok_or_else(|| self.fail("invalid", ctx, &[]))?;
        Ok(Value::String(
            instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ))
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, self.kind.name());
        if !is_truthy(&value) {
            return Ok(Value::Null);
        }
        let Some(pattern) = &self.output_format else {
            return Ok(value);
        };
        let rendered = parse_instant(&value, self.input(ctx))
            .and_then(|instant| format_instant(instant, self.output(ctx), pattern));
        match rendered {
            Some(text) => Ok(Value::String(text)),
            None => {
                tracing::warn!(
                    kind = self.kind.name(),
                    format = %pattern,
                    "temporal value could not be formatted; passing it through"
                );
                Ok(value)
            }
        }
    }
}
