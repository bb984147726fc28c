//! # Engine Configuration
//!
//! Process-wide knobs read by every validation and representation call.
//! Loaded from YAML; every key is optional.
//!
//! ```yaml
//! max_string_length: 1000
//! timezone:
//!   input: "+00:00"   # offset assumed for naive datetime input
//!   output: "+08:00"  # offset datetimes are rendered in
//! messages:
//!   required: "Missing."
//! ```

use std::fmt;
use std::path::Path;

use chrono::FixedOffset;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// A fixed UTC offset, written `UTC`, `Z`, `+HH:MM`, `+HHMM` or `+HH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Offset(FixedOffset);

impl Offset {
    /// UTC.
    pub fn utc() -> Self {
        Self(chrono::Offset::fix(&chrono::Utc))
    }

    /// Parse an offset literal.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidTimezone(text.to_string());
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Self::utc());
        }
        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !digits.bytes().all(|b| b.is_ascii_digit()) || ![2, 4].contains(&digits.len()) {
            return Err(invalid());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = if digits.len() == 4 {
            digits[2..].parse().map_err(|_| invalid())?
        } else {
            0
        };
        if minutes >= 60 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// The chrono offset.
    pub fn fixed(&self) -> FixedOffset {
        self.0
    }
}

impl TryFrom<String> for Offset {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Offsets used when parsing and rendering datetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Offset assumed for datetime input without one.
    pub input: Offset,
    /// Offset datetimes are rendered in.
    pub output: Offset,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            input: Offset::utc(),
            output: FixedOffset::east_opt(8 * 3600).map_or_else(Offset::utc, Offset),
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest string accepted by numeric fields before parsing.
    pub max_string_length: usize,
    /// Datetime offsets.
    pub timezone: TimezoneConfig,
    /// Message template overrides by failure kind. Field-level overrides
    /// take precedence.
    pub messages: IndexMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_string_length: 1000,
            timezone: TimezoneConfig::default(),
            messages: IndexMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}
