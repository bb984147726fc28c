//! IPv4 / IPv6 literal validation.

use serde::Deserialize;
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::Validator;

/// Dotted quad of decimal octets, each in `0..=255`.
pub fn check_ipv4(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u16>().is_ok_and(|n| n < 256)
        })
}

/// Colon-separated hex groups.
///
/// At most eight groups, each of one to four hex digits, with at most one
/// `::` compression run. A compression may appear at the start, the middle
/// or the end.
pub fn check_ipv6(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let compressions = value.matches("::").count();
    if compressions > 1 || value.contains(":::") {
        return false;
    }
    let (head, tail) = match value.split_once("::") {
        Some((h, t)) => (h, Some(t)),
        None => (value, None),
    };
    let groups = |s: &str| -> Option<usize> {
        if s.is_empty() {
            return Some(0);
        }
        let mut count = 0;
        for group in s.split(':') {
            if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            count += 1;
        }
        Some(count)
    };
    match (groups(head), tail.map(groups)) {
        (Some(h), None) => h == 8,
        (Some(h), Some(Some(t))) => h + t <= 7,
        _ => false,
    }
}

/// Which address families are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpProtocol {
    /// IPv4 or IPv6.
    #[default]
    Both,
    /// IPv4 only.
    Ipv4,
    /// IPv6 only.
    Ipv6,
}

impl IpProtocol {
    fn default_message(self) -> &'static str {
        match self {
            Self::Both => "Enter a valid IPv4 or IPv6 address",
            Self::Ipv4 => "Enter a valid IPv4 address",
            Self::Ipv6 => "Enter a valid IPv6 address",
        }
    }
}

/// Validates IP address literals.
#[derive(Debug, Clone)]
pub struct IpAddressValidator {
    protocol: IpProtocol,
    message: Option<String>,
}

impl IpAddressValidator {
    /// Accept addresses of the given family.
    pub fn new(protocol: IpProtocol) -> Self {
        Self {
            protocol,
            message: None,
        }
    }

    /// Replace the rejection message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn is_valid(&self, text: &str) -> bool {
        match self.protocol {
            IpProtocol::Ipv4 => check_ipv4(text),
            IpProtocol::Ipv6 => check_ipv6(text),
            IpProtocol::Both => check_ipv4(text) || check_ipv6(text),
        }
    }
}

impl Validator for IpAddressValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let text = to_text(value);
        if text.is_empty() || text.contains('\0') || !self.is_valid(&text) {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| self.protocol.default_message().to_string());
            return Err(ValidationError::message("invalid", message));
        }
        Ok(())
    }
}
