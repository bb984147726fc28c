//! # URL Validation
//!
//! A URL is accepted when:
//!
//! 1. its scheme is in the allow-list (`http`, `https`, `ftp`, `ftps` by
//!    default, compared case-insensitively);
//! 2. it matches the URL grammar below, either as given or after converting
//!    an internationalized host to its ASCII (punycode) form;
//! 3. a bracketed host is a well-formed IPv6 literal;
//! 4. its authority (`user:pass@host:port`) is at most 253 characters.
//!
//! The grammar accepts dotted IPv4, bracketed IPv6, `localhost`, and host
//! names made of labels of 1-63 characters that neither start nor end with
//! a dash, followed by a top-level label of letters or a punycode label.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use wireform_core::{to_text, ValidationError};

use crate::ip::check_ipv6;
use crate::pattern::builtin;
use crate::Validator;

/// Characters above ASCII accepted in host labels.
const UL: &str = r"\x{00a1}-\x{ffff}";

/// Longest accepted authority segment.
const MAX_NETLOC: usize = 253;

static URL: OnceLock<Option<Regex>> = OnceLock::new();

fn url_pattern() -> String {
    let ipv4 = r"(?:25[0-5]|2[0-4]\d|[0-1]?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|[0-1]?\d?\d)){3}";
    let ipv6 = r"\[[0-9a-f:.]+\]";
    let label = format!(r"[a-z{UL}0-9](?:[a-z{UL}0-9-]{{0,61}}[a-z{UL}0-9])?");
    let tld = format!(r"\.(?:[a-z{UL}][a-z{UL}-]{{0,61}}[a-z{UL}]|xn--[a-z0-9]{{1,59}})\.?");
    let host = format!(r"(?:{label}(?:\.{label})*{tld}|localhost)");
    format!(
        r"(?i)^[a-z0-9.+\-]*://(?:\S+(?::\S*)?@)?(?:{ipv4}|{ipv6}|{host})(?::\d{{2,5}})?(?:[/?#]\S*)?\z"
    )
}

/// Byte range of the authority segment, if the value has one.
fn netloc_range(value: &str) -> Option<(usize, usize)> {
    let start = value.find("://")? + 3;
    let end = value[start..]
        .find(['/', '?', '#'])
        .map_or(value.len(), |i| start + i);
    Some((start, end))
}

/// The inside of a `[...]` host with an optional 2-5 digit port.
fn bracketed_host(netloc: &str) -> Option<&str> {
    let inner = netloc.strip_prefix('[')?;
    let close = inner.rfind(']')?;
    let (host, tail) = (&inner[..close], &inner[close + 1..]);
    if host.is_empty() {
        return None;
    }
    match tail.strip_prefix(':') {
        None if tail.is_empty() => Some(host),
        Some(port)
            if (2..=5).contains(&port.len()) && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Some(host)
        }
        _ => None,
    }
}

/// Rewrite the host of `value` to its ASCII form.
fn to_ascii_host(value: &str) -> Option<String> {
    let (start, end) = netloc_range(value)?;
    let netloc = &value[start..end];
    let (userinfo, hostport) = match netloc.rsplit_once('@') {
        Some((user, rest)) => (Some(user), rest),
        None => (None, netloc),
    };
    let (host, port) = match hostport.rsplit_once(':') {
        Some((h, p)) if !h.starts_with('[') && p.bytes().all(|b| b.is_ascii_digit()) => {
            (h, Some(p))
        }
        _ => (hostport, None),
    };
    let ascii = match url::Host::parse(host).ok()? {
        url::Host::Domain(domain) => domain,
        other => other.to_string(),
    };

    let mut out = String::with_capacity(value.len());
    out.push_str(&value[..start]);
    if let Some(user) = userinfo {
        out.push_str(user);
        out.push('@');
    }
    out.push_str(&ascii);
    if let Some(port) = port {
        out.push(':');
        out.push_str(port);
    }
    out.push_str(&value[end..]);
    Some(out)
}

/// Validates absolute URLs.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    schemes: Vec<String>,
    message: String,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    /// Default rejection message.
    pub const MESSAGE: &'static str = "Enter a valid URL";

    /// Accept `http`, `https`, `ftp` and `ftps` URLs.
    pub fn new() -> Self {
        Self {
            schemes: ["http", "https", "ftp", "ftps"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Replace the scheme allow-list.
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes = schemes
            .into_iter()
            .map(|s| s.into().to_lowercase())
            .collect();
        self
    }

    /// Replace the rejection message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn fail(&self) -> ValidationError {
        ValidationError::message("invalid", self.message.clone())
    }

    fn matches(text: &str) -> bool {
        static PATTERN: OnceLock<String> = OnceLock::new();
        let pattern = PATTERN.get_or_init(url_pattern);
        builtin(&URL, pattern).is_some_and(|re| re.is_match(text))
    }

    /// Check `text` against the URL rules.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        let scheme = text.split("://").next().unwrap_or_default().to_lowercase();
        if !self.schemes.iter().any(|s| *s == scheme) {
            return Err(self.fail());
        }

        if !Self::matches(text) {
            if text.is_empty() {
                return Err(self.fail());
            }
            let ascii = to_ascii_host(text).ok_or_else(|| self.fail())?;
            if !Self::matches(&ascii) {
                return Err(self.fail());
            }
        } else if let Some((start, end)) = netloc_range(text) {
            if let Some(host) = bracketed_host(&text[start..end]) {
                if !check_ipv6(host) {
                    return Err(self.fail());
                }
            }
        }

        if let Some((start, end)) = netloc_range(text) {
            if text[start..end].chars().count() > MAX_NETLOC {
                return Err(self.fail());
            }
        }
        Ok(())
    }
}

impl Validator for UrlValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(&to_text(value))
    }
}
