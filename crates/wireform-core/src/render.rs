//! # Message Templates
//!
//! Error messages are stored as templates with `{name}` placeholders and
//! rendered once at the point of failure.

use std::fmt::Display;

/// Substitute every `{name}` placeholder in `template` with its parameter.
///
/// The template is scanned once, so substituted values are never expanded
/// again.
///
/// Unknown placeholders are left untouched so that a template overridden by
/// a caller never fails to render.
///
/// ```
/// use wireform_core::render;
/// let msg = render("\"{input}\" is not a valid choice.", &[("input", &"9")]);
/// assert_eq!(msg, "\"9\" is not a valid choice.");
/// ```
pub fn render(template: &str, params: &[(&str, &dyn Display)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(&value.to_string());
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_multiple_placeholders() {
        let msg = render(
            "Ensure this value has at most {limit_value} character (it has {show_value})",
            &[("limit_value", &3), ("show_value", &5)],
        );
        assert_eq!(msg, "Ensure this value has at most 3 character (it has 5)");
    }

    #[test]
    fn unknown_placeholders_survive() {
        assert_eq!(render("{missing} here", &[("x", &1)]), "{missing} here");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let msg = render(
            "\"{input}\" is not a valid choice ({limit}).",
            &[("input", &"{limit}"), ("limit", &3)],
        );
        assert_eq!(msg, "\"{limit}\" is not a valid choice (3).");
        assert_eq!(render("{{a}} {a}", &[("a", &"{a}")]), "{{a}} {a}");
        assert_eq!(render("open { only", &[("a", &1)]), "open { only");
    }
}
