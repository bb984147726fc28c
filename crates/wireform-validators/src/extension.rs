//! File-name extension allow-lists.

use std::path::Path;

use serde_json::Value;

use wireform_core::{render, to_text, ValidationError};

use crate::Validator;

/// Accepts file names whose extension is in an allow-list.
///
/// Extensions are compared lower-cased and without the leading dot. A value
/// may be a bare file name or an object with a `name` entry.
#[derive(Debug, Clone)]
pub struct FileExtensionValidator {
    allowed: Option<Vec<String>>,
    message: String,
}

impl FileExtensionValidator {
    /// Default message template.
    pub const MESSAGE: &'static str = "File extension '{extension}' is not allowed. \
                                       Allowed extensions are: '{allowed_extensions}'.";

    /// Allow only the listed extensions.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(
                allowed
                    .into_iter()
                    .map(|e| e.into().to_lowercase())
                    .collect(),
            ),
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Allow any extension.
    pub fn any() -> Self {
        Self {
            allowed: None,
            message: Self::MESSAGE.to_string(),
        }
    }

    /// Replace the message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl Validator for FileExtensionValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let Some(allowed) = &self.allowed else {
            return Ok(());
        };
        let name = match value.get("name") {
            Some(name) => to_text(name),
            None => to_text(value),
        };
        let extension = extension_of(&name);
        if allowed.iter().any(|a| *a == extension) {
            return Ok(());
        }
        let msg = render(
            &self.message,
            &[
                ("extension", &extension),
                ("allowed_extensions", &allowed.join(", ")),
            ],
        );
        Err(ValidationError::message("invalid_extension", msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allow_list() {
        let v = FileExtensionValidator::new(["png", "JPG"]);
        assert!(v.validate(&json!("photo.PNG")).is_ok());
        assert!(v.validate(&json!({"name": "scan.jpg"})).is_ok());
        let err = v.validate(&json!("notes.txt")).unwrap_err();
        assert_eq!(err.codes(), vec!["invalid_extension"]);
        assert_eq!(
            err.detail().messages()[0].message,
            "File extension 'txt' is not allowed. Allowed extensions are: 'png, jpg'."
        );
        assert!(v.validate(&json!("README")).is_err());
    }

    #[test]
    fn unrestricted() {
        assert!(FileExtensionValidator::any().validate(&json!("x.exe")).is_ok());
    }
}
