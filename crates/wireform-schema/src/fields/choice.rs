//! Enumerated values.

use serde_json::Value;

use wireform_core::{to_text, Choice, ChoiceTable, Instance, ValidationError};

use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions};

/// A value drawn from a declared choice table.
///
/// Input is matched by its text form against the text form of each declared
/// key, so `"2"` and `2` both select the key `2`, and the validated value is
/// the declared key itself.
#[derive(Debug, Clone)]
pub struct ChoiceField {
    options: FieldOptions,
    choices: ChoiceTable,
    allow_blank: bool,
}

declare_field!(ChoiceField);

impl ChoiceField {
    /// A field accepting the given choices.
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            options: FieldOptions::default(),
            choices: ChoiceTable::new(choices),
            allow_blank: false,
        }
    }

    /// Accept the empty string as-is.
    pub fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// The choice table.
    pub fn choices(&self) -> &ChoiceTable {
        &self.choices
    }
}

impl FieldBehavior for ChoiceField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn default_messages(&self) -> &'static [(&'static str, &'static str)] {
        &[("invalid_choice", "\"{input}\" is not a valid choice.")]
    }

    fn to_internal_value(&self, data: &Value, ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        if self.allow_blank && data.as_str() == Some("") {
            return Ok(data.clone());
        }
        let text = to_text(data);
        match self.choices.resolve(&text) {
            Some(key) => Ok(key.clone()),
            None => Err(self.fail("invalid_choice", ctx, &[("input", &text)])),
        }
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        let value = scalar_of(value, "choice");
        if value.as_str() == Some("") {
            return Ok(value);
        }
        Ok(self
            .choices
            .resolve(&to_text(&value))
            .cloned()
            .unwrap_or(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Step};
    use serde_json::json;

    fn numbered() -> Field {
        Field::from(ChoiceField::new([
            Choice::pair(1, "First"),
            Choice::pair(2, "Second"),
        ]))
    }

    #[test]
    fn resolves_by_text() {
        let field = numbered();
        assert_eq!(
            field.run_validation(Some(&json!("2"))).unwrap(),
            Step::Value(json!(2))
        );
        assert_eq!(
            field.run_validation(Some(&json!(1))).unwrap(),
            Step::Value(json!(1))
        );
    }

    #[test]
    fn unknown_choice_echoes_input() {
        let err = numbered().run_validation(Some(&json!("9"))).unwrap_err();
        assert_eq!(err.codes(), vec!["invalid_choice"]);
        assert_eq!(err.detail().messages()[0].message, "\"9\" is not a valid choice.");
    }

    #[test]
    fn grouped_choices_are_flattened() {
        let field = Field::from(ChoiceField::new([
            Choice::group("Audio", vec![Choice::pair("mp3", "MP3"), Choice::pair("ogg", "OGG")]),
            Choice::single("other"),
        ]));
        assert!(field.run_validation(Some(&json!("ogg"))).is_ok());
        assert!(field.run_validation(Some(&json!("other"))).is_ok());
        assert!(field.run_validation(Some(&json!("Audio"))).is_err());
    }

    #[test]
    fn blank() {
        assert!(numbered().run_validation(Some(&json!(""))).is_err());
        let field = Field::from(ChoiceField::new([Choice::single("a")]).allow_blank(true));
        assert_eq!(
            field.run_validation(Some(&json!(""))).unwrap(),
            Step::Value(json!(""))
        );
    }

    #[test]
    fn representation() {
        let field = numbered();
        assert_eq!(field.to_representation(&json!("1")).unwrap(), json!(1));
        assert_eq!(field.to_representation(&json!(7)).unwrap(), json!(7));
        assert_eq!(field.to_representation(&json!("")).unwrap(), json!(""));
    }
}
