//! Unvalidated pass-through values.

use serde_json::Value;

use wireform_core::{Instance, ValidationError};

use crate::error::RepresentationError;
use crate::field::{declare_field, scalar_of, Ctx, FieldBehavior, FieldOptions};

/// Accepts any value, including null, and returns it unchanged in both
/// directions. The default item field of [`ListField`](crate::fields::ListField).
#[derive(Debug, Clone)]
pub struct RawField {
    options: FieldOptions,
}

declare_field!(RawField);

impl Default for RawField {
    fn default() -> Self {
        Self {
            options: FieldOptions {
                allow_null: true,
                ..FieldOptions::default()
            },
        }
    }
}

impl RawField {
    /// A new pass-through field.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldBehavior for RawField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value, _ctx: Ctx<'_>) -> Result<Value, ValidationError> {
        Ok(data.clone())
    }

    fn to_representation(
        &self,
        value: Instance<'_>,
        _ctx: Ctx<'_>,
    ) -> Result<Value, RepresentationError> {
        Ok(scalar_of(value, "raw"))
    }
}
