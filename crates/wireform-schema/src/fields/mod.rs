//! # Field Catalogue
//!
//! Concrete field types. Each one carries a [`FieldOptions`] block plus its
//! own type-specific options, and is converted into a [`Field`] with `into()`
//! when registered on a schema builder.
//!
//! [`FieldOptions`]: crate::field::FieldOptions
//! [`Field`]: crate::field::Field

mod boolean;
mod choice;
mod list;
mod method;
mod nested;
mod numeric;
mod raw;
mod string;
mod temporal;

pub use self::boolean::{BooleanField, NullBooleanField};
pub use self::choice::ChoiceField;
pub use self::list::ListField;
pub use self::method::{MethodField, MethodFn};
pub(crate) use self::method::default_method_name;
pub use self::nested::NestedField;
pub use self::numeric::{FloatField, IntegerField};
pub use self::raw::RawField;
pub use self::string::CharField;
pub use self::temporal::{TemporalField, TemporalKind};
