//! # Instance Lookup
//!
//! Values are read out of two kinds of sources: JSON mappings (keyed lookup)
//! and attribute-bearing objects that implement [`AttributeSource`]. An
//! [`Instance`] is either one, and [`Instance::walk`] resolves a dotted source
//! path across any mix of the two.
//!
//! ## Lookup Rules
//!
//! - A mapping is indexed by key; anything else is asked for an attribute.
//! - A null encountered part-way short-circuits the walk to null.
//! - Zero-argument callables returned by an attribute source are invoked
//!   and their result is used in place of the callable.
//! - A missing key or attribute is an error, distinct from an explicit null.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// An object that exposes named attributes.
///
/// Implement this for model types that should be represented without first
/// converting them to JSON.
pub trait AttributeSource {
    /// Look up an attribute by name. `None` means the attribute does not exist.
    fn attribute(&self, name: &str) -> Option<Attribute<'_>>;

    /// Type name used in diagnostics.
    fn type_name(&self) -> &str {
        "object"
    }

    /// A JSON rendering of the whole object, when one exists. Used by fields
    /// that consume the whole instance (wildcard source) but expect a value.
    fn to_value(&self) -> Option<Value> {
        None
    }
}

/// The result of an attribute lookup.
pub enum Attribute<'a> {
    /// An owned value.
    Value(Value),
    /// A value borrowed from the source.
    Borrowed(&'a Value),
    /// A related object.
    Object(&'a dyn AttributeSource),
    /// A sequence of related objects.
    Objects(Vec<&'a dyn AttributeSource>),
    /// A zero-argument callable evaluated lazily during lookup.
    Callable(Box<dyn Fn() -> Attribute<'a> + 'a>),
}

impl fmt::Debug for Attribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Borrowed(v) => f.debug_tuple("Borrowed").field(v).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(&o.type_name()).finish(),
            Self::Objects(o) => f.debug_tuple("Objects").field(&o.len()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// A key or attribute along a source path does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// A mapping has no entry for the key.
    #[error("missing key `{0}`")]
    MissingKey(String),

    /// An object has no attribute with the name.
    #[error("`{owner}` has no attribute `{name}`")]
    MissingAttribute {
        /// Type name of the object that was searched.
        owner: String,
        /// The attribute requested.
        name: String,
    },
}

/// Something values can be read from.
#[derive(Clone)]
pub enum Instance<'a> {
    /// A JSON value. Only objects have entries; other values have no
    /// attributes.
    Value(Cow<'a, Value>),
    /// An attribute-bearing object.
    Object(&'a dyn AttributeSource),
    /// A sequence of attribute-bearing objects.
    Objects(Vec<&'a dyn AttributeSource>),
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(&o.type_name()).finish(),
            Self::Objects(o) => f.debug_tuple("Objects").field(&o.len()).finish(),
        }
    }
}

impl<'a> From<&'a Value> for Instance<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(Cow::Borrowed(value))
    }
}

impl From<Value> for Instance<'static> {
    fn from(value: Value) -> Self {
        Self::Value(Cow::Owned(value))
    }
}

impl<'a> From<&'a dyn AttributeSource> for Instance<'a> {
    fn from(source: &'a dyn AttributeSource) -> Self {
        Self::Object(source)
    }
}

impl<'a> From<Attribute<'a>> for Instance<'a> {
    fn from(attribute: Attribute<'a>) -> Self {
        match attribute {
            Attribute::Value(v) => Self::Value(Cow::Owned(v)),
            Attribute::Borrowed(v) => Self::Value(Cow::Borrowed(v)),
            Attribute::Object(o) => Self::Object(o),
            Attribute::Objects(o) => Self::Objects(o),
            Attribute::Callable(f) => Self::from(f()),
        }
    }
}

impl<'a> Instance<'a> {
    /// An explicit null.
    pub fn null() -> Self {
        Self::Value(Cow::Owned(Value::Null))
    }

    /// Convert any serializable model into a JSON instance.
    pub fn from_serialize<T: Serialize + ?Sized>(model: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Value(Cow::Owned(serde_json::to_value(model)?)))
    }

    /// Returns true for a JSON null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(v) if v.is_null())
    }

    /// Returns true when lookups on this instance are keyed mapping lookups.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Value(v) if v.is_object())
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Value(v) => crate::value::type_name(v).to_string(),
            Self::Object(o) => o.type_name().to_string(),
            Self::Objects(_) => "list".to_string(),
        }
    }

    /// The JSON value behind this instance, if it has one.
    pub fn as_value(&self) -> Option<Cow<'_, Value>> {
        match self {
            Self::Value(v) => Some(Cow::Borrowed(&**v)),
            Self::Object(o) => o.to_value().map(Cow::Owned),
            Self::Objects(items) => items
                .iter()
                .map(|o| o.to_value())
                .collect::<Option<Vec<_>>>()
                .map(|v| Cow::Owned(Value::Array(v))),
        }
    }

    /// Consume the instance and return its JSON value, if it has one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v.into_owned()),
            other => other.as_value().map(Cow::into_owned),
        }
    }

    /// One-step lookup of `name`: a key of a mapping or an attribute of an
    /// object. Callables are evaluated.
    pub fn get(&self, name: &str) -> Option<Instance<'a>> {
        match self {
            Self::Value(Cow::Borrowed(v)) => {
                let v: &'a Value = *v;
                v.as_object()?
                    .get(name)
                    .map(|child| Self::Value(Cow::Borrowed(child)))
            }
            Self::Value(Cow::Owned(v)) => v
                .as_object()?
                .get(name)
                .map(|child| Self::Value(Cow::Owned(child.clone()))),
            Self::Object(o) => {
                let o: &'a dyn AttributeSource = *o;
                o.attribute(name).map(Instance::from)
            }
            Self::Objects(_) => None,
        }
    }

    /// Resolve a dotted path. An empty path returns the instance itself.
    pub fn walk(&self, attrs: &[String]) -> Result<Instance<'a>, LookupError> {
        let mut current = self.clone();
        for attr in attrs {
            if current.is_null() {
                return Ok(Self::null());
            }
            current = match current.get(attr) {
                Some(next) => next,
                None if current.is_mapping() => return Err(LookupError::MissingKey(attr.clone())),
                None => {
                    return Err(LookupError::MissingAttribute {
                        owner: current.type_name(),
                        name: attr.clone(),
                    })
                }
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Profile {
        city: Value,
    }

    impl AttributeSource for Profile {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "city" => Some(Attribute::Borrowed(&self.city)),
                _ => None,
            }
        }

        fn type_name(&self) -> &str {
            "Profile"
        }
    }

    struct User {
        name: String,
        profile: Profile,
    }

    impl AttributeSource for User {
        fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
            match name {
                "name" => Some(Attribute::Value(json!(self.name))),
                "profile" => Some(Attribute::Object(&self.profile)),
                "display" => Some(Attribute::Callable(Box::new(move || {
                    Attribute::Value(json!(format!("<{}>", self.name)))
                }))),
                _ => None,
            }
        }

        fn type_name(&self) -> &str {
            "User"
        }
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn walks_mappings() {
        let data = json!({"profile": {"city": "NY"}});
        let inst = Instance::from(&data);
        let found = inst.walk(&path("profile.city")).unwrap();
        assert_eq!(found.into_value(), Some(json!("NY")));
    }

    #[test]
    fn missing_key_is_not_null() {
        let data = json!({"profile": {"city": null}});
        let inst = Instance::from(&data);
        assert!(inst.walk(&path("profile.city")).unwrap().is_null());
        assert_eq!(
            inst.walk(&path("profile.zip")).unwrap_err(),
            LookupError::MissingKey("zip".to_string())
        );
    }

    #[test]
    fn null_short_circuits() {
        let data = json!({"profile": null});
        let inst = Instance::from(&data);
        assert!(inst.walk(&path("profile.city.name")).unwrap().is_null());
    }

    #[test]
    fn walks_objects_and_callables() {
        let user = User {
            name: "ada".to_string(),
            profile: Profile { city: json!("London") },
        };
        let inst = Instance::Object(&user);
        assert_eq!(
            inst.walk(&path("profile.city")).unwrap().into_value(),
            Some(json!("London"))
        );
        assert_eq!(
            inst.walk(&path("display")).unwrap().into_value(),
            Some(json!("<ada>"))
        );
        let err = inst.walk(&path("profile.zip")).unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingAttribute {
                owner: "Profile".to_string(),
                name: "zip".to_string()
            }
        );
    }

    #[test]
    fn scalars_have_no_attributes() {
        let inst = Instance::from(json!(5));
        assert!(matches!(
            inst.walk(&path("x")),
            Err(LookupError::MissingAttribute { .. })
        ));
        assert_eq!(inst.walk(&[]).unwrap().into_value(), Some(json!(5)));
    }

    #[test]
    fn serializable_models_become_mappings() {
        #[derive(Serialize)]
        struct Row {
            id: u32,
        }
        let inst = Instance::from_serialize(&Row { id: 7 }).unwrap();
        assert!(inst.is_mapping());
        assert_eq!(inst.get("id").and_then(Instance::into_value), Some(json!(7)));
    }
}
