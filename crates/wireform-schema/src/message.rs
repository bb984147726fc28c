//! # Message Bridge
//!
//! Turns a representation mapping into a typed protocol message. Any
//! `serde::Deserialize` type can be a message target; unknown keys in the
//! representation are ignored as long as the type does not opt into
//! `#[serde(deny_unknown_fields)]`.
//!
//! A schema names its target type at definition time
//! ([`SchemaBuilder::message`](crate::SchemaBuilder::message)). Requesting a
//! message from a schema without that declaration fails with
//! [`ConfigError::MissingMessageType`](crate::ConfigError::MissingMessageType)
//! when the message is first requested, not when the schema is built.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A protocol message buildable from a representation mapping.
pub trait Message: DeserializeOwned {
    /// Fully qualified message name, e.g. `user.v1.User`.
    const TYPE_NAME: &'static str;

    /// Decode a representation, ignoring unrecognised keys.
    fn from_representation(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
