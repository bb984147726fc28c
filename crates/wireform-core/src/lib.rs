//! # wireform-core — Foundational Types for wireform
//!
//! This crate is the leaf of the wireform workspace. It defines the types
//! every other crate speaks in: the validation error tree, the RPC status
//! contract consumed by request-handling layers, source paths, and the
//! instance lookup interface used to read values out of mappings or
//! attribute-bearing objects.
//!
//! ## Key Design Principles
//!
//! 1. **Values are `serde_json::Value`.** Input payloads, validated trees and
//!    representations are all JSON-shaped. The workspace enables
//!    `preserve_order`, so mappings iterate in insertion order.
//!
//! 2. **Absence is not null.** An absent value is `None`; an explicit null is
//!    `Some(Value::Null)`. The two never collapse into each other.
//!
//! 3. **Errors are trees.** [`ErrorDetail`] nests by field name and by list
//!    index and serializes to plain JSON without post-processing.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wireform-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod choices;
pub mod error;
pub mod instance;
pub mod path;
pub mod render;
pub mod status;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use choices::{Choice, ChoiceEntry, ChoiceTable};
pub use error::{ErrorDetail, ErrorMessage, ValidationError};
pub use instance::{Attribute, AttributeSource, Instance, LookupError};
pub use path::{set_value, NotAMapping, SourcePath};
pub use render::render;
pub use status::{RpcError, RpcStatus, StatusCode};
pub use value::{is_truthy, length_of, to_text, type_name};
