//! # wireform-cli — Command-Line Interface
//!
//! Runs YAML-described schemas against JSON files, for authoring and CI.
//!
//! ## Subcommands
//!
//! - `validate`: validate a payload and print the validated tree or the
//!   error tree
//! - `represent`: represent an instance and print the output mapping
//! - `check`: build a schema document and list its fields
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in clap `Args` structs next to each handler.
//! - Handlers write to any `io::Write` and return whether the input passed,
//!   so they can be exercised without a process boundary.
//! - No schema logic here; everything delegates to `wireform-schema`.

pub mod check;
pub mod represent;
pub mod source;
pub mod validate;
