//! # Check Subcommand
//!
//! Builds every schema of a descriptor document, surfacing authoring
//! mistakes, and prints a summary of the fields.

use std::io::Write;

use clap::Args;
use serde_json::{json, Value};

use wireform_schema::SchemaDef;

use crate::source::SchemaArgs;

/// Arguments for the check subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Build the document and write its summary.
pub fn run(args: &CheckArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let defs = args.schema.load_all()?;
    let summary: Vec<Value> = defs.iter().map(|def| summarize(def)).collect();
    tracing::info!(schemas = defs.len(), "schema document checked");
    serde_json::to_writer_pretty(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(())
}

fn summarize(def: &SchemaDef) -> Value {
    let fields: Vec<Value> = def
        .fields()
        .values()
        .map(|bound| {
            let options = bound.field().options();
            json!({
                "name": bound.name(),
                "type": bound.field().kind(),
                "source": bound.source().to_string(),
                "required": options.is_required(),
                "allow_null": options.allows_null(),
                "has_default": options.has_default(),
                "help_text": options.help_text(),
            })
        })
        .collect();
    json!({
        "name": def.name(),
        "message_type": def.message_type(),
        "fields": fields,
    })
}
