//! # Represent Subcommand
//!
//! Represents a JSON model instance, or a list of them, and prints the
//! output mapping.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde_json::{Map, Value};

use wireform_schema::{Context, Schema};

use crate::source::{read_json, SchemaArgs};

/// Arguments for the represent subcommand.
#[derive(Args, Debug, Clone)]
pub struct RepresentArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// JSON instance; `-` reads standard input.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Treat the instance as a list of objects.
    #[arg(long)]
    pub many: bool,

    /// JSON object passed to hooks as the call context.
    #[arg(long)]
    pub context: Option<PathBuf>,
}

/// Represent the instance and write it as pretty JSON.
pub fn run(args: &RepresentArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let def = args.schema.load()?;
    let instance = read_json(&args.input)?;
    let context: Context = match &args.context {
        Some(path) => match read_json(path)? {
            Value::Object(map) => map,
            other => anyhow::bail!("context must be a JSON object, got {other}"),
        },
        None => Map::new(),
    };

    let represented = if args.many {
        Schema::many(&def)
            .context(context)
            .instance(&instance)
            .data()?
    } else {
        Schema::new(&def).context(context).instance(&instance).data()?
    };
    tracing::info!(schema = %def.name(), many = args.many, "instance represented");
    serde_json::to_writer_pretty(&mut *out, &represented)?;
    writeln!(out)?;
    Ok(())
}
