//! # Validate Subcommand
//!
//! Validates a JSON payload and prints either the validated tree or the
//! error tree with its RPC status.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde_json::{json, Value};

use wireform_core::StatusCode;
use wireform_schema::{Schema, Serializer};

use crate::source::{read_json, SchemaArgs};

/// Arguments for the validate subcommand.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// JSON payload; `-` reads standard input.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Skip absent fields instead of applying defaults or failing `required`.
    #[arg(long)]
    pub partial: bool,

    /// Treat the payload as a list of objects.
    #[arg(long)]
    pub many: bool,
}

/// Validate the payload and write the result as pretty JSON. Returns
/// whether the payload passed.
pub fn run(args: &ValidateArgs, out: &mut impl Write) -> anyhow::Result<bool> {
    let def = args.schema.load()?;
    let payload = read_json(&args.input)?;

    let (valid, printed) = if args.many {
        let list = Schema::many(&def)
            .partial(args.partial)
            .request_data(payload);
        report(&list)?
    } else {
        let schema = Schema::new(&def).partial(args.partial).request_data(payload);
        report(&schema)?
    };
    tracing::info!(schema = %def.name(), valid, many = args.many, "payload validated");
    serde_json::to_writer_pretty(&mut *out, &printed)?;
    writeln!(out)?;
    Ok(valid)
}

fn report(serializer: &dyn Serializer) -> anyhow::Result<(bool, Value)> {
    if serializer.is_valid() {
        return Ok((true, serializer.validated_data()?.clone()));
    }
    let errors = serializer
        .errors()?
        .map_or(Value::Null, |detail| detail.to_json());
    Ok((
        false,
        json!({
            "status": StatusCode::InvalidArgument.as_str(),
            "code": StatusCode::InvalidArgument.value(),
            "errors": errors,
        }),
    ))
}
