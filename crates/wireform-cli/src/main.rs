//! # wireform CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;

/// wireform: declarative payload schemas.
///
/// Validates JSON payloads against, and represents JSON instances with,
/// schemas described in YAML.
#[derive(Parser, Debug)]
#[command(name = "wireform", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a payload.
    Validate(wireform_cli::validate::ValidateArgs),
    /// Represent an instance.
    Represent(wireform_cli::represent::RepresentArgs),
    /// Build a schema document and summarize it.
    Check(wireform_cli::check::CheckArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::Validate(args) => {
            if !wireform_cli::validate::run(args, &mut stdout)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Represent(args) => wireform_cli::represent::run(args, &mut stdout)?,
        Commands::Check(args) => wireform_cli::check::run(args, &mut stdout)?,
    }
    Ok(ExitCode::SUCCESS)
}
