use clap::{Args, Subcommand};
use serde_json::Value;

mod extract;
mod normalize;

#[derive(Debug, Args)]
pub(crate) struct PredicateCommand {
    #[command(subcommand)]
    command: PredicateSubcommand,
}

#[derive(Debug, Subcommand)]
enum PredicateSubcommand {
    Normalize(normalize::NormalizeArgs),
    Extract(extract::ExtractArgs),
}

pub(crate) fn run(command: PredicateCommand) -> Result<(), String> {
    match command.command {
        PredicateSubcommand::Normalize(args) => normalize::run(args),
        PredicateSubcommand::Extract(args) => extract::run(args),
    }
}

fn parse(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|error| format!("predicate is not valid JSON: {error}"))
}

fn print(value: &impl serde::Serialize) -> Result<(), String> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to serialise output: {error}"))?;

    println!("{output}");

    Ok(())
}
