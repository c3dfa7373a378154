//! Compile a JSON list of card records and print the abilities as JSON.
//!
//! ```text
//! compile_cards cards.json [--strict]
//! ```
//!
//! Rejected abilities are logged to stderr (`RUST_LOG=rust_lore=debug` for
//! more detail). With `--strict` the exit code is non-zero when any ability
//! was rejected.

use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rust_lore::abilities::AbilityDefinition;
use rust_lore::cards::{CardId, CardRecord};
use rust_lore::compiler::Compiler;

#[derive(Serialize)]
struct CompiledCard<'a> {
    id: CardId,
    name: String,
    abilities: &'a [AbilityDefinition],
    rejected: Vec<String>,
    unmatched: Vec<String>,
}

fn run(path: &str) -> Result<(String, usize), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<CardRecord> = serde_json::from_str(&raw)?;
    let compiler = Compiler::try_new()?;

    let compiled: Vec<_> = records
        .iter()
        .map(|record| (record, compiler.compile_with_diagnostics(record)))
        .collect();
    let rejected = compiled.iter().map(|(_, c)| c.diagnostics.len()).sum();

    let output: Vec<CompiledCard> = compiled
        .iter()
        .map(|(record, compilation)| CompiledCard {
            id: record.id,
            name: record.display_name(),
            abilities: &compilation.abilities,
            rejected: compilation.diagnostics.iter().map(ToString::to_string).collect(),
            unmatched: compilation.unmatched.iter().map(ToString::to_string).collect(),
        })
        .collect();
    tracing::info!(cards = records.len(), rejected, "compiled catalog");
    Ok((serde_json::to_string_pretty(&output)?, rejected))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_lore=warn,compile_cards=info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let strict = args.iter().any(|a| a == "--strict");
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("usage: compile_cards <cards.json> [--strict]");
        return ExitCode::from(2);
    };

    match run(path) {
        Ok((json, rejected)) => {
            println!("{json}");
            if strict && rejected > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            tracing::error!(%error, path = %path, "compile failed");
            ExitCode::FAILURE
        }
    }
}
