//! # ysc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ysc_cli::compile::{run_compile, CompileArgs};
use ysc_cli::symbols::{run_symbols, SymbolsArgs};
use ysc_cli::EXIT_OPERATIONAL_ERROR;

/// YANG Schema Compiler
///
/// Compiles parsed YANG schema trees into JSON Schema documents that
/// validate RESTCONF-style JSON payloads.
#[derive(Parser, Debug)]
#[command(name = "ysc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a schema tree to a JSON Schema document.
    Compile(CompileArgs),

    /// List the typedefs, groupings, and identities of a schema tree.
    Symbols(SymbolsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the document.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("ysc v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Compile(args) => run_compile(&args, cli.config.as_deref()),
        Commands::Symbols(args) => run_symbols(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}
