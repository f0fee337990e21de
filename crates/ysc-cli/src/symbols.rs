//! # Symbols Subcommand
//!
//! `ysc symbols <TREE>` prints the definitions the compiler would see:
//! typedefs with their base type, groupings with their node count, and
//! identities with their bases. Useful for checking how bare names in a
//! tree will qualify before compiling it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ysc_core::SymbolTable;

use crate::{load_unit, EXIT_COMPILE_ERROR, EXIT_OK};

/// Arguments for `ysc symbols`.
#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Parsed schema tree (JSON, or YAML for `.yaml`/`.yml` files).
    pub tree: PathBuf,
}

/// Execute the symbols subcommand.
pub fn run_symbols(args: &SymbolsArgs) -> Result<u8> {
    let unit = load_unit(&args.tree)?;
    let table = match SymbolTable::from_unit(&unit) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(tree = %args.tree.display(), "{e}");
            return Ok(EXIT_COMPILE_ERROR);
        }
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_symbols(&table, &mut out).context("failed to write symbol listing")?;
    Ok(EXIT_OK)
}

/// Write the listing for `table`, one definition per line.
pub fn write_symbols<W: Write>(table: &SymbolTable, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "typedefs:")?;
    for typedef in table.typedefs() {
        writeln!(out, "  {} -> {}", typedef.name, typedef.type_spec.name)?;
    }
    writeln!(out, "groupings:")?;
    for grouping in table.groupings() {
        writeln!(out, "  {} ({} nodes)", grouping.name, grouping.children.len())?;
    }
    writeln!(out, "identities:")?;
    for identity in table.identities() {
        if identity.bases.is_empty() {
            writeln!(out, "  {}", identity.name)?;
        } else {
            writeln!(out, "  {} : {}", identity.name, identity.bases.join(", "))?;
        }
    }
    out.flush()
}
