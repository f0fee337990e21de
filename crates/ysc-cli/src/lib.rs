//! # ysc-cli: YANG Schema Compiler Command-Line Interface
//!
//! Provides the `ysc` binary. Reads a parsed YANG schema tree (JSON or YAML,
//! as produced by the external parser), compiles it with `ysc-compiler`, and
//! writes the JSON Schema document.
//!
//! ## Subcommands
//!
//! - `ysc compile`: Compile a tree to a JSON Schema document.
//! - `ysc symbols`: List the typedefs, groupings, and identities of a tree.
//!
//! ```bash
//! ysc compile example-system.yaml --root sys --config-only --out system.schema.json
//! ysc --config ysc.yaml compile example-system.json --strip-namespaces
//! ysc symbols example-system.yaml
//! ```
//!
//! ## Exit Codes
//!
//! - `0` success
//! - `1` compile error (cycle, unresolved reference, invalid constraint, ...)
//! - `2` operational error (unreadable input, malformed tree, write failure)
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; compilation logic lives in `ysc-compiler`.
//! - No document is written when compilation fails.

pub mod compile;
pub mod config;
pub mod symbols;

use std::path::Path;

use anyhow::{Context, Result};
use ysc_core::CompilationUnit;

/// Process exit code for success.
pub const EXIT_OK: u8 = 0;
/// Process exit code for a compile error.
pub const EXIT_COMPILE_ERROR: u8 = 1;
/// Process exit code for an I/O or input-format error.
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;

/// Load a schema tree. Files ending in `.yaml` or `.yml` are read as YAML,
/// everything else as JSON.
pub fn load_unit(path: &Path) -> Result<CompilationUnit> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read schema tree: {}", path.display()))?;
    let unit: CompilationUnit = if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("failed to parse YAML tree: {}", path.display()))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("failed to parse JSON tree: {}", path.display()))?
    };
    tracing::debug!(path = %path.display(), modules = unit.modules.len(), "loaded schema tree");
    Ok(unit)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}
