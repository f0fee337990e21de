//! # ysc-core: Foundational Types for the YANG Schema Compiler
//!
//! Defines the input side of the compiler: the parsed YANG schema tree as
//! delivered by an external parser, the `type` statements carried by leafs
//! and typedefs, and the symbol table that makes typedefs, groupings and
//! identities addressable by qualified name.
//!
//! ## Key Design Principles
//!
//! 1. **Closed node variant.** [`NodeKind`] enumerates every YANG statement
//!    the compiler understands. Every `match` over it is exhaustive, so a new
//!    statement kind forces every consumer to handle it.
//!
//! 2. **Read-only input.** The compiler borrows the tree and the
//!    [`SymbolTable`]; it never mutates either. Output is always a fresh tree.
//!
//! 3. **Path-carrying errors.** Every [`CompileError`] names the
//!    [`SchemaPath`] of the construct that caused it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ysc-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod node;
pub mod path;
pub mod symbols;
pub mod types;

// Re-export primary types for ergonomic imports.
pub use error::{CompileError, ReferenceKind};
pub use node::{CompilationUnit, ConfigFlag, NodeKind, SchemaNode};
pub use path::SchemaPath;
pub use symbols::{Grouping, Identity, SymbolTable, Typedef};
pub use types::{BuiltinType, EnumSpec, PatternSpec, TypeSpec};

/// Split a possibly prefixed YANG name into `(prefix, local)`.
///
/// ```
/// assert_eq!(ysc_core::split_qualified("if:name"), (Some("if"), "name"));
/// assert_eq!(ysc_core::split_qualified("name"), (None, "name"));
/// ```
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// The local part of a possibly prefixed YANG name.
pub fn local_name(name: &str) -> &str {
    split_qualified(name).1
}
