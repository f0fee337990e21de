//! # ysc-compiler: YANG to JSON Schema Compilation
//!
//! Turns a parsed YANG [`CompilationUnit`] into a JSON Schema [`Document`]
//! that validates RESTCONF-style JSON payloads.
//!
//! ## Pipeline
//!
//! 1. [`SymbolTable::from_unit`] indexes every typedef, grouping and identity.
//! 2. The [`TreeBuilder`] walks each selected module depth-first. It calls
//!    the [`Resolver`] for typedef chains and `uses` expansion, [`classify`]
//!    for config inheritance, and the [`TypeMapper`] for leaf types.
//! 3. [`assemble`] merges the modules under one root, applies
//!    [`strip_namespaces`] when asked, and adds the `$schema` envelope.
//!
//! Every stage is a pure function of the unit and the [`CompileOptions`]:
//! compiling the same input twice yields byte-identical output. The first
//! error aborts the compilation and no document is produced.
//!
//! ## Crate Policy
//!
//! - Depends only on `ysc-core` internally.
//! - No I/O besides [`write_document`], which writes to a caller's sink.
//! - No global state; the symbol table and resolution stacks live for one
//!   call.

pub mod assemble;
pub mod builder;
pub mod classify;
pub mod constraint;
pub mod leafref;
pub mod normalize;
pub mod options;
pub mod output;
pub mod resolve;
pub mod types;

pub use assemble::{assemble, write_document, Document};
pub use builder::{ModuleSchema, ObjectBody, TreeBuilder};
pub use classify::classify;
pub use normalize::strip_namespaces;
pub use options::{CompileOptions, ConfigPolicy, Encoding, Layout, OptionParseError, SchemaDraft};
pub use output::{Items, JsonSchemaNode, JsonType, Properties};
pub use resolve::{ResolvedType, Resolver, Visiting};
pub use types::{LeafrefResolver, TypeMapper};

use ysc_core::{CompilationUnit, CompileError, ReferenceKind, SchemaPath, SymbolTable};

/// Compile `unit` to a JSON Schema document.
///
/// `root` names the module to compile, by name or prefix. With `None`, every
/// module of the unit is compiled into one document; their top-level nodes
/// must not collide. Definitions from every module are visible either way.
///
/// # Errors
///
/// Any [`CompileError`]; [`CompileError::UnresolvedReference`] of kind
/// [`ReferenceKind::Root`] when `root` names no module.
pub fn compile(unit: &CompilationUnit, root: Option<&str>, options: &CompileOptions) -> Result<Document, CompileError> {
    let table = SymbolTable::from_unit(unit)?;
    let selected = match root {
        Some(name) => vec![unit
            .module(name)
            .ok_or_else(|| CompileError::unresolved(ReferenceKind::Root, name, &SchemaPath::root()))?],
        None => unit.modules.iter().collect(),
    };
    tracing::info!(
        modules = selected.len(),
        draft = %options.draft,
        config_only = options.config_only,
        "compiling schema"
    );

    let builder = TreeBuilder::new(unit, &table, options);
    let built = selected
        .iter()
        .map(|module| builder.build_module(module))
        .collect::<Result<Vec<_>, _>>()?;

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| selected.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", "));
    assemble(built, title, options)
}
