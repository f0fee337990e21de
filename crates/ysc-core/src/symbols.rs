//! # Symbol Table
//!
//! Maps qualified names to the typedef, grouping, and identity definitions of
//! a compilation unit. Built once by walking every module, immutable after
//! construction.
//!
//! ## Name Qualification
//!
//! Definitions are keyed `prefix:local`. A definition written with a bare name
//! is qualified with the prefix of the module that contains it. Lookups try,
//! in order:
//!
//! 1. the reference exactly as written;
//! 2. for a bare reference, the reference qualified with the caller's scope;
//! 3. for a bare reference, the single definition whose local part matches.
//!
//! An ambiguous bare reference (several definitions share the local name and
//! none is in scope) does not resolve.

use std::collections::BTreeMap;

use crate::error::{CompileError, ReferenceKind};
use crate::node::{CompilationUnit, NodeKind, SchemaNode};
use crate::types::TypeSpec;

/// A `typedef` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    /// Qualified name.
    pub name: String,
    /// Name of the defining module.
    pub module: String,
    /// Prefix of the defining module; scope for references inside `type_spec`.
    pub scope: String,
    /// The base type statement.
    pub type_spec: TypeSpec,
    /// The typedef's `description`.
    pub description: Option<String>,
}

/// A `grouping` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    /// Qualified name.
    pub name: String,
    /// Prefix of the defining module; scope for `uses` and types inside it.
    pub scope: String,
    /// The grouping body, unexpanded.
    pub children: Vec<SchemaNode>,
}

/// An `identity` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Qualified name.
    pub name: String,
    /// Name of the defining module, which qualifies the identity in instance
    /// data (`module-name:identity`).
    pub module: String,
    /// Prefix of the defining module.
    pub scope: String,
    /// Qualified names of the direct bases.
    pub bases: Vec<String>,
}

impl Identity {
    /// The identity's name without its prefix.
    pub fn local_name(&self) -> &str {
        crate::local_name(&self.name)
    }
}

/// Qualified-name index over a compilation unit's definitions.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    typedefs: BTreeMap<String, Typedef>,
    groupings: BTreeMap<String, Grouping>,
    identities: BTreeMap<String, Identity>,
}

/// Qualify `name` with `scope` unless it already carries a prefix.
pub fn qualify(name: &str, scope: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{scope}:{name}")
    }
}

impl SymbolTable {
    /// Build the table from every module of `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateDefinition`] if two definitions of the
    /// same kind share a qualified name.
    pub fn from_unit(unit: &CompilationUnit) -> Result<Self, CompileError> {
        let mut table = Self::default();
        for module in &unit.modules {
            let scope = module.module_prefix().unwrap_or(&module.name).to_string();
            table.collect(module.children(), &scope, &module.name)?;
        }
        tracing::debug!(
            typedefs = table.typedefs.len(),
            groupings = table.groupings.len(),
            identities = table.identities.len(),
            "built symbol table"
        );
        Ok(table)
    }

    fn collect(&mut self, nodes: &[SchemaNode], scope: &str, module: &str) -> Result<(), CompileError> {
        for node in nodes {
            match &node.kind {
                NodeKind::Typedef { type_spec } => {
                    let name = qualify(&node.name, scope);
                    let def = Typedef {
                        name: name.clone(),
                        module: module.to_string(),
                        scope: scope.to_string(),
                        type_spec: type_spec.clone(),
                        description: node.description.clone(),
                    };
                    if self.typedefs.insert(name.clone(), def).is_some() {
                        return Err(CompileError::DuplicateDefinition {
                            kind: ReferenceKind::Typedef,
                            name,
                        });
                    }
                }
                NodeKind::Grouping { children } => {
                    let name = qualify(&node.name, scope);
                    let def = Grouping {
                        name: name.clone(),
                        scope: scope.to_string(),
                        children: children.clone(),
                    };
                    if self.groupings.insert(name.clone(), def).is_some() {
                        return Err(CompileError::DuplicateDefinition {
                            kind: ReferenceKind::Grouping,
                            name,
                        });
                    }
                    // Groupings may declare their own typedefs and groupings.
                    self.collect(children, scope, module)?;
                }
                NodeKind::Identity { bases } => {
                    let name = qualify(&node.name, scope);
                    let def = Identity {
                        name: name.clone(),
                        module: module.to_string(),
                        scope: scope.to_string(),
                        bases: bases.iter().map(|b| qualify(b, scope)).collect(),
                    };
                    if self.identities.insert(name.clone(), def).is_some() {
                        return Err(CompileError::DuplicateDefinition {
                            kind: ReferenceKind::Identity,
                            name,
                        });
                    }
                }
                NodeKind::Rpc { input, output } | NodeKind::Action { input, output } => {
                    for body in [input, output].into_iter().flatten() {
                        self.collect(body, scope, module)?;
                    }
                }
                _ => self.collect(node.children(), scope, module)?,
            }
        }
        Ok(())
    }

    /// Resolve a typedef reference.
    pub fn typedef(&self, reference: &str, scope: Option<&str>) -> Option<&Typedef> {
        lookup(&self.typedefs, reference, scope)
    }

    /// Resolve a grouping reference.
    pub fn grouping(&self, reference: &str, scope: Option<&str>) -> Option<&Grouping> {
        lookup(&self.groupings, reference, scope)
    }

    /// Resolve an identity reference.
    pub fn identity(&self, reference: &str, scope: Option<&str>) -> Option<&Identity> {
        lookup(&self.identities, reference, scope)
    }

    /// All identities transitively derived from `base` (excluding `base`),
    /// in qualified-name order.
    pub fn derived_identities(&self, base: &str) -> Vec<&Identity> {
        self.identities
            .values()
            .filter(|identity| self.derives_from(identity, base, &mut Vec::new()))
            .collect()
    }

    fn derives_from<'a>(&'a self, identity: &'a Identity, base: &str, seen: &mut Vec<&'a str>) -> bool {
        if seen.contains(&identity.name.as_str()) {
            return false;
        }
        seen.push(&identity.name);
        identity.bases.iter().any(|b| {
            b == base
                || self
                    .identities
                    .get(b)
                    .is_some_and(|parent| self.derives_from(parent, base, seen))
        })
    }

    /// Typedefs in qualified-name order.
    pub fn typedefs(&self) -> impl Iterator<Item = &Typedef> {
        self.typedefs.values()
    }

    /// Groupings in qualified-name order.
    pub fn groupings(&self) -> impl Iterator<Item = &Grouping> {
        self.groupings.values()
    }

    /// Identities in qualified-name order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, reference: &str, scope: Option<&str>) -> Option<&'a T> {
    if let Some(found) = map.get(reference) {
        return Some(found);
    }
    if reference.contains(':') {
        return None;
    }
    if let Some(found) = scope.and_then(|s| map.get(&format!("{s}:{reference}"))) {
        return Some(found);
    }
    let mut candidates = map
        .iter()
        .filter(|(name, _)| crate::local_name(name) == reference)
        .map(|(_, def)| def);
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
