//! # Symbol Resolver
//!
//! Resolves typedef chains to a [`ResolvedType`] and expands `uses`
//! statements into the grouping bodies they name.
//!
//! ## Cycle Detection
//!
//! Every top-level resolution request owns a fresh [`Visiting`] stack. A name
//! is pushed before its definition is resolved and popped afterwards, so the
//! stack holds exactly the current call chain: a typedef reused in two sibling
//! union members, or a grouping used twice in one container, is never
//! mistaken for a cycle. Reaching a name that is already on the stack fails
//! with [`CompileError::Cycle`] naming the full chain.
//!
//! ## Scopes
//!
//! Bare references resolve in the scope (module prefix) of the definition that
//! contains them. Grouping expansion qualifies every bare type and grouping
//! reference in the expanded body with the grouping's scope, so the expanded
//! nodes resolve correctly wherever they are used.

use ysc_core::symbols::qualify;
use ysc_core::{
    BuiltinType, CompileError, EnumSpec, NodeKind, PatternSpec, ReferenceKind, SchemaNode,
    SchemaPath, SymbolTable, TypeSpec,
};

use crate::constraint::{self, RangeSet};

/// A type with its derivation chain fully applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    String {
        length: RangeSet<u64>,
        patterns: Vec<PatternSpec>,
        /// JSON Schema `format` of a well-known typedef in the chain.
        format: Option<&'static str>,
    },
    Binary {
        length: RangeSet<u64>,
    },
    Boolean,
    Integer {
        builtin: BuiltinType,
        range: RangeSet<i128>,
    },
    Decimal64 {
        fraction_digits: u8,
        /// `None` when no range restriction appears in the chain.
        range: Option<RangeSet<f64>>,
    },
    Enumeration(Vec<EnumSpec>),
    Bits(Vec<String>),
    Union(Vec<ResolvedType>),
    /// Target type is resolved against the schema tree by the Type Mapper.
    Leafref {
        path: String,
    },
    /// Qualified base identity names.
    Identityref {
        bases: Vec<String>,
    },
    InstanceIdentifier,
    Empty,
}

impl ResolvedType {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Binary { .. } => "binary",
            Self::Boolean => "boolean",
            Self::Integer { builtin, .. } => builtin.as_str(),
            Self::Decimal64 { .. } => "decimal64",
            Self::Enumeration(_) => "enumeration",
            Self::Bits(_) => "bits",
            Self::Union(_) => "union",
            Self::Leafref { .. } => "leafref",
            Self::Identityref { .. } => "identityref",
            Self::InstanceIdentifier => "instance-identifier",
            Self::Empty => "empty",
        }
    }
}

/// The chain of names currently being resolved.
#[derive(Debug, Default)]
pub struct Visiting {
    chain: Vec<String>,
}

impl Visiting {
    /// An empty chain, for one top-level resolution request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `name`, failing if it is already on the chain.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Cycle`] with the chain closed on `name`.
    pub fn enter(&mut self, kind: ReferenceKind, name: &str, path: &SchemaPath) -> Result<(), CompileError> {
        if self.chain.iter().any(|n| n == name) {
            let mut chain = self.chain.clone();
            chain.push(name.to_string());
            return Err(CompileError::Cycle {
                kind,
                path: path.clone(),
                chain,
            });
        }
        self.chain.push(name.to_string());
        Ok(())
    }

    /// Pop the most recent name.
    pub fn leave(&mut self) {
        self.chain.pop();
    }

    /// Current chain depth.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}

const DECIMAL64_MAX_DIGITS: u8 = 18;

/// Resolves references against one [`SymbolTable`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> Resolver<'a> {
    /// A resolver over `table`.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// The underlying symbol table.
    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// Resolve a `type` statement in module scope `scope`.
    ///
    /// # Errors
    ///
    /// - [`CompileError::Cycle`] for a typedef chain that loops.
    /// - [`CompileError::UnresolvedReference`] for an unknown typedef or identity.
    /// - [`CompileError::InvalidConstraint`] for restrictions that do not apply
    ///   to the base type or leave no admissible value.
    pub fn resolve_type(
        &self,
        spec: &TypeSpec,
        scope: &str,
        visiting: &mut Visiting,
        path: &SchemaPath,
    ) -> Result<ResolvedType, CompileError> {
        match spec.builtin() {
            Some(builtin) => {
                let root = self.builtin_root(builtin, spec, scope, visiting, path)?;
                apply_restrictions(root, spec, true, path)
            }
            None => {
                let typedef = self
                    .table
                    .typedef(&spec.name, Some(scope))
                    .ok_or_else(|| CompileError::unresolved(ReferenceKind::Typedef, &spec.name, path))?;
                visiting.enter(ReferenceKind::Typedef, &typedef.name, path)?;
                tracing::trace!(typedef = %typedef.name, depth = visiting.depth(), "resolving typedef");
                let base = self.resolve_type(&typedef.type_spec, &typedef.scope, visiting, path);
                visiting.leave();
                let base = match (base?, well_known_format(&typedef.module, typedef.name.as_str())) {
                    (ResolvedType::String { length, patterns, .. }, Some(format)) => ResolvedType::String {
                        length,
                        patterns,
                        format: Some(format),
                    },
                    (other, _) => other,
                };
                apply_restrictions(base, spec, false, path)
            }
        }
    }

    fn builtin_root(
        &self,
        builtin: BuiltinType,
        spec: &TypeSpec,
        scope: &str,
        visiting: &mut Visiting,
        path: &SchemaPath,
    ) -> Result<ResolvedType, CompileError> {
        let ty = match builtin {
            BuiltinType::String => ResolvedType::String {
                length: RangeSet::full(0, u64::MAX),
                patterns: Vec::new(),
                format: None,
            },
            BuiltinType::Binary => ResolvedType::Binary {
                length: RangeSet::full(0, u64::MAX),
            },
            BuiltinType::Boolean => ResolvedType::Boolean,
            BuiltinType::Int8
            | BuiltinType::Int16
            | BuiltinType::Int32
            | BuiltinType::Int64
            | BuiltinType::Uint8
            | BuiltinType::Uint16
            | BuiltinType::Uint32
            | BuiltinType::Uint64 => {
                let (lo, hi) = builtin.integer_bounds().unwrap_or((0, 0));
                ResolvedType::Integer {
                    builtin,
                    range: RangeSet::full(lo, hi),
                }
            }
            BuiltinType::Decimal64 => {
                let digits = spec.fraction_digits.ok_or_else(|| {
                    CompileError::invalid_constraint(path, "decimal64 requires fraction-digits")
                })?;
                if digits == 0 || digits > DECIMAL64_MAX_DIGITS {
                    return Err(CompileError::invalid_constraint(
                        path,
                        format!("fraction-digits {digits} is outside 1..{DECIMAL64_MAX_DIGITS}"),
                    ));
                }
                ResolvedType::Decimal64 {
                    fraction_digits: digits,
                    range: None,
                }
            }
            BuiltinType::Enumeration => {
                if spec.enums.is_empty() {
                    return Err(CompileError::invalid_constraint(path, "enumeration defines no enum values"));
                }
                ResolvedType::Enumeration(spec.enums.clone())
            }
            BuiltinType::Bits => {
                if spec.bits.is_empty() {
                    return Err(CompileError::invalid_constraint(path, "bits type defines no bits"));
                }
                ResolvedType::Bits(spec.bits.clone())
            }
            BuiltinType::Union => {
                if spec.types.is_empty() {
                    return Err(CompileError::invalid_constraint(path, "union has no member types"));
                }
                let members = spec
                    .types
                    .iter()
                    .map(|member| self.resolve_type(member, scope, visiting, path))
                    .collect::<Result<Vec<_>, _>>()?;
                ResolvedType::Union(members)
            }
            BuiltinType::Leafref => {
                let target = spec.path.clone().ok_or_else(|| {
                    CompileError::invalid_constraint(path, "leafref has no path")
                })?;
                ResolvedType::Leafref { path: target }
            }
            BuiltinType::Identityref => {
                if spec.bases.is_empty() {
                    return Err(CompileError::invalid_constraint(path, "identityref has no base"));
                }
                let bases = spec
                    .bases
                    .iter()
                    .map(|base| {
                        self.table
                            .identity(base, Some(scope))
                            .map(|identity| identity.name.clone())
                            .ok_or_else(|| CompileError::unresolved(ReferenceKind::Identity, base, path))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ResolvedType::Identityref { bases }
            }
            BuiltinType::InstanceIdentifier => ResolvedType::InstanceIdentifier,
            BuiltinType::Empty => ResolvedType::Empty,
        };
        Ok(ty)
    }

    /// Expand `uses <reference>` into the grouping's body.
    ///
    /// Nested `uses` are expanded recursively, at any depth of the body.
    /// Bare type and grouping references in the result are qualified with
    /// the grouping's scope.
    ///
    /// # Errors
    ///
    /// - [`CompileError::UnresolvedReference`] for an unknown grouping.
    /// - [`CompileError::Cycle`] for a grouping that (transitively) uses itself.
    pub fn expand_uses(
        &self,
        reference: &str,
        scope: &str,
        visiting: &mut Visiting,
        path: &SchemaPath,
    ) -> Result<Vec<SchemaNode>, CompileError> {
        let grouping = self
            .table
            .grouping(reference, Some(scope))
            .ok_or_else(|| CompileError::unresolved(ReferenceKind::Grouping, reference, path))?;
        visiting.enter(ReferenceKind::Grouping, &grouping.name, path)?;
        tracing::debug!(grouping = %grouping.name, at = %path, "expanding uses");
        let expanded = self.expand_body(&grouping.children, &grouping.scope, visiting, path);
        visiting.leave();
        expanded
    }

    fn expand_body(
        &self,
        nodes: &[SchemaNode],
        scope: &str,
        visiting: &mut Visiting,
        path: &SchemaPath,
    ) -> Result<Vec<SchemaNode>, CompileError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match &node.kind {
                NodeKind::Uses { grouping } => {
                    out.extend(self.expand_uses(grouping, scope, visiting, path)?);
                }
                // Definitions are reachable through the symbol table only.
                NodeKind::Grouping { .. } | NodeKind::Typedef { .. } | NodeKind::Identity { .. } => {}
                _ => out.push(self.expand_node(node, scope, visiting, path)?),
            }
        }
        Ok(out)
    }

    fn expand_node(
        &self,
        node: &SchemaNode,
        scope: &str,
        visiting: &mut Visiting,
        path: &SchemaPath,
    ) -> Result<SchemaNode, CompileError> {
        let mut node = node.clone();
        let node_path = path.child(node.name.clone());
        match &mut node.kind {
            NodeKind::Module { children, .. }
            | NodeKind::Container { children, .. }
            | NodeKind::List { children, .. }
            | NodeKind::Choice { children }
            | NodeKind::Case { children }
            | NodeKind::Grouping { children } => {
                *children = self.expand_body(children, scope, visiting, &node_path)?;
            }
            NodeKind::Leaf { type_spec, .. }
            | NodeKind::LeafList { type_spec, .. }
            | NodeKind::Typedef { type_spec } => qualify_type(type_spec, scope),
            NodeKind::Rpc { input, output } | NodeKind::Action { input, output } => {
                for body in [input, output].into_iter().flatten() {
                    *body = self.expand_body(body, scope, visiting, &node_path)?;
                }
            }
            NodeKind::Identity { .. } | NodeKind::Uses { .. } | NodeKind::Anydata | NodeKind::Anyxml => {}
        }
        Ok(node)
    }
}

/// Qualify bare typedef and identity references in `spec` with `scope`.
fn qualify_type(spec: &mut TypeSpec, scope: &str) {
    if spec.builtin().is_none() {
        spec.name = qualify(&spec.name, scope);
    }
    for base in &mut spec.bases {
        *base = qualify(base, scope);
    }
    for member in &mut spec.types {
        qualify_type(member, scope);
    }
}

/// Apply the restrictions written on `spec` to `base`.
///
/// `defining` is true when `spec` is the built-in statement itself, whose
/// `enum`/`bit` substatements define the value set rather than narrow it.
fn apply_restrictions(
    base: ResolvedType,
    spec: &TypeSpec,
    defining: bool,
    path: &SchemaPath,
) -> Result<ResolvedType, CompileError> {
    let invalid = |reason: String| CompileError::invalid_constraint(path, reason);
    let not_applicable = |what: &str, ty: &ResolvedType| {
        CompileError::invalid_constraint(path, format!("{what} restriction does not apply to {}", ty.kind_name()))
    };

    let mut ty = base;

    if let Some(expr) = &spec.range {
        ty = match ty {
            ResolvedType::Integer { builtin, range } => ResolvedType::Integer {
                builtin,
                range: RangeSet::parse_restriction(expr, &range).map_err(invalid)?,
            },
            ResolvedType::Decimal64 {
                fraction_digits,
                range,
            } => {
                let base_range = range.unwrap_or_else(|| decimal64_bounds(fraction_digits));
                ResolvedType::Decimal64 {
                    fraction_digits,
                    range: Some(RangeSet::parse_restriction(expr, &base_range).map_err(invalid)?),
                }
            }
            other => return Err(not_applicable("range", &other)),
        };
    }

    if let Some(expr) = &spec.length {
        ty = match ty {
            ResolvedType::String {
                length,
                patterns,
                format,
            } => ResolvedType::String {
                length: RangeSet::parse_restriction(expr, &length).map_err(invalid)?,
                patterns,
                format,
            },
            ResolvedType::Binary { length } => ResolvedType::Binary {
                length: RangeSet::parse_restriction(expr, &length).map_err(invalid)?,
            },
            other => return Err(not_applicable("length", &other)),
        };
    }

    if !spec.patterns.is_empty() {
        ty = match ty {
            ResolvedType::String {
                length,
                patterns,
                format,
            } => ResolvedType::String {
                length,
                patterns: constraint::merge_patterns(&patterns, &spec.patterns).map_err(invalid)?,
                format,
            },
            other => return Err(not_applicable("pattern", &other)),
        };
    }

    if !defining && !spec.enums.is_empty() {
        ty = match ty {
            ResolvedType::Enumeration(values) => {
                ResolvedType::Enumeration(constraint::restrict_enums(&values, &spec.enums).map_err(invalid)?)
            }
            other => return Err(not_applicable("enum", &other)),
        };
    }

    if !defining && !spec.bits.is_empty() {
        ty = match ty {
            ResolvedType::Bits(bits) => ResolvedType::Bits(constraint::restrict_bits(&bits, &spec.bits).map_err(invalid)?),
            other => return Err(not_applicable("bit", &other)),
        };
    }

    if !defining {
        if let Some(digits) = spec.fraction_digits {
            match &ty {
                ResolvedType::Decimal64 { fraction_digits, .. } if *fraction_digits == digits => {}
                other => {
                    return Err(invalid(format!(
                        "fraction-digits can only be set where decimal64 is used directly, not on a derived {}",
                        other.kind_name()
                    )))
                }
            }
        }
        if spec.path.is_some() || !spec.bases.is_empty() || !spec.types.is_empty() {
            return Err(invalid(format!(
                "'{}' is a derived type; path, base, and member types belong to the built-in",
                spec.name
            )));
        }
    }

    Ok(ty)
}

/// Value bounds of decimal64 with `digits` fraction digits.
/// JSON Schema formats for the string typedefs of the IETF type modules whose
/// values are a subset of the format.
fn well_known_format(module: &str, typedef: &str) -> Option<&'static str> {
    match (module, ysc_core::local_name(typedef)) {
        ("ietf-yang-types", "date-and-time") => Some("date-time"),
        ("ietf-inet-types", "ipv4-address-no-zone") => Some("ipv4"),
        ("ietf-inet-types", "ipv6-address-no-zone") => Some("ipv6"),
        ("ietf-inet-types", "uri") => Some("uri"),
        _ => None,
    }
}

fn decimal64_bounds(digits: u8) -> RangeSet<f64> {
    let scale = 10f64.powi(i32::from(digits));
    RangeSet::full(i64::MIN as f64 / scale, i64::MAX as f64 / scale)
}
