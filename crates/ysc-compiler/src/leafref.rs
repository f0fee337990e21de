//! # Leafref Paths
//!
//! Follows a leafref `path` argument through the schema tree to the leaf it
//! names, and resolves that leaf's type.
//!
//! Paths are evaluated against data node names: `choice` and `case` do not
//! appear in them, `uses` is expanded on the way, and an rpc or action is
//! entered through its `input` or `output` segment. Predicates (`[name =
//! current()/../name]`) only select instances and are ignored. A prefixed
//! segment only matches a node in that module's namespace; an unprefixed
//! node name takes the namespace of its parent.

use ysc_core::{CompilationUnit, CompileError, NodeKind, ReferenceKind, SchemaNode, SchemaPath};

use crate::resolve::{ResolvedType, Resolver, Visiting};
use crate::types::LeafrefResolver;

/// Resolves leafrefs against the modules of one compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct TreeLeafrefs<'a> {
    unit: &'a CompilationUnit,
    resolver: Resolver<'a>,
}

impl<'a> TreeLeafrefs<'a> {
    /// A resolver over every module of `unit`.
    pub fn new(unit: &'a CompilationUnit, resolver: Resolver<'a>) -> Self {
        Self { unit, resolver }
    }

    fn follow(&self, target: &str, from: &SchemaPath, visiting: &mut Visiting) -> Result<ResolvedType, CompileError> {
        let unresolved = || CompileError::unresolved(ReferenceKind::Leafref, target, from);
        let absolute = absolute_path(target, from).ok_or_else(unresolved)?;
        let (leaf, scope) = self.locate(&absolute, from)?.ok_or_else(unresolved)?;
        let type_spec = match &leaf.kind {
            NodeKind::Leaf { type_spec, .. } | NodeKind::LeafList { type_spec, .. } => type_spec,
            _ => return Err(unresolved()),
        };

        visiting.enter(ReferenceKind::Leafref, &absolute.to_string(), from)?;
        let resolved = self
            .resolver
            .resolve_type(type_spec, &scope, &mut Visiting::new(), &absolute)
            .and_then(|ty| self.deref(ty, &absolute, visiting));
        visiting.leave();
        resolved
    }

    /// Replace every leafref inside `ty` (including union members) by the
    /// type it points to, evaluating relative paths from `at`.
    fn deref(&self, ty: ResolvedType, at: &SchemaPath, visiting: &mut Visiting) -> Result<ResolvedType, CompileError> {
        match ty {
            ResolvedType::Leafref { path } => self.follow(&path, at, visiting),
            ResolvedType::Union(members) => members
                .into_iter()
                .map(|member| self.deref(member, at, visiting))
                .collect::<Result<Vec<_>, _>>()
                .map(ResolvedType::Union),
            other => Ok(other),
        }
    }

    /// Find the node at `path`, with the module scope its types resolve in.
    fn locate(&self, path: &SchemaPath, from: &SchemaPath) -> Result<Option<(SchemaNode, String)>, CompileError> {
        let Some((first, rest)) = path.segments().split_first() else {
            return Ok(None);
        };
        for module in &self.unit.modules {
            let scope = module.module_prefix().unwrap_or(&module.name).to_string();
            let Some((mut node, mut namespace)) = self.find_child(module.children(), first, &scope, &scope, from)? else {
                continue;
            };
            let mut segments = rest.iter();
            while let Some(segment) = segments.next() {
                let level: Vec<SchemaNode> = match &node.kind {
                    NodeKind::Rpc { input, output } | NodeKind::Action { input, output } => {
                        let body = match ysc_core::local_name(segment) {
                            "input" => input,
                            "output" => output,
                            _ => return Ok(None),
                        };
                        let Some(next) = segments.next() else {
                            return Ok(None);
                        };
                        let body = body.as_deref().unwrap_or_default();
                        match self.find_child(body, next, &namespace, &scope, from)? {
                            Some(found) => {
                                (node, namespace) = found;
                                continue;
                            }
                            None => return Ok(None),
                        }
                    }
                    _ => node.children().to_vec(),
                };
                match self.find_child(&level, segment, &namespace, &scope, from)? {
                    Some(found) => (node, namespace) = found,
                    None => return Ok(None),
                }
            }
            return Ok(Some((node, scope)));
        }
        Ok(None)
    }

    /// The data node among `nodes` named by `segment`, looking through
    /// `choice`, `case`, and `uses`, with the namespace it belongs to.
    ///
    /// `namespace` is the prefix inherited by unprefixed node names. A
    /// prefixed segment must agree with the node's namespace. When nothing
    /// agrees and the prefix belongs to no module of the unit (an import
    /// alias the tree does not record), the local name decides.
    fn find_child(
        &self,
        nodes: &[SchemaNode],
        segment: &str,
        namespace: &str,
        scope: &str,
        from: &SchemaPath,
    ) -> Result<Option<(SchemaNode, String)>, CompileError> {
        let found = self.search(nodes, segment, namespace, scope, from, false)?;
        match ysc_core::split_qualified(segment) {
            (Some(prefix), _) if found.is_none() && !self.is_module_prefix(prefix) => {
                self.search(nodes, segment, namespace, scope, from, true)
            }
            _ => Ok(found),
        }
    }

    fn search(
        &self,
        nodes: &[SchemaNode],
        segment: &str,
        namespace: &str,
        scope: &str,
        from: &SchemaPath,
        by_local_name: bool,
    ) -> Result<Option<(SchemaNode, String)>, CompileError> {
        let (wanted_prefix, wanted) = ysc_core::split_qualified(segment);
        for node in nodes {
            let found = match &node.kind {
                NodeKind::Uses { grouping } => {
                    let expanded = self.resolver.expand_uses(grouping, scope, &mut Visiting::new(), from)?;
                    self.search(&expanded, segment, namespace, scope, from, by_local_name)?
                }
                NodeKind::Choice { children } | NodeKind::Case { children } => {
                    self.search(children, segment, namespace, scope, from, by_local_name)?
                }
                _ if node.is_data_node() || matches!(node.kind, NodeKind::Rpc { .. } | NodeKind::Action { .. }) => {
                    let own = ysc_core::split_qualified(&node.name).0.unwrap_or(namespace);
                    let same_namespace = by_local_name || wanted_prefix.map_or(true, |prefix| prefix == own);
                    (node.local_name() == wanted && same_namespace).then(|| (node.clone(), own.to_string()))
                }
                _ => None,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn is_module_prefix(&self, prefix: &str) -> bool {
        self.unit
            .modules
            .iter()
            .any(|module| module.module_prefix().unwrap_or(&module.name) == prefix)
    }
}

impl LeafrefResolver for TreeLeafrefs<'_> {
    fn resolve_leafref(&self, target: &str, from: &SchemaPath) -> Result<ResolvedType, CompileError> {
        self.follow(target, from, &mut Visiting::new())
    }
}

/// Make `target` absolute. Relative paths start at the leaf `from`; each
/// `..` steps to the parent. Returns `None` for a path that climbs above the
/// root or names nothing.
fn absolute_path(target: &str, from: &SchemaPath) -> Option<SchemaPath> {
    let stripped = strip_predicates(target);
    let stripped = stripped.trim();
    let (mut path, rest) = match stripped.strip_prefix('/') {
        Some(rest) => (SchemaPath::root(), rest),
        None => (from.clone(), stripped),
    };
    for segment in rest.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        match segment {
            "." => {}
            ".." => {
                path.pop()?;
            }
            name => path.push(name),
        }
    }
    (!path.is_root()).then_some(path)
}

/// Remove `[...]` predicates, which may nest.
fn strip_predicates(path: &str) -> String {
    let mut depth = 0usize;
    path.chars()
        .filter(|c| match c {
            '[' => {
                depth += 1;
                false
            }
            ']' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ysc_core::{BuiltinType, SymbolTable, TypeSpec};

    fn unit() -> CompilationUnit {
        CompilationUnit::new(vec![SchemaNode::module(
            "example-if",
            "if",
            vec![
                SchemaNode::typedef("mtu", TypeSpec::named("uint16").with_range("68..9000")),
                SchemaNode::grouping("named", vec![SchemaNode::leaf("name", TypeSpec::named("string"))]),
                SchemaNode::container(
                    "if:interfaces",
                    vec![
                        SchemaNode::list(
                            "interface",
                            ["name"],
                            vec![
                                SchemaNode::uses("named"),
                                SchemaNode::choice(
                                    "link",
                                    vec![SchemaNode::case(
                                        "ethernet",
                                        vec![SchemaNode::leaf("mtu", TypeSpec::named("mtu"))],
                                    )],
                                ),
                                SchemaNode::leaf("peer-mtu", TypeSpec::leafref("../mtu")),
                            ],
                        ),
                        SchemaNode::leaf("primary", TypeSpec::leafref("/if:interfaces/if:interface[if:name = current()/../x]/if:name")),
                        SchemaNode::leaf("ping", TypeSpec::leafref("../pong")),
                        SchemaNode::leaf("pong", TypeSpec::leafref("../ping")),
                    ],
                ),
            ],
        )])
    }

    fn resolve(target: &str, from: &[&str]) -> Result<ResolvedType, CompileError> {
        let unit = unit();
        let table = SymbolTable::from_unit(&unit).unwrap();
        let leafrefs = TreeLeafrefs::new(&unit, Resolver::new(&table));
        let from: SchemaPath = from.iter().map(|s| s.to_string()).collect();
        leafrefs.resolve_leafref(target, &from)
    }

    #[test]
    fn predicates_are_stripped() {
        assert_eq!(strip_predicates("/a/b[k = current()/../k]/c"), "/a/b/c");
        assert_eq!(strip_predicates("/a[x[y]]/b"), "/a/b");
    }

    #[test]
    fn relative_paths_climb_from_the_leaf() {
        let from: SchemaPath = ["a", "b", "leaf"].iter().map(|s| s.to_string()).collect();
        assert_eq!(absolute_path("../x", &from).unwrap().to_string(), "/a/b/x");
        assert_eq!(absolute_path("../../../y/z", &from).unwrap().to_string(), "/y/z");
        assert!(absolute_path("../../../../y", &from).is_none());
        assert_eq!(absolute_path("/p:q/r", &from).unwrap().to_string(), "/p:q/r");
    }

    #[test]
    fn absolute_leafref_through_uses() {
        let ty = resolve(
            "/if:interfaces/if:interface[if:name = current()/../x]/if:name",
            &["if:interfaces", "primary"],
        )
        .unwrap();
        assert!(matches!(ty, ResolvedType::String { .. }));
    }

    #[test]
    fn relative_leafref_through_choice_resolves_typedef() {
        let ty = resolve("../mtu", &["if:interfaces", "interface", "peer-mtu"]).unwrap();
        match ty {
            ResolvedType::Integer { builtin, range } => {
                assert_eq!(builtin, BuiltinType::Uint16);
                assert_eq!(range.min(), Some(68));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_target_is_unresolved() {
        let err = resolve("../speed", &["if:interfaces", "interface", "peer-mtu"]).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnresolvedReference {
                kind: ReferenceKind::Leafref,
                ..
            }
        ));
        // A container is not a valid target.
        assert!(resolve("/interfaces", &["if:interfaces", "primary"]).is_err());
    }

    fn state(name: &str, x: &str) -> SchemaNode {
        SchemaNode::container(name, vec![SchemaNode::leaf("x", TypeSpec::named(x))])
    }

    fn resolve_in(unit: &CompilationUnit, target: &str, from: &[&str]) -> Result<ResolvedType, CompileError> {
        let table = SymbolTable::from_unit(unit).unwrap();
        let leafrefs = TreeLeafrefs::new(unit, Resolver::new(&table));
        let from: SchemaPath = from.iter().map(|s| s.to_string()).collect();
        leafrefs.resolve_leafref(target, &from)
    }

    fn is_uint8(ty: &ResolvedType) -> bool {
        matches!(ty, ResolvedType::Integer { builtin: BuiltinType::Uint8, .. })
    }

    #[test]
    fn prefixed_segment_selects_its_module() {
        let unit = CompilationUnit::new(vec![
            SchemaNode::module("mod-a", "a", vec![state("a:state", "string")]),
            SchemaNode::module(
                "mod-b",
                "b",
                vec![state("b:state", "uint8"), SchemaNode::leaf("b:ref", TypeSpec::leafref("/b:state/b:x"))],
            ),
        ]);
        assert!(is_uint8(&resolve_in(&unit, "/b:state/b:x", &["b:ref"]).unwrap()));
        assert!(matches!(
            resolve_in(&unit, "/a:state/a:x", &["b:ref"]).unwrap(),
            ResolvedType::String { .. }
        ));
        // `x` inherits `b` from its parent, so `a:x` names nothing there.
        assert!(resolve_in(&unit, "/b:state/a:x", &["b:ref"]).is_err());
    }

    #[test]
    fn prefixed_segment_selects_among_siblings() {
        let unit = CompilationUnit::new(vec![SchemaNode::module(
            "mod-m",
            "m",
            vec![SchemaNode::container(
                "m:top",
                vec![
                    state("a:state", "string"),
                    state("b:state", "uint8"),
                    SchemaNode::leaf("ref", TypeSpec::leafref("../b:state/x")),
                ],
            )],
        )]);
        assert!(is_uint8(&resolve_in(&unit, "../b:state/x", &["m:top", "ref"]).unwrap()));
        // Unprefixed segments still match by local name; the first sibling wins.
        assert!(matches!(
            resolve_in(&unit, "../state/x", &["m:top", "ref"]).unwrap(),
            ResolvedType::String { .. }
        ));
    }

    #[test]
    fn unknown_prefix_falls_back_to_local_name() {
        let ty = resolve("/ietf-if:interfaces/ietf-if:interface/ietf-if:name", &["if:interfaces", "primary"]).unwrap();
        assert!(matches!(ty, ResolvedType::String { .. }));
    }

    #[test]
    fn mutual_leafrefs_are_a_cycle() {
        let err = resolve("../pong", &["if:interfaces", "ping"]).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Cycle {
                kind: ReferenceKind::Leafref,
                ..
            }
        ));
    }
}
