//! # Type Mapper
//!
//! Maps a [`ResolvedType`] to the JSON Schema fragment that validates its
//! JSON encoding.
//!
//! | YANG | JSON Schema |
//! |------|-------------|
//! | string, binary | `string` + `pattern` / `minLength` / `maxLength` (+ `format` for IETF address, URI, and timestamp typedefs) |
//! | intN, uintN | `integer` + `minimum` / `maximum` |
//! | decimal64 | `number` (+ bounds) |
//! | boolean | `boolean` |
//! | enumeration | `string` + `enum` |
//! | identityref | `string` (+ `enum` of derived identities) |
//! | union | `anyOf`, member order kept |
//! | empty | `boolean` |
//! | bits, instance-identifier | `string` |
//!
//! Under [`Encoding::Rfc7951`], 64-bit integers and decimal64 become strings
//! with a numeric pattern, and `empty` becomes the one-element array `[null]`.
//! A pattern cannot carry a numeric range, so a restricted 64-bit or decimal64
//! type is rejected under that encoding.
//!
//! Closed identityrefs enumerate each derived identity as `module:identity`
//! (the instance encoding) and `prefix:identity`, plus the bare name when the
//! identity is defined in the leaf's own module.
//!
//! Leafrefs are resolved through a [`LeafrefResolver`] supplied by the Tree
//! Builder, which owns the schema tree context needed to follow the path.

use serde_json::Number;
use ysc_core::{CompileError, EnumSpec, Identity, PatternSpec, SchemaPath, SymbolTable};

use crate::constraint::{self, Bound, RangeSet};
use crate::options::{CompileOptions, Encoding};
use crate::output::{integer_number, Items, JsonSchemaNode, JsonType};
use crate::resolve::ResolvedType;

const RFC7951_INTEGER: &str = "^-?[0-9]+$";
const RFC7951_DECIMAL: &str = r"^-?[0-9]+(\.[0-9]+)?$";

/// Follows leafref paths to the type of the referenced leaf.
pub trait LeafrefResolver {
    /// The type of the leaf that `target` (a leafref `path` argument) names,
    /// evaluated from the leaf at `from`. The returned type contains no
    /// further leafrefs.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnresolvedReference`] when the target does not exist,
    /// [`CompileError::Cycle`] when leafrefs refer to each other in a loop.
    fn resolve_leafref(&self, target: &str, from: &SchemaPath) -> Result<ResolvedType, CompileError>;
}

/// Maps resolved types to JSON Schema fragments under one set of options.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    options: &'a CompileOptions,
    table: &'a SymbolTable,
}

impl<'a> TypeMapper<'a> {
    /// A mapper for one compilation.
    pub fn new(options: &'a CompileOptions, table: &'a SymbolTable) -> Self {
        Self { options, table }
    }

    /// Map `ty`, the type of the leaf at `path` in the module with prefix
    /// `scope`.
    ///
    /// # Errors
    ///
    /// Propagates leafref resolution failures.
    /// [`CompileError::InvalidConstraint`] for a restricted 64-bit or
    /// decimal64 type under RFC 7951 encoding.
    pub fn map(
        &self,
        ty: &ResolvedType,
        leafrefs: &dyn LeafrefResolver,
        scope: &str,
        path: &SchemaPath,
    ) -> Result<JsonSchemaNode, CompileError> {
        let rfc7951 = self.options.encoding == Encoding::Rfc7951;
        let node = match ty {
            ResolvedType::String {
                length,
                patterns,
                format,
            } => {
                let mut node = JsonSchemaNode::of_type(JsonType::String);
                node.format = format.map(str::to_string);
                apply_length(&mut node, length);
                apply_patterns(&mut node, patterns);
                node
            }
            ResolvedType::Binary { length } => {
                let mut node = JsonSchemaNode::of_type(JsonType::String);
                apply_length(&mut node, length);
                node
            }
            ResolvedType::Boolean => JsonSchemaNode::of_type(JsonType::Boolean),
            ResolvedType::Integer { builtin, range } => {
                if rfc7951 && builtin.is_wide_integer() {
                    let (lo, hi) = builtin.integer_bounds().unwrap_or((0, 0));
                    if *range != RangeSet::full(lo, hi) {
                        return Err(unencodable_range(builtin.as_str(), path));
                    }
                    numeric_string(RFC7951_INTEGER)
                } else {
                    let mut node = JsonSchemaNode::of_type(JsonType::Integer);
                    apply_bounds(&mut node, range, |v| Some(integer_number(v)));
                    node
                }
            }
            ResolvedType::Decimal64 { range, .. } => {
                if rfc7951 {
                    if range.is_some() {
                        return Err(unencodable_range("decimal64", path));
                    }
                    numeric_string(RFC7951_DECIMAL)
                } else {
                    let mut node = JsonSchemaNode::of_type(JsonType::Number);
                    if let Some(range) = range {
                        apply_bounds(&mut node, range, Number::from_f64);
                    }
                    node
                }
            }
            ResolvedType::Enumeration(values) => JsonSchemaNode {
                json_type: Some(JsonType::String),
                enum_values: Some(values.iter().map(|v| v.name.clone()).collect()),
                ..JsonSchemaNode::default()
            },
            ResolvedType::Bits(_) | ResolvedType::InstanceIdentifier => JsonSchemaNode::of_type(JsonType::String),
            ResolvedType::Union(members) => JsonSchemaNode::any_of(
                members
                    .iter()
                    .map(|member| self.map(member, leafrefs, scope, path))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ResolvedType::Leafref { path: target } => {
                let resolved = leafrefs.resolve_leafref(target, path)?;
                tracing::trace!(leafref = %target, at = %path, "resolved leafref target");
                self.map(&resolved, leafrefs, scope, path)?
            }
            ResolvedType::Identityref { bases } => self.identityref(bases, scope),
            ResolvedType::Empty => {
                if rfc7951 {
                    self.null_tuple()
                } else {
                    JsonSchemaNode::of_type(JsonType::Boolean)
                }
            }
        };
        Ok(node)
    }

    fn identityref(&self, bases: &[String], scope: &str) -> JsonSchemaNode {
        let mut node = JsonSchemaNode::of_type(JsonType::String);
        if !self.options.closed_identities {
            return node;
        }
        let mut names: Vec<String> = bases
            .iter()
            .flat_map(|base| self.table.derived_identities(base))
            .flat_map(|identity| identity_values(identity, scope))
            .collect();
        names.sort();
        names.dedup();
        if !names.is_empty() {
            node.enum_values = Some(names);
        }
        node
    }

    fn null_tuple(&self) -> JsonSchemaNode {
        let null = JsonSchemaNode::of_type(JsonType::Null);
        let mut node = JsonSchemaNode::of_type(JsonType::Array);
        if self.options.draft.has_prefix_items() {
            node.prefix_items = Some(vec![null]);
        } else {
            node.items = Some(Items::Tuple(vec![null]));
        }
        node.min_items = Some(1);
        node.max_items = Some(1);
        node
    }
}

/// The spellings an instance may use for `identity` in a leaf of module
/// `scope`.
fn identity_values(identity: &Identity, scope: &str) -> Vec<String> {
    let local = identity.local_name();
    let mut values = vec![format!("{}:{local}", identity.module), identity.name.clone()];
    if identity.scope == scope {
        values.push(local.to_string());
    }
    values
}

fn unencodable_range(type_name: &str, path: &SchemaPath) -> CompileError {
    CompileError::invalid_constraint(
        path,
        format!("{type_name} range cannot be expressed in the RFC 7951 string encoding"),
    )
}

fn numeric_string(pattern: &str) -> JsonSchemaNode {
    JsonSchemaNode {
        json_type: Some(JsonType::String),
        pattern: Some(pattern.to_string()),
        ..JsonSchemaNode::default()
    }
}

/// `minimum`/`maximum` for the overall span, plus one `anyOf` alternative per
/// interval when the set has gaps.
fn apply_bounds<T: Bound>(node: &mut JsonSchemaNode, range: &RangeSet<T>, to_number: impl Fn(T) -> Option<Number>) {
    node.minimum = range.min().and_then(&to_number);
    node.maximum = range.max().and_then(&to_number);
    if !range.is_contiguous() {
        node.any_of = range
            .intervals()
            .iter()
            .map(|interval| JsonSchemaNode {
                minimum: to_number(interval.lo),
                maximum: to_number(interval.hi),
                ..JsonSchemaNode::default()
            })
            .collect();
    }
}

/// `minLength`/`maxLength`, omitting bounds that equal the unrestricted
/// defaults.
fn apply_length(node: &mut JsonSchemaNode, length: &RangeSet<u64>) {
    let lower = |v: u64| (v > 0).then_some(v);
    let upper = |v: u64| (v < u64::MAX).then_some(v);
    node.min_length = length.min().and_then(lower);
    node.max_length = length.max().and_then(upper);
    if !length.is_contiguous() {
        node.any_of = length
            .intervals()
            .iter()
            .map(|interval| JsonSchemaNode {
                min_length: lower(interval.lo),
                max_length: upper(interval.hi),
                ..JsonSchemaNode::default()
            })
            .collect();
    }
}

fn apply_patterns(node: &mut JsonSchemaNode, patterns: &[PatternSpec]) {
    let fragment = |p: &PatternSpec| {
        let positive = JsonSchemaNode {
            pattern: Some(constraint::anchored(&p.regex)),
            ..JsonSchemaNode::default()
        };
        if p.invert_match {
            JsonSchemaNode {
                not: Some(Box::new(positive)),
                ..JsonSchemaNode::default()
            }
        } else {
            positive
        }
    };
    match patterns {
        [] => {}
        [single] if !single.invert_match => node.pattern = Some(constraint::anchored(&single.regex)),
        [single] => node.not = fragment(single).not,
        many => node.all_of = many.iter().map(fragment).collect(),
    }
}

/// The `description` annotation of a node: its own description, then the
/// descriptions of enumeration values, then each `when` condition, joined by
/// blank lines.
pub fn annotation(description: Option<&str>, ty: Option<&ResolvedType>, when: &[String]) -> Option<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    if let Some(text) = description {
        paragraphs.push(text.trim().to_string());
    }
    if let Some(ResolvedType::Enumeration(values)) = ty {
        let described: Vec<String> = values.iter().filter_map(enum_bullet).collect();
        if !described.is_empty() {
            paragraphs.push(format!("Supported values:\n{}", described.join("\n")));
        }
    }
    paragraphs.extend(when.iter().map(|condition| format!("Condition: {condition}")));
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
}

fn enum_bullet(value: &EnumSpec) -> Option<String> {
    value
        .description
        .as_deref()
        .map(|d| format!("  * {}: {}", value.name, d.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ysc_core::{BuiltinType, CompilationUnit, SchemaNode};

    use crate::options::SchemaDraft;

    struct NoLeafrefs;

    impl LeafrefResolver for NoLeafrefs {
        fn resolve_leafref(&self, target: &str, from: &SchemaPath) -> Result<ResolvedType, CompileError> {
            Err(CompileError::unresolved(ysc_core::ReferenceKind::Leafref, target, from))
        }
    }

    struct FixedLeafref(ResolvedType);

    impl LeafrefResolver for FixedLeafref {
        fn resolve_leafref(&self, _: &str, _: &SchemaPath) -> Result<ResolvedType, CompileError> {
            Ok(self.0.clone())
        }
    }

    fn map_with(options: &CompileOptions, ty: &ResolvedType) -> serde_json::Value {
        let table = SymbolTable::default();
        let node = TypeMapper::new(options, &table)
            .map(ty, &NoLeafrefs, "m", &SchemaPath::root())
            .unwrap();
        serde_json::to_value(node).unwrap()
    }

    fn map(ty: &ResolvedType) -> serde_json::Value {
        map_with(&CompileOptions::default(), ty)
    }

    fn int(builtin: BuiltinType) -> ResolvedType {
        let (lo, hi) = builtin.integer_bounds().unwrap();
        ResolvedType::Integer {
            builtin,
            range: RangeSet::full(lo, hi),
        }
    }

    #[test]
    fn integer_widths_bound_the_value() {
        assert_eq!(map(&int(BuiltinType::Uint8)), json!({"type": "integer", "minimum": 0, "maximum": 255}));
        assert_eq!(
            map(&int(BuiltinType::Int16)),
            json!({"type": "integer", "minimum": -32768, "maximum": 32767})
        );
        assert_eq!(
            map(&int(BuiltinType::Uint64)),
            json!({"type": "integer", "minimum": 0, "maximum": 18_446_744_073_709_551_615u64})
        );
    }

    #[test]
    fn disjoint_ranges_become_any_of() {
        let range = RangeSet::parse_restriction("1..10 | 20..30", &RangeSet::full(0, 255)).unwrap();
        let ty = ResolvedType::Integer {
            builtin: BuiltinType::Uint8,
            range,
        };
        assert_eq!(
            map(&ty),
            json!({
                "type": "integer", "minimum": 1, "maximum": 30,
                "anyOf": [{"minimum": 1, "maximum": 10}, {"minimum": 20, "maximum": 30}]
            })
        );
    }

    #[test]
    fn string_restrictions_are_anchored() {
        let ty = ResolvedType::String {
            length: RangeSet::full(1, 64),
            patterns: vec![PatternSpec::new("[a-z]+")],
            format: None,
        };
        assert_eq!(
            map(&ty),
            json!({"type": "string", "pattern": "^(?:[a-z]+)$", "minLength": 1, "maxLength": 64})
        );
    }

    #[test]
    fn string_format_follows_type() {
        let ty = ResolvedType::String {
            length: RangeSet::full(0, u64::MAX),
            patterns: vec![],
            format: Some("ipv4"),
        };
        assert_eq!(map(&ty), json!({"type": "string", "format": "ipv4"}));
    }

    #[test]
    fn several_patterns_become_all_of() {
        let ty = ResolvedType::String {
            length: RangeSet::full(0, u64::MAX),
            patterns: vec![PatternSpec::new("[a-z]+"), PatternSpec::inverted("x.*")],
            format: None,
        };
        assert_eq!(
            map(&ty),
            json!({"type": "string", "allOf": [
                {"pattern": "^(?:[a-z]+)$"},
                {"not": {"pattern": "^(?:x.*)$"}}
            ]})
        );
    }

    #[test]
    fn union_keeps_member_order() {
        let ty = ResolvedType::Union(vec![
            ResolvedType::String {
                length: RangeSet::full(0, u64::MAX),
                patterns: vec![],
                format: None,
            },
            ResolvedType::Enumeration(vec![EnumSpec::new("x"), EnumSpec::new("y")]),
        ]);
        assert_eq!(
            map(&ty),
            json!({"anyOf": [{"type": "string"}, {"type": "string", "enum": ["x", "y"]}]})
        );
    }

    #[test]
    fn rfc7951_encodes_wide_numbers_as_strings() {
        let options = CompileOptions {
            encoding: Encoding::Rfc7951,
            ..CompileOptions::default()
        };
        assert_eq!(
            map_with(&options, &int(BuiltinType::Int64)),
            json!({"type": "string", "pattern": "^-?[0-9]+$"})
        );
        assert_eq!(
            map_with(&options, &int(BuiltinType::Int32)),
            json!({"type": "integer", "minimum": -2_147_483_648i64, "maximum": 2_147_483_647})
        );
        let dec = ResolvedType::Decimal64 {
            fraction_digits: 2,
            range: None,
        };
        assert_eq!(map_with(&options, &dec)["type"], json!("string"));
    }

    #[test]
    fn rfc7951_rejects_ranges_it_cannot_encode() {
        let options = CompileOptions {
            encoding: Encoding::Rfc7951,
            ..CompileOptions::default()
        };
        let table = SymbolTable::default();
        let mapper = TypeMapper::new(&options, &table);
        let path: SchemaPath = ["m:counter"].iter().map(|s| s.to_string()).collect();

        let full = RangeSet::full(0, i128::from(u64::MAX));
        let range = RangeSet::parse_restriction("1..1000", &full).unwrap();
        let bounded = ResolvedType::Integer {
            builtin: BuiltinType::Uint64,
            range,
        };
        let err = mapper.map(&bounded, &NoLeafrefs, "m", &path).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConstraint { .. }));
        assert_eq!(err.path(), Some(&path));

        let dec = ResolvedType::Decimal64 {
            fraction_digits: 2,
            range: Some(RangeSet::full(0.0, 1.0)),
        };
        assert!(mapper.map(&dec, &NoLeafrefs, "m", &path).is_err());

        // The same types keep their bounds as JSON numbers.
        let plain = map(&bounded);
        assert_eq!(plain["minimum"], json!(1));
        assert_eq!(plain["maximum"], json!(1000));
    }

    #[test]
    fn empty_depends_on_encoding_and_draft() {
        assert_eq!(map(&ResolvedType::Empty), json!({"type": "boolean"}));
        let options = CompileOptions {
            encoding: Encoding::Rfc7951,
            ..CompileOptions::default()
        };
        assert_eq!(
            map_with(&options, &ResolvedType::Empty),
            json!({"type": "array", "prefixItems": [{"type": "null"}], "minItems": 1, "maxItems": 1})
        );
        let draft07 = CompileOptions {
            draft: SchemaDraft::Draft07,
            ..options
        };
        assert_eq!(
            map_with(&draft07, &ResolvedType::Empty),
            json!({"type": "array", "items": [{"type": "null"}], "minItems": 1, "maxItems": 1})
        );
    }

    #[test]
    fn identityref_enumerates_derived_identities() {
        let unit = CompilationUnit::new(vec![SchemaNode::module(
            "crypto",
            "c",
            vec![
                SchemaNode::identity("alg", Vec::<String>::new()),
                SchemaNode::identity("sha256", ["alg"]),
                SchemaNode::identity("aes", ["alg"]),
            ],
        )]);
        let table = SymbolTable::from_unit(&unit).unwrap();
        let ty = ResolvedType::Identityref {
            bases: vec!["c:alg".into()],
        };
        let options = CompileOptions::default();
        let node = TypeMapper::new(&options, &table)
            .map(&ty, &NoLeafrefs, "c", &SchemaPath::root())
            .unwrap();
        assert_eq!(
            node.enum_values.unwrap(),
            ["aes", "c:aes", "c:sha256", "crypto:aes", "crypto:sha256", "sha256"]
        );

        // Outside the defining module the bare name is not accepted.
        let node = TypeMapper::new(&options, &table)
            .map(&ty, &NoLeafrefs, "other", &SchemaPath::root())
            .unwrap();
        assert_eq!(
            node.enum_values.unwrap(),
            ["c:aes", "c:sha256", "crypto:aes", "crypto:sha256"]
        );

        let open = CompileOptions {
            closed_identities: false,
            ..CompileOptions::default()
        };
        let node = TypeMapper::new(&open, &table)
            .map(&ty, &NoLeafrefs, "c", &SchemaPath::root())
            .unwrap();
        assert_eq!(node.enum_values, None);
    }

    #[test]
    fn leafref_maps_to_target_type() {
        let options = CompileOptions::default();
        let table = SymbolTable::default();
        let ty = ResolvedType::Leafref {
            path: "../name".into(),
        };
        let node = TypeMapper::new(&options, &table)
            .map(&ty, &FixedLeafref(int(BuiltinType::Uint8)), "m", &SchemaPath::root())
            .unwrap();
        assert_eq!(node.json_type, Some(JsonType::Integer));

        let err = TypeMapper::new(&options, &table)
            .map(&ty, &NoLeafrefs, "m", &SchemaPath::root())
            .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { .. }));
    }

    #[test]
    fn annotation_joins_paragraphs() {
        let ty = ResolvedType::Enumeration(vec![
            EnumSpec {
                name: "up".into(),
                description: Some("Ready to pass packets. ".into()),
            },
            EnumSpec::new("down"),
        ]);
        let text = annotation(Some("Operational state."), Some(&ty), &["../enabled = 'true'".to_string()]).unwrap();
        assert_eq!(
            text,
            "Operational state.\n\nSupported values:\n  * up: Ready to pass packets.\n\nCondition: ../enabled = 'true'"
        );
        assert_eq!(annotation(None, None, &[]), None);
    }
}
