//! # Tree Builder
//!
//! Walks a module depth-first in declaration order and produces the JSON
//! Schema objects for its data nodes.
//!
//! ## Mapping
//!
//! - container: object property. Under `config-only`, a non-presence
//!   container with no surviving children is omitted.
//! - list: array of entry objects. Key leafs are always emitted and always
//!   listed first in the entry's `required`.
//! - leaf: the mapped type, `default`, and `required` membership for
//!   `mandatory true` (except inside a choice, where the case may be absent).
//! - leaf-list: array of the mapped type.
//! - anydata, anyxml: unconstrained object.
//! - choice and case: transparent; every case contributes its properties to
//!   the parent. A property defined differently by two cases becomes an
//!   `anyOf` of the alternatives.
//! - uses: expanded in place. grouping, typedef, identity: not emitted.
//! - rpc and action: collected as operations under [`Layout::Split`],
//!   ignored otherwise. Their input and output are never config-filtered.
//!
//! Schema paths name data nodes only (`/if:interfaces/interface/name`);
//! choice and case are invisible in them, as in instance data.

use serde_json::{Number, Value};
use ysc_core::{CompilationUnit, CompileError, NodeKind, SchemaNode, SchemaPath, SymbolTable};

use crate::classify::{classify, ROOT_CONFIG};
use crate::leafref::TreeLeafrefs;
use crate::options::{CompileOptions, Layout};
use crate::output::{JsonSchemaNode, JsonType, Properties};
use crate::resolve::{ResolvedType, Resolver, Visiting};
use crate::types::{annotation, TypeMapper};

/// Properties and `required` of one JSON object under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectBody {
    pub properties: Properties,
    pub required: Vec<String>,
}

impl ObjectBody {
    /// Add a property of the object at `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NameCollision`] if `name` is already present.
    pub fn insert(&mut self, name: String, schema: JsonSchemaNode, parent: &SchemaPath) -> Result<(), CompileError> {
        self.properties.insert(name, schema).map_err(|(name, _)| CompileError::NameCollision {
            path: parent.clone(),
            first: name.clone(),
            second: name.clone(),
            name,
        })
    }

    /// Finish as an object schema.
    pub fn into_schema(self, additional_properties: bool) -> JsonSchemaNode {
        let mut required = Vec::with_capacity(self.required.len());
        for name in self.required {
            if self.properties.contains_key(&name) && !required.contains(&name) {
                required.push(name);
            }
        }
        let mut schema = JsonSchemaNode::object(self.properties, additional_properties);
        schema.required = required;
        schema
    }

    fn property_for_key(&self, key: &str) -> Option<&str> {
        let wanted = ysc_core::local_name(key);
        self.properties.keys().find(|name| ysc_core::local_name(name) == wanted)
    }
}

/// The compiled form of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSchema {
    /// Module name.
    pub name: String,
    /// Annotation from the module's `description`.
    pub description: Option<String>,
    /// Top-level data nodes.
    pub data: ObjectBody,
    /// rpcs and actions, keyed `module:rpc` or by the action's schema path.
    /// Always empty under [`Layout::Flat`].
    pub operations: Properties,
}

/// Position of the walk.
#[derive(Debug, Clone)]
struct Frame<'f> {
    module: &'f str,
    /// Prefix bare type references resolve against.
    scope: &'f str,
    /// Path of the object being filled.
    path: SchemaPath,
    /// Effective config of the parent; `None` inside rpc/action bodies.
    config: Option<bool>,
    /// Key leafs, when filling a list entry.
    keys: &'f [String],
    in_choice: bool,
}

/// Builds the JSON Schema of the modules of one compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    options: &'a CompileOptions,
    resolver: Resolver<'a>,
    mapper: TypeMapper<'a>,
    leafrefs: TreeLeafrefs<'a>,
}

impl<'a> TreeBuilder<'a> {
    /// A builder over `unit`, whose definitions are indexed in `table`.
    pub fn new(unit: &'a CompilationUnit, table: &'a SymbolTable, options: &'a CompileOptions) -> Self {
        let resolver = Resolver::new(table);
        Self {
            options,
            resolver,
            mapper: TypeMapper::new(options, table),
            leafrefs: TreeLeafrefs::new(unit, resolver),
        }
    }

    /// Build one module.
    ///
    /// # Errors
    ///
    /// The first [`CompileError`] met during the walk; nothing is returned
    /// for a partially built module.
    pub fn build_module(&self, module: &SchemaNode) -> Result<ModuleSchema, CompileError> {
        let scope = module.module_prefix().unwrap_or(&module.name);
        tracing::debug!(module = %module.name, prefix = scope, "building module");
        let frame = Frame {
            module: &module.name,
            scope,
            path: SchemaPath::root(),
            config: Some(ROOT_CONFIG),
            keys: &[],
            in_choice: false,
        };
        let mut data = ObjectBody::default();
        let mut operations = Properties::new();
        self.build_children(module.children(), &frame, &mut data, &mut operations)?;
        Ok(ModuleSchema {
            name: module.name.clone(),
            description: self.annotate(module, None),
            data,
            operations,
        })
    }

    fn build_children(
        &self,
        nodes: &[SchemaNode],
        frame: &Frame<'_>,
        body: &mut ObjectBody,
        operations: &mut Properties,
    ) -> Result<(), CompileError> {
        for node in nodes {
            match &node.kind {
                NodeKind::Uses { grouping } => {
                    let expanded = self
                        .resolver
                        .expand_uses(grouping, frame.scope, &mut Visiting::new(), &frame.path)?;
                    self.build_children(&expanded, frame, body, operations)?;
                }
                NodeKind::Grouping { .. } | NodeKind::Typedef { .. } | NodeKind::Identity { .. } => {}
                NodeKind::Module { .. } => {
                    return Err(CompileError::invalid_constraint(
                        &frame.path,
                        format!("module '{}' is nested inside another statement", node.name),
                    ));
                }
                NodeKind::Choice { children } => self.build_choice(node, children, frame, body, operations)?,
                NodeKind::Case { children } => {
                    let inner = self.transparent_frame(node, frame)?;
                    self.build_children(children, &inner, body, operations)?;
                }
                NodeKind::Rpc { input, output } | NodeKind::Action { input, output } => {
                    if self.options.layout != Layout::Split {
                        tracing::trace!(operation = %node.name, "skipping operation in flat layout");
                        continue;
                    }
                    let (key, schema) = self.build_operation(node, input.as_deref(), output.as_deref(), frame)?;
                    if operations.insert(key, schema).is_err() {
                        return Err(CompileError::NameCollision {
                            path: frame.path.clone(),
                            name: node.local_name().to_string(),
                            first: node.name.clone(),
                            second: node.name.clone(),
                        });
                    }
                }
                NodeKind::Container { .. }
                | NodeKind::List { .. }
                | NodeKind::Leaf { .. }
                | NodeKind::LeafList { .. }
                | NodeKind::Anydata
                | NodeKind::Anyxml => self.build_data_child(node, frame, body, operations)?,
            }
        }
        Ok(())
    }

    fn build_data_child(
        &self,
        node: &SchemaNode,
        frame: &Frame<'_>,
        body: &mut ObjectBody,
        operations: &mut Properties,
    ) -> Result<(), CompileError> {
        let path = frame.path.child(node.name.clone());
        let config = match frame.config {
            Some(inherited) => Some(classify(node.config, inherited, self.options.config_policy, &path)?),
            None => None,
        };
        let is_key = matches!(node.kind, NodeKind::Leaf { .. })
            && frame.keys.iter().any(|k| ysc_core::local_name(k) == node.local_name());
        if self.options.config_only && config == Some(false) && !is_key {
            tracing::trace!(%path, "pruning non-configuration node");
            return Ok(());
        }

        let inner = Frame {
            path,
            config,
            keys: &[],
            in_choice: false,
            ..frame.clone()
        };
        let Some(schema) = self.build_data_node(node, &inner, operations)? else {
            return Ok(());
        };
        body.insert(node.name.clone(), schema, &frame.path)?;
        if !frame.in_choice && matches!(node.kind, NodeKind::Leaf { mandatory: true, .. }) {
            body.required.push(node.name.clone());
        }
        Ok(())
    }

    /// The schema of a data node, or `None` when it is pruned.
    fn build_data_node(
        &self,
        node: &SchemaNode,
        frame: &Frame<'_>,
        operations: &mut Properties,
    ) -> Result<Option<JsonSchemaNode>, CompileError> {
        tracing::trace!(path = %frame.path, kind = node.keyword(), "building node");
        let schema = match &node.kind {
            NodeKind::Container { presence, children } => {
                let mut inner = ObjectBody::default();
                self.build_children(children, frame, &mut inner, operations)?;
                if self.options.config_only && inner.properties.is_empty() && !presence {
                    tracing::trace!(path = %frame.path, "omitting container without configuration children");
                    return Ok(None);
                }
                let mut schema = inner.into_schema(self.options.additional_properties);
                schema.description = self.annotate(node, None);
                schema
            }
            NodeKind::List {
                key,
                min_elements,
                max_elements,
                children,
            } => {
                let entry_frame = Frame {
                    keys: key,
                    ..frame.clone()
                };
                let mut entry = ObjectBody::default();
                self.build_children(children, &entry_frame, &mut entry, operations)?;
                let mut required = key
                    .iter()
                    .map(|k| {
                        entry.property_for_key(k).map(str::to_string).ok_or_else(|| {
                            CompileError::invalid_constraint(&frame.path, format!("list key '{k}' names no leaf of the list"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                required.append(&mut entry.required);
                entry.required = required;

                let mut schema = JsonSchemaNode::array(entry.into_schema(self.options.additional_properties));
                schema.min_items = *min_elements;
                schema.max_items = *max_elements;
                schema.description = self.annotate(node, None);
                schema
            }
            NodeKind::Leaf { type_spec, default, .. } => {
                let resolved = self
                    .resolver
                    .resolve_type(type_spec, frame.scope, &mut Visiting::new(), &frame.path)?;
                let mut schema = self.mapper.map(&resolved, &self.leafrefs, frame.scope, &frame.path)?;
                schema.default = default.as_deref().map(|text| default_value(text, &schema));
                schema.description = self.annotate(node, Some(&resolved));
                schema
            }
            NodeKind::LeafList {
                type_spec,
                min_elements,
                max_elements,
            } => {
                let resolved = self
                    .resolver
                    .resolve_type(type_spec, frame.scope, &mut Visiting::new(), &frame.path)?;
                let mut schema = JsonSchemaNode::array(self.mapper.map(&resolved, &self.leafrefs, frame.scope, &frame.path)?);
                schema.min_items = *min_elements;
                schema.max_items = *max_elements;
                schema.description = self.annotate(node, Some(&resolved));
                schema
            }
            NodeKind::Anydata | NodeKind::Anyxml => {
                let mut schema = JsonSchemaNode::of_type(JsonType::Object);
                schema.description = self.annotate(node, None);
                schema
            }
            NodeKind::Module { .. }
            | NodeKind::Choice { .. }
            | NodeKind::Case { .. }
            | NodeKind::Grouping { .. }
            | NodeKind::Typedef { .. }
            | NodeKind::Identity { .. }
            | NodeKind::Uses { .. }
            | NodeKind::Rpc { .. }
            | NodeKind::Action { .. } => return Ok(None),
        };
        Ok(Some(schema))
    }

    fn build_choice(
        &self,
        choice: &SchemaNode,
        cases: &[SchemaNode],
        frame: &Frame<'_>,
        body: &mut ObjectBody,
        operations: &mut Properties,
    ) -> Result<(), CompileError> {
        let choice_frame = self.transparent_frame(choice, frame)?;
        let mut merged = Properties::new();
        let mut alternatives: Vec<String> = Vec::new();
        for case in cases {
            let mut case_body = ObjectBody::default();
            match &case.kind {
                NodeKind::Case { children } => {
                    let case_frame = self.transparent_frame(case, &choice_frame)?;
                    self.build_children(children, &case_frame, &mut case_body, operations)?;
                }
                // Shorthand: a data node directly under the choice is its own case.
                _ => self.build_children(std::slice::from_ref(case), &choice_frame, &mut case_body, operations)?,
            }
            for (name, schema) in case_body.properties.into_entries() {
                merge_alternative(&mut merged, &mut alternatives, name, schema);
            }
        }
        for (name, schema) in merged.into_entries() {
            body.insert(name, schema, &frame.path)?;
        }
        Ok(())
    }

    /// Frame for the contents of a choice or case: same object, own config.
    fn transparent_frame<'f>(&self, node: &SchemaNode, frame: &Frame<'f>) -> Result<Frame<'f>, CompileError> {
        let config = match frame.config {
            Some(inherited) => Some(classify(
                node.config,
                inherited,
                self.options.config_policy,
                &frame.path.child(node.name.clone()),
            )?),
            None => None,
        };
        Ok(Frame {
            config,
            keys: &[],
            in_choice: true,
            ..frame.clone()
        })
    }

    fn build_operation(
        &self,
        node: &SchemaNode,
        input: Option<&[SchemaNode]>,
        output: Option<&[SchemaNode]>,
        frame: &Frame<'_>,
    ) -> Result<(String, JsonSchemaNode), CompileError> {
        let path = frame.path.child(node.name.clone());
        let key = match node.kind {
            NodeKind::Action { .. } => path.to_string(),
            _ => format!("{}:{}", frame.module, node.local_name()),
        };
        tracing::debug!(operation = %key, "building operation");

        let mut operation = ObjectBody::default();
        for (label, body) in [("input", input), ("output", output)] {
            let Some(body) = body else { continue };
            let inner = Frame {
                path: path.child(label),
                config: None,
                keys: &[],
                in_choice: false,
                ..frame.clone()
            };
            let mut object = ObjectBody::default();
            // Operations cannot nest; anything collected here is discarded.
            self.build_children(body, &inner, &mut object, &mut Properties::new())?;
            operation.insert(
                label.to_string(),
                object.into_schema(self.options.additional_properties),
                &path,
            )?;
        }
        let mut schema = operation.into_schema(self.options.additional_properties);
        schema.description = self.annotate(node, None);
        Ok((key, schema))
    }

    fn annotate(&self, node: &SchemaNode, ty: Option<&ResolvedType>) -> Option<String> {
        if !self.options.annotate {
            return None;
        }
        annotation(node.description.as_deref(), ty, &node.when)
    }
}

/// Add one case's property to the merged choice properties.
fn merge_alternative(merged: &mut Properties, alternatives: &mut Vec<String>, name: String, schema: JsonSchemaNode) {
    let Err((name, schema)) = merged.insert(name, schema) else {
        return;
    };
    let Some(existing) = merged.get_mut(&name) else {
        return;
    };
    if alternatives.contains(&name) {
        if !existing.any_of.contains(&schema) {
            existing.any_of.push(schema);
        }
    } else if *existing != schema {
        let first = std::mem::take(existing);
        *existing = JsonSchemaNode::any_of(vec![first, schema]);
        alternatives.push(name);
    }
}

/// A leaf `default` as a JSON value of the leaf's type, falling back to the
/// string form.
fn default_value(text: &str, schema: &JsonSchemaNode) -> Value {
    let parsed = match schema.json_type {
        Some(JsonType::Integer) => text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<u64>().map(Value::from))
            .ok(),
        Some(JsonType::Number) => text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
        Some(JsonType::Boolean) => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(text.to_string()))
}
