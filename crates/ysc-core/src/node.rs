//! # Schema Tree
//!
//! The parsed YANG schema tree. A [`SchemaNode`] carries the attributes every
//! statement shares (name, `config`, `description`, `when`) and a [`NodeKind`]
//! holding the statement-specific payload.
//!
//! ## Serialized Form
//!
//! The tree is delivered by an external parser as JSON or YAML, one object per
//! statement, tagged by `kind`:
//!
//! ```yaml
//! kind: container
//! name: sys:system
//! children:
//!   - kind: leaf
//!     name: hostname
//!     type: { name: string, length: "1..253" }
//!   - kind: container
//!     name: state
//!     config: false
//! ```

use serde::{Deserialize, Serialize};

use crate::types::TypeSpec;

/// The `config` statement of a node: explicit, or inherited from the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ConfigFlag {
    /// No `config` statement; the parent's effective value applies.
    #[default]
    Inherited,
    /// `config true`.
    True,
    /// `config false`.
    False,
}

impl ConfigFlag {
    /// The explicit value, if any.
    pub fn explicit(&self) -> Option<bool> {
        match self {
            Self::Inherited => None,
            Self::True => Some(true),
            Self::False => Some(false),
        }
    }

    /// Returns true when no `config` statement was written.
    pub fn is_inherited(&self) -> bool {
        matches!(self, Self::Inherited)
    }
}

impl From<Option<bool>> for ConfigFlag {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Inherited,
            Some(true) => Self::True,
            Some(false) => Self::False,
        }
    }
}

impl From<ConfigFlag> for Option<bool> {
    fn from(flag: ConfigFlag) -> Self {
        flag.explicit()
    }
}

/// A node of the parsed YANG schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Statement argument, possibly module-prefixed (`if:interfaces`).
    /// Parsers may leave it out for `uses`, whose argument is `grouping`.
    #[serde(default)]
    pub name: String,
    /// The `config` statement.
    #[serde(default, skip_serializing_if = "ConfigFlag::is_inherited")]
    pub config: ConfigFlag,
    /// The `description` statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `when` conditions (XPath expressions).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<String>,
    /// Statement-specific payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Every YANG statement the compiler understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum NodeKind {
    /// A module; `prefix` qualifies bare definition names inside it.
    Module {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Container {
        #[serde(default)]
        presence: bool,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    List {
        #[serde(default)]
        key: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_elements: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_elements: Option<u64>,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Leaf {
        #[serde(rename = "type")]
        type_spec: TypeSpec,
        #[serde(default)]
        mandatory: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    LeafList {
        #[serde(rename = "type")]
        type_spec: TypeSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_elements: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_elements: Option<u64>,
    },
    Choice {
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Case {
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Grouping {
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Typedef {
        #[serde(rename = "type")]
        type_spec: TypeSpec,
    },
    Identity {
        #[serde(default)]
        bases: Vec<String>,
    },
    /// Inline expansion of the named grouping.
    Uses {
        grouping: String,
    },
    Anydata,
    Anyxml,
    Rpc {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Vec<SchemaNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Vec<SchemaNode>>,
    },
    Action {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Vec<SchemaNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Vec<SchemaNode>>,
    },
}

impl NodeKind {
    /// The YANG keyword of this statement.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Module { .. } => "module",
            Self::Container { .. } => "container",
            Self::List { .. } => "list",
            Self::Leaf { .. } => "leaf",
            Self::LeafList { .. } => "leaf-list",
            Self::Choice { .. } => "choice",
            Self::Case { .. } => "case",
            Self::Grouping { .. } => "grouping",
            Self::Typedef { .. } => "typedef",
            Self::Identity { .. } => "identity",
            Self::Uses { .. } => "uses",
            Self::Anydata => "anydata",
            Self::Anyxml => "anyxml",
            Self::Rpc { .. } => "rpc",
            Self::Action { .. } => "action",
        }
    }
}

impl SchemaNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            config: ConfigFlag::Inherited,
            description: None,
            when: Vec::new(),
            kind,
        }
    }

    /// A module with the given prefix.
    pub fn module(name: impl Into<String>, prefix: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(
            name,
            NodeKind::Module {
                prefix: Some(prefix.into()),
                children,
            },
        )
    }

    /// A non-presence container.
    pub fn container(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(
            name,
            NodeKind::Container {
                presence: false,
                children,
            },
        )
    }

    /// A list keyed by `key`.
    pub fn list<K, S>(name: impl Into<String>, key: K, children: Vec<SchemaNode>) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            NodeKind::List {
                key: key.into_iter().map(Into::into).collect(),
                min_elements: None,
                max_elements: None,
                children,
            },
        )
    }

    /// An optional leaf.
    pub fn leaf(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self::with_kind(
            name,
            NodeKind::Leaf {
                type_spec,
                mandatory: false,
                default: None,
            },
        )
    }

    /// A leaf-list.
    pub fn leaf_list(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self::with_kind(
            name,
            NodeKind::LeafList {
                type_spec,
                min_elements: None,
                max_elements: None,
            },
        )
    }

    /// A choice.
    pub fn choice(name: impl Into<String>, cases: Vec<SchemaNode>) -> Self {
        Self::with_kind(name, NodeKind::Choice { children: cases })
    }

    /// A case.
    pub fn case(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(name, NodeKind::Case { children })
    }

    /// A grouping.
    pub fn grouping(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(name, NodeKind::Grouping { children })
    }

    /// A typedef.
    pub fn typedef(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self::with_kind(name, NodeKind::Typedef { type_spec })
    }

    /// An identity derived from `bases`.
    pub fn identity<B, S>(name: impl Into<String>, bases: B) -> Self
    where
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            NodeKind::Identity {
                bases: bases.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// A `uses` of `grouping`.
    pub fn uses(grouping: impl Into<String>) -> Self {
        let grouping = grouping.into();
        Self::with_kind(grouping.clone(), NodeKind::Uses { grouping })
    }

    /// Set an explicit `config` value.
    pub fn with_config(mut self, config: bool) -> Self {
        self.config = Some(config).into();
        self
    }

    /// Set the `description`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark a leaf `mandatory true`. No effect on other kinds.
    pub fn mandatory(mut self) -> Self {
        if let NodeKind::Leaf { mandatory, .. } = &mut self.kind {
            *mandatory = true;
        }
        self
    }

    /// Mark a container as a presence container. No effect on other kinds.
    pub fn presence(mut self) -> Self {
        if let NodeKind::Container { presence, .. } = &mut self.kind {
            *presence = true;
        }
        self
    }

    /// The YANG keyword of this node.
    pub fn keyword(&self) -> &'static str {
        self.kind.keyword()
    }

    /// The name without its module prefix.
    pub fn local_name(&self) -> &str {
        crate::local_name(&self.name)
    }

    /// Child statements, in declaration order. Empty for leaf-like kinds.
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::Module { children, .. }
            | NodeKind::Container { children, .. }
            | NodeKind::List { children, .. }
            | NodeKind::Choice { children }
            | NodeKind::Case { children }
            | NodeKind::Grouping { children } => children,
            NodeKind::Leaf { .. }
            | NodeKind::LeafList { .. }
            | NodeKind::Typedef { .. }
            | NodeKind::Identity { .. }
            | NodeKind::Uses { .. }
            | NodeKind::Anydata
            | NodeKind::Anyxml
            | NodeKind::Rpc { .. }
            | NodeKind::Action { .. } => &[],
        }
    }

    /// The module prefix used to qualify bare definition names, for modules.
    pub fn module_prefix(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Module { prefix, .. } => Some(prefix.as_deref().unwrap_or(&self.name)),
            _ => None,
        }
    }

    /// Returns true for nodes that produce instance data (and so a JSON property).
    pub fn is_data_node(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Container { .. }
                | NodeKind::List { .. }
                | NodeKind::Leaf { .. }
                | NodeKind::LeafList { .. }
                | NodeKind::Anydata
                | NodeKind::Anyxml
        )
    }
}

/// The set of modules compiled together, as delivered by the parser.
///
/// Deserializes from either `{modules: [...]}` or a single module object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "UnitRepr")]
pub struct CompilationUnit {
    /// Parsed modules, in load order.
    pub modules: Vec<SchemaNode>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnitRepr {
    Unit { modules: Vec<SchemaNode> },
    Single(SchemaNode),
}

impl From<UnitRepr> for CompilationUnit {
    fn from(repr: UnitRepr) -> Self {
        match repr {
            UnitRepr::Unit { modules } => Self { modules },
            UnitRepr::Single(module) => Self {
                modules: vec![module],
            },
        }
    }
}

impl CompilationUnit {
    /// A unit of the given modules.
    pub fn new(modules: Vec<SchemaNode>) -> Self {
        Self { modules }
    }

    /// Look up a module by name or prefix.
    pub fn module(&self, name: &str) -> Option<&SchemaNode> {
        self.modules
            .iter()
            .find(|m| m.name == name || m.module_prefix() == Some(name))
    }
}
