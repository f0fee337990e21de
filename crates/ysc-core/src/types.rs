//! # Type Statements
//!
//! [`TypeSpec`] is a YANG `type` statement exactly as the parser delivers it:
//! a type name plus whatever restriction substatements were written at that
//! point in the derivation chain. Restriction arguments stay in their YANG
//! source form (`"1..10 | 20..max"`); interpreting and intersecting them is the
//! compiler's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A YANG `type` statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeSpec {
    /// Built-in type name or (qualified) typedef name.
    pub name: String,
    /// `range` argument for integer and decimal64 types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// `length` argument for string and binary types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// `pattern` substatements; all must match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternSpec>,
    /// `enum` substatements, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumSpec>,
    /// `bit` names for the bits type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bits: Vec<String>,
    /// `fraction-digits` for decimal64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u8>,
    /// `path` argument for leafref.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `base` arguments for identityref.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    /// Member types of a union, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeSpec>,
}

impl TypeSpec {
    /// An unrestricted type statement.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An `enumeration` with the given values.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "enumeration".into(),
            enums: values.into_iter().map(EnumSpec::new).collect(),
            ..Self::default()
        }
    }

    /// A `union` of the given members.
    pub fn union(members: Vec<TypeSpec>) -> Self {
        Self {
            name: "union".into(),
            types: members,
            ..Self::default()
        }
    }

    /// A `leafref` to `path`.
    pub fn leafref(path: impl Into<String>) -> Self {
        Self {
            name: "leafref".into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// An `identityref` with a single base.
    pub fn identityref(base: impl Into<String>) -> Self {
        Self {
            name: "identityref".into(),
            bases: vec![base.into()],
            ..Self::default()
        }
    }

    /// Set the `range` restriction.
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Set the `length` restriction.
    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    /// Add a `pattern` restriction.
    pub fn with_pattern(mut self, regex: impl Into<String>) -> Self {
        self.patterns.push(PatternSpec::new(regex));
        self
    }

    /// The built-in this statement names directly, if it is not a typedef.
    pub fn builtin(&self) -> Option<BuiltinType> {
        self.name.parse().ok()
    }
}

/// A `pattern` restriction. Accepts either a bare string or
/// `{regex, invert-match}` when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PatternRepr", rename_all = "kebab-case")]
pub struct PatternSpec {
    /// The XSD regular expression, implicitly anchored.
    pub regex: String,
    /// `modifier invert-match`: the value must NOT match.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub invert_match: bool,
}

impl PatternSpec {
    /// A plain (non-inverted) pattern.
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            invert_match: false,
        }
    }

    /// An inverted pattern.
    pub fn inverted(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            invert_match: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Bare(String),
    #[serde(rename_all = "kebab-case")]
    Full {
        regex: String,
        #[serde(default)]
        invert_match: bool,
    },
}

impl From<PatternRepr> for PatternSpec {
    fn from(repr: PatternRepr) -> Self {
        match repr {
            PatternRepr::Bare(regex) => Self::new(regex),
            PatternRepr::Full {
                regex,
                invert_match,
            } => Self {
                regex,
                invert_match,
            },
        }
    }
}

/// An `enum` substatement. Accepts either a bare string or
/// `{name, description}` when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EnumRepr")]
pub struct EnumSpec {
    /// The enum value as it appears in instance data.
    pub name: String,
    /// Optional `description` of the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EnumSpec {
    /// An enum value without description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnumRepr {
    Bare(String),
    Full {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<EnumRepr> for EnumSpec {
    fn from(repr: EnumRepr) -> Self {
        match repr {
            EnumRepr::Bare(name) => Self::new(name),
            EnumRepr::Full { name, description } => Self { name, description },
        }
    }
}

/// The YANG built-in types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    String,
    Binary,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Enumeration,
    Bits,
    Union,
    Leafref,
    Identityref,
    InstanceIdentifier,
    Empty,
}

impl BuiltinType {
    /// The YANG keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 => "decimal64",
            Self::Enumeration => "enumeration",
            Self::Bits => "bits",
            Self::Union => "union",
            Self::Leafref => "leafref",
            Self::Identityref => "identityref",
            Self::InstanceIdentifier => "instance-identifier",
            Self::Empty => "empty",
        }
    }

    /// Value bounds of an integer type, by width and signedness.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Self::Uint8 => (0, u8::MAX as i128),
            Self::Uint16 => (0, u16::MAX as i128),
            Self::Uint32 => (0, u32::MAX as i128),
            Self::Uint64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    /// Returns true for the 64-bit integer types, which RFC 7951 encodes
    /// as JSON strings.
    pub fn is_wide_integer(&self) -> bool {
        matches!(self, Self::Int64 | Self::Uint64)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "string" => Self::String,
            "binary" => Self::Binary,
            "boolean" => Self::Boolean,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "decimal64" => Self::Decimal64,
            "enumeration" => Self::Enumeration,
            "bits" => Self::Bits,
            "union" => Self::Union,
            "leafref" => Self::Leafref,
            "identityref" => Self::Identityref,
            "instance-identifier" => Self::InstanceIdentifier,
            "empty" => Self::Empty,
            other => return Err(format!("'{other}' is not a YANG built-in type")),
        };
        Ok(ty)
    }
}
