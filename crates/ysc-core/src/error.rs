//! # Error Types: Compile Error Taxonomy
//!
//! Every failure the compiler can report. All variants are fatal to the
//! compilation that raised them: no partial schema is ever emitted, since a
//! validation schema that silently drops a constraint accepts instances it
//! should reject.
//!
//! ## Design
//!
//! - Reference errors name the reference and what kind of symbol it targets.
//! - Structural errors carry the [`SchemaPath`] of the offending node.
//! - Cycle errors carry the full chain, closing back on the repeated name.

use std::fmt;

use thiserror::Error;

use crate::path::SchemaPath;

/// What a symbolic reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A `typedef` (or an unknown built-in type name).
    Typedef,
    /// A `grouping` named by `uses`.
    Grouping,
    /// An `identity` named as a base.
    Identity,
    /// The target path of a `leafref`.
    Leafref,
    /// The compilation root selected by the caller.
    Root,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Typedef => "typedef",
            Self::Grouping => "grouping",
            Self::Identity => "identity",
            Self::Leafref => "leafref",
            Self::Root => "root",
        };
        f.write_str(s)
    }
}

/// Top-level error type for a compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A typedef, grouping, or leafref chain refers back to itself.
    #[error("cyclic {kind} reference at {path}: {}", chain.join(" -> "))]
    Cycle {
        /// What kind of symbol forms the cycle.
        kind: ReferenceKind,
        /// Where the cyclic reference was reached from.
        path: SchemaPath,
        /// The resolution chain, ending with the repeated name.
        chain: Vec<String>,
    },

    /// A typedef, grouping, identity, or leafref target does not exist.
    #[error("unresolved {kind} reference '{reference}' at {path}")]
    UnresolvedReference {
        /// What kind of symbol was expected.
        kind: ReferenceKind,
        /// The reference as written.
        reference: String,
        /// Where the reference occurs.
        path: SchemaPath,
    },

    /// Restrictions across a derivation chain have an empty intersection,
    /// or a restriction cannot be parsed.
    #[error("invalid constraint at {path}: {reason}")]
    InvalidConstraint {
        /// Where the restriction was applied.
        path: SchemaPath,
        /// Why the restriction is unsatisfiable or malformed.
        reason: String,
    },

    /// Two sibling properties map to the same JSON key.
    #[error("name collision at {path}: '{first}' and '{second}' both become '{name}'")]
    NameCollision {
        /// The parent object holding both properties.
        path: SchemaPath,
        /// The colliding output key.
        name: String,
        /// The first original name.
        first: String,
        /// The second original name.
        second: String,
    },

    /// An explicit `config true` below a `config false` ancestor, rejected
    /// under the strict config policy.
    #[error("config true at {path} is below a config false ancestor")]
    ConfigConflict {
        /// The node that declares `config true`.
        path: SchemaPath,
    },

    /// The same qualified name is defined twice in one compilation unit.
    #[error("duplicate {kind} definition '{name}'")]
    DuplicateDefinition {
        /// What kind of symbol is duplicated.
        kind: ReferenceKind,
        /// The qualified name.
        name: String,
    },

    /// The output document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the output document failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Shorthand for [`CompileError::InvalidConstraint`].
    pub fn invalid_constraint(path: &SchemaPath, reason: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CompileError::UnresolvedReference`].
    pub fn unresolved(kind: ReferenceKind, reference: impl Into<String>, path: &SchemaPath) -> Self {
        Self::UnresolvedReference {
            kind,
            reference: reference.into(),
            path: path.clone(),
        }
    }

    /// The schema path attached to this error, if any.
    pub fn path(&self) -> Option<&SchemaPath> {
        match self {
            Self::Cycle { path, .. }
            | Self::UnresolvedReference { path, .. }
            | Self::InvalidConstraint { path, .. }
            | Self::NameCollision { path, .. }
            | Self::ConfigConflict { path } => Some(path),
            Self::DuplicateDefinition { .. } | Self::Serialization(_) | Self::Io(_) => None,
        }
    }
}
