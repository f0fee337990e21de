//! # Node Classifier
//!
//! Computes the effective `config` value of a node. An explicit statement
//! wins, otherwise the parent's value is inherited, and the root inherits
//! `true`. Once a subtree is `config false` every descendant is state data;
//! an explicit `config true` there is invalid YANG, handled according to
//! [`ConfigPolicy`].

use ysc_core::{CompileError, ConfigFlag, SchemaPath};

use crate::options::ConfigPolicy;

/// Effective `config` value of the root.
pub const ROOT_CONFIG: bool = true;

/// The effective `config` of a node with flag `flag` whose parent's
/// effective value is `inherited`.
///
/// # Errors
///
/// Returns [`CompileError::ConfigConflict`] under [`ConfigPolicy::Strict`]
/// for `config true` below a `config false` ancestor.
pub fn classify(
    flag: ConfigFlag,
    inherited: bool,
    policy: ConfigPolicy,
    path: &SchemaPath,
) -> Result<bool, CompileError> {
    match (flag, inherited) {
        (ConfigFlag::Inherited, inherited) => Ok(inherited),
        (ConfigFlag::False, _) => Ok(false),
        (ConfigFlag::True, true) => Ok(true),
        (ConfigFlag::True, false) => match policy {
            ConfigPolicy::Strict => Err(CompileError::ConfigConflict { path: path.clone() }),
            ConfigPolicy::Permissive => {
                tracing::warn!(%path, "config true below a config false ancestor; treating as config false");
                Ok(false)
            }
        },
    }
}
