//! # Namespace Normalizer
//!
//! Rewrites `prefix:local` property keys to `local` throughout a finished
//! schema tree, `required` entries included. Runs after config filtering, so
//! a pruned node can never cause a collision.

use ysc_core::{local_name, CompileError, SchemaPath};

use crate::output::{JsonSchemaNode, Properties};

/// Strip module prefixes from every property key below `schema`, which sits
/// at `path`.
///
/// # Errors
///
/// Returns [`CompileError::NameCollision`] when two sibling keys have the
/// same local name (`a:state` and `b:state`).
pub fn strip_namespaces(schema: &mut JsonSchemaNode, path: &SchemaPath) -> Result<(), CompileError> {
    if let Some(properties) = schema.properties.take() {
        let mut renamed = Properties::new();
        let mut originals: Vec<String> = Vec::with_capacity(properties.len());
        for (original, mut child) in properties.into_entries() {
            strip_namespaces(&mut child, &path.child(original.clone()))?;
            let local = local_name(&original).to_string();
            if let Err((name, _)) = renamed.insert(local, child) {
                let first = originals
                    .iter()
                    .find(|o| local_name(o) == name)
                    .cloned()
                    .unwrap_or_else(|| name.clone());
                return Err(CompileError::NameCollision {
                    path: path.clone(),
                    name,
                    first,
                    second: original,
                });
            }
            originals.push(original);
        }
        schema.properties = Some(renamed);
    }
    for name in &mut schema.required {
        if let Some((_, local)) = name.split_once(':') {
            *name = local.to_string();
        }
    }

    for child in schema.nested_mut() {
        strip_namespaces(child, path)?;
    }
    Ok(())
}
