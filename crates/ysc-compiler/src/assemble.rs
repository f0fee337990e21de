//! # Document Assembler
//!
//! Wraps the built modules in the top-level schema document: `$schema`,
//! `title`, and a root object. Under [`Layout::Flat`] the root's properties
//! are the top-level data nodes of every compiled module. Under
//! [`Layout::Split`] the root has two objects, `data` and `operations`.

use std::io::Write;

use serde::Serialize;
use ysc_core::{CompileError, SchemaPath};

use crate::builder::{ModuleSchema, ObjectBody};
use crate::normalize::strip_namespaces;
use crate::options::{CompileOptions, Layout};
use crate::output::{JsonSchemaNode, Properties};

/// A complete JSON Schema document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Draft URI.
    #[serde(rename = "$schema")]
    pub schema: String,
    pub title: String,
    #[serde(flatten)]
    pub root: JsonSchemaNode,
}

impl Document {
    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CompileError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

/// Assemble `modules` into one document titled `title`.
///
/// # Errors
///
/// - [`CompileError::NameCollision`] when two modules define the same
///   top-level node, or namespace stripping merges two keys.
pub fn assemble(modules: Vec<ModuleSchema>, title: String, options: &CompileOptions) -> Result<Document, CompileError> {
    let root_path = SchemaPath::root();
    let description = match modules.as_slice() {
        [only] => only.description.clone(),
        _ => None,
    };

    let mut data = ObjectBody::default();
    let mut operations = Properties::new();
    for module in modules {
        for (name, schema) in module.data.properties.into_entries() {
            data.insert(name, schema, &root_path)?;
        }
        data.required.extend(module.data.required);
        for (name, schema) in module.operations.into_entries() {
            if let Err((name, _)) = operations.insert(name, schema) {
                return Err(CompileError::NameCollision {
                    path: root_path.clone(),
                    first: name.clone(),
                    second: name.clone(),
                    name,
                });
            }
        }
    }

    let mut data = data.into_schema(options.additional_properties);
    if options.strip_namespaces {
        strip_namespaces(&mut data, &root_path)?;
        for (name, schema) in operations.iter_mut() {
            strip_namespaces(schema, &root_path.child(name.to_string()))?;
        }
    }

    let mut root = match options.layout {
        Layout::Flat => data,
        Layout::Split => {
            let mut sections = ObjectBody::default();
            sections.insert("data".into(), data, &root_path)?;
            sections.insert(
                "operations".into(),
                JsonSchemaNode::object(operations, options.additional_properties),
                &root_path,
            )?;
            sections.into_schema(options.additional_properties)
        }
    };
    root.description = description;

    tracing::debug!(
        title = %title,
        draft = %options.draft,
        properties = root.properties.as_ref().map_or(0, Properties::len),
        "assembled schema document"
    );
    Ok(Document {
        schema: options.draft.uri().to_string(),
        title,
        root,
    })
}

/// Write `document` as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// [`CompileError::Serialization`] or [`CompileError::Io`].
pub fn write_document<W: Write>(document: &Document, mut writer: W) -> Result<(), CompileError> {
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::output::JsonType;

    fn module(name: &str, properties: Vec<(&str, JsonSchemaNode)>) -> ModuleSchema {
        let mut data = ObjectBody::default();
        for (key, schema) in properties {
            data.insert(key.to_string(), schema, &SchemaPath::root()).unwrap();
        }
        ModuleSchema {
            name: name.to_string(),
            description: Some(format!("The {name} module.")),
            data,
            operations: Properties::new(),
        }
    }

    #[test]
    fn flat_document_envelope() {
        let doc = assemble(
            vec![module("sys", vec![("sys:hostname", JsonSchemaNode::of_type(JsonType::String))])],
            "sys".into(),
            &CompileOptions::default(),
        )
        .unwrap();
        let text = doc.to_json().unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.starts_with("{\n  \"$schema\": \"https://json-schema.org/draft/2020-12/schema\",\n  \"title\": \"sys\""));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], json!("object"));
        assert_eq!(value["description"], json!("The sys module."));
        assert_eq!(value["additionalProperties"], json!(false));
        assert_eq!(value["properties"]["sys:hostname"], json!({"type": "string"}));
    }

    #[test]
    fn split_document_has_data_and_operations() {
        let mut sys = module("sys", vec![("sys:hostname", JsonSchemaNode::of_type(JsonType::String))]);
        sys.operations
            .insert("sys:restart".into(), JsonSchemaNode::object(Properties::new(), false))
            .unwrap();
        let options = CompileOptions {
            layout: Layout::Split,
            strip_namespaces: true,
            ..CompileOptions::default()
        };
        let doc = assemble(vec![sys], "sys".into(), &options).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["properties"]["data"]["properties"]["hostname"], json!({"type": "string"}));
        assert!(value["properties"]["operations"]["properties"].get("sys:restart").is_some());
    }

    #[test]
    fn modules_defining_the_same_node_collide() {
        let err = assemble(
            vec![
                module("a", vec![("system", JsonSchemaNode::default())]),
                module("b", vec![("system", JsonSchemaNode::default())]),
            ],
            "a, b".into(),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::NameCollision { .. }));
    }

    #[test]
    fn write_document_appends_newline() {
        let doc = assemble(vec![], "empty".into(), &CompileOptions::default()).unwrap();
        let mut out = Vec::new();
        write_document(&doc, &mut out).unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
        assert_eq!(String::from_utf8(out).unwrap(), doc.to_json().unwrap());
    }
}
