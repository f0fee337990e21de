//! # Output Model
//!
//! [`JsonSchemaNode`] is the typed counterpart of one JSON Schema object.
//! Field declaration order is the serialization order, and [`Properties`]
//! keeps insertion order, so the same tree always serializes to the same
//! bytes.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// A JSON Schema primitive type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

/// `items`: one schema for every element, or a positional tuple (pre-2020-12
/// drafts).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<JsonSchemaNode>),
    Tuple(Vec<JsonSchemaNode>),
}

/// One JSON Schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchemaNode {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_items: Option<Vec<JsonSchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<JsonSchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonSchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<JsonSchemaNode>>,
}

impl JsonSchemaNode {
    /// A node constrained only by `type`.
    pub fn of_type(json_type: JsonType) -> Self {
        Self {
            json_type: Some(json_type),
            ..Self::default()
        }
    }

    /// An object with the given properties.
    pub fn object(properties: Properties, additional_properties: bool) -> Self {
        Self {
            json_type: Some(JsonType::Object),
            properties: Some(properties),
            additional_properties: Some(additional_properties),
            ..Self::default()
        }
    }

    /// An array whose every element matches `items`.
    pub fn array(items: JsonSchemaNode) -> Self {
        Self {
            json_type: Some(JsonType::Array),
            items: Some(Items::Single(Box::new(items))),
            ..Self::default()
        }
    }

    /// A schema matching any of `alternatives`.
    pub fn any_of(alternatives: Vec<JsonSchemaNode>) -> Self {
        Self {
            any_of: alternatives,
            ..Self::default()
        }
    }

    /// Subschemas other than property values: items, tuple members, and
    /// composition members.
    pub fn nested_mut(&mut self) -> impl Iterator<Item = &mut JsonSchemaNode> {
        let items: Box<dyn Iterator<Item = &mut JsonSchemaNode> + '_> = match &mut self.items {
            Some(Items::Single(item)) => Box::new(std::iter::once(item.as_mut())),
            Some(Items::Tuple(members)) => Box::new(members.iter_mut()),
            None => Box::new(std::iter::empty()),
        };
        items
            .chain(self.prefix_items.iter_mut().flatten())
            .chain(self.all_of.iter_mut())
            .chain(self.any_of.iter_mut())
            .chain(self.not.iter_mut().map(|n| n.as_mut()))
    }
}

/// Convert an integer bound to a JSON number without loss.
pub fn integer_number(value: i128) -> Number {
    if let Ok(v) = i64::try_from(value) {
        Number::from(v)
    } else if let Ok(v) = u64::try_from(value) {
        Number::from(v)
    } else {
        // Outside every YANG integer type; the range parser never produces it.
        Number::from(if value < 0 { i64::MIN } else { i64::MAX })
    }
}

/// Ordered property map. Keys are unique; insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, JsonSchemaNode)>);

impl Properties {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `name` is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    /// The schema of property `name`.
    pub fn get(&self, name: &str) -> Option<&JsonSchemaNode> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Mutable access to property `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut JsonSchemaNode> {
        self.0.iter_mut().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Append a property. Returns the rejected entry if the key already exists.
    pub fn insert(&mut self, name: String, schema: JsonSchemaNode) -> Result<(), (String, JsonSchemaNode)> {
        if self.contains_key(&name) {
            return Err((name, schema));
        }
        self.0.push((name, schema));
        Ok(())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonSchemaNode)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries with mutable values, in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut JsonSchemaNode)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut JsonSchemaNode> {
        self.0.iter_mut().map(|(_, v)| v)
    }

    /// Consume into entries in insertion order.
    pub fn into_entries(self) -> Vec<(String, JsonSchemaNode)> {
        self.0
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
