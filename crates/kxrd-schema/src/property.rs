//! # Property Schema Nodes
//!
//! [`PropertySchema`] is the recursive OpenAPI v3 node emitted for every
//! field, object and array item. Every keyword is optional and omitted from
//! the rendered document when unset, so a default node renders as `{}`
//! (matches anything).
//!
//! Object properties are held in [`Properties`], which serializes in
//! insertion order. Output ordering therefore follows field declaration
//! order and never depends on hash iteration.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use kxrd_core::Scalar;

/// The OpenAPI `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl From<Scalar> for NodeType {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::String => Self::String,
            Scalar::Integer => Self::Integer,
            Scalar::Number => Self::Number,
            Scalar::Boolean => Self::Boolean,
        }
    }
}

/// `additionalProperties`: a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<PropertySchema>),
}

/// One `oneOf`/`anyOf` alternative: a set of names that must all be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredGroup {
    pub required: Vec<String>,
}

/// One `x-kubernetes-validations` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CelRule {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A recursive OpenAPI v3 schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<RequiredGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<RequiredGroup>,
    #[serde(
        rename = "x-kubernetes-preserve-unknown-fields",
        skip_serializing_if = "Option::is_none"
    )]
    pub preserve_unknown_fields: Option<bool>,
    #[serde(rename = "x-kubernetes-map-type", skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
    #[serde(rename = "x-kubernetes-list-type", skip_serializing_if = "Option::is_none")]
    pub list_type: Option<String>,
    #[serde(rename = "x-kubernetes-list-map-keys", skip_serializing_if = "Vec::is_empty")]
    pub list_map_keys: Vec<String>,
    #[serde(rename = "x-kubernetes-validations", skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<CelRule>,
}

impl PropertySchema {
    /// A node with only `type` set.
    pub fn typed(node_type: NodeType) -> Self {
        Self {
            node_type: Some(node_type),
            ..Default::default()
        }
    }

    /// An empty `type: object` node.
    pub fn object() -> Self {
        Self::typed(NodeType::Object)
    }

    /// An object node that accepts arbitrary content.
    pub fn open_object() -> Self {
        Self {
            preserve_unknown_fields: Some(true),
            ..Self::object()
        }
    }

    /// An array node with the given item schema.
    pub fn array(items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(NodeType::Array)
        }
    }

    pub fn is_object(&self) -> bool {
        self.node_type == Some(NodeType::Object)
    }

    /// Add a named property, recording it as required when `required`.
    pub fn insert_property(&mut self, name: &str, schema: PropertySchema, required: bool) {
        if self.properties.insert(name, schema) {
            tracing::debug!(property = name, "duplicate property replaced");
            self.required.retain(|r| r != name);
        }
        if required {
            self.required.push(name.to_string());
        }
    }

    /// Attach schema-wide mutual-exclusion groups.
    pub fn push_groups(&mut self, one_of: &[Vec<String>], any_of: &[Vec<String>]) {
        self.one_of.extend(one_of.iter().map(RequiredGroup::from));
        self.any_of.extend(any_of.iter().map(RequiredGroup::from));
    }
}

impl From<&Vec<String>> for RequiredGroup {
    fn from(names: &Vec<String>) -> Self {
        Self {
            required: names.clone(),
        }
    }
}

/// Named child schemas in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertySchema)>);

impl Properties {
    /// Insert or replace. Returns true when an existing entry was replaced;
    /// a replaced entry keeps its original position.
    pub fn insert(&mut self, name: &str, schema: PropertySchema) -> bool {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = schema;
                true
            }
            None => {
                self.0.push((name.to_string(), schema));
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}
