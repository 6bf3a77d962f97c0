//! # Parsed Schema Model
//!
//! [`Schema`] is one `schema <Name>:` block; [`Field`] is one declared
//! member. Both are built by the scanner, which applies buffered
//! annotations at creation time, and are never mutated afterwards.

use std::collections::BTreeMap;

use crate::metadata::Metadata;
use crate::types::TypeExpr;

/// A named group of fields parsed from one `schema` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Unique key within one parse.
    pub name: String,
    /// From a block comment immediately following the header.
    pub description: Option<String>,
    /// Declaration order is significant for output ordering.
    pub fields: Vec<Field>,
    /// Marked with `@xrd`.
    pub is_marked_root: bool,
    /// Marked with `@status`: every field belongs to the observed state.
    pub is_status_schema: bool,
    /// `@mountPath("name")`: nest this schema under `spec.<name>`.
    pub spec_mount_path: Option<String>,
    /// Schema-wide `@oneOf` groups of required field names.
    pub one_of: Vec<Vec<String>>,
    /// Schema-wide `@anyOf` groups of required field names.
    pub any_of: Vec<Vec<String>>,
}

impl Schema {
    /// Create an empty schema with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Where a field lands in the generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Inside `spec.parameters` (the default bucket).
    #[default]
    Parameters,
    /// Directly under `spec`, as a sibling of `parameters` (`@topLevelSpec`).
    TopLevelSpec,
    /// Inside `status` (`@status`).
    Status,
}

/// A `x-kubernetes-validations` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub rule: String,
    pub message: Option<String>,
}

/// Validation attributes attached to a field by annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub pattern: Option<String>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub min_items: Option<i64>,
    pub max_items: Option<i64>,
    pub enum_values: Vec<String>,
    pub immutable: bool,
    /// `@validate` rules, in annotation order.
    pub rules: Vec<ValidationRule>,
    /// Preserve unknown fields on the field's own node.
    pub preserve_unknown_fields: bool,
    /// Preserve unknown fields on the array item node.
    pub items_preserve_unknown_fields: bool,
    pub format: Option<String>,
    pub items_format: Option<String>,
    pub map_type: Option<String>,
    pub list_type: Option<String>,
    pub list_map_keys: Vec<String>,
    /// `@additionalProperties`: allow undeclared keys on an object node.
    pub additional_properties: bool,
    pub one_of: Vec<Vec<String>>,
    pub any_of: Vec<Vec<String>>,
}

/// One declared member of a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// The literal type token, e.g. `str`, `[str]`, `{str:int}`, `Inner`.
    pub raw_type: String,
    pub description: Option<String>,
    /// False when the name carries the `?` optional marker.
    pub required: bool,
    /// Literal default text after `=`, inline comment removed.
    pub raw_default: Option<String>,
    pub validation: Validation,
    pub placement: Placement,
}

impl Field {
    /// Create a field with no annotations applied.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            required,
            ..Default::default()
        }
    }

    /// Lexical classification of [`Field::raw_type`].
    pub fn type_expr(&self) -> TypeExpr {
        TypeExpr::parse(&self.raw_type)
    }
}

/// Output of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// Every schema by name. A repeated name keeps the later definition.
    pub schemas: BTreeMap<String, Schema>,
    /// The last schema closed; the default conversion root.
    pub primary: Schema,
    /// File-level `__xrd_*` settings.
    pub metadata: Metadata,
}

impl ParseResult {
    /// Schema names in sorted order.
    pub fn schema_names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    /// Look up a schema by name.
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }
}
