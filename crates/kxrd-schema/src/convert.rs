//! # Field Conversion
//!
//! Maps parsed fields to [`PropertySchema`] nodes.
//!
//! ## Type Mapping
//!
//! | Field type   | Node                                                        |
//! |--------------|-------------------------------------------------------------|
//! | `str` etc.   | scalar `type`                                               |
//! | `any`        | no `type` at all                                            |
//! | `[T]`        | `type: array`, `items` = convert(T)                         |
//! | `[{any:any}]`| array of open objects; the marker sits on the item node     |
//! | `{K:V}`      | `type: object`, `additionalProperties` = convert(V)         |
//! | known schema | object expanded inline from the referenced schema's fields  |
//! | anything else| generic `type: object`                                      |
//!
//! Inline expansion tracks the chain of schemas being expanded. Reaching a
//! schema already on that chain fails with [`XrdError::CyclicReference`].
//!
//! ## Literal Coercion
//!
//! Defaults and enum values are unquoted, then coerced by the field's
//! scalar type. A literal that does not coerce is kept as its unquoted
//! string.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use kxrd_core::{Field, Result, Scalar, Schema, TypeExpr, Validation, XrdError};

use crate::property::{AdditionalProperties, CelRule, NodeType, PropertySchema, RequiredGroup};

/// CEL rule emitted for `@immutable`.
pub const IMMUTABLE_RULE: &str = "self == oldSelf";

/// Message attached to [`IMMUTABLE_RULE`].
pub const IMMUTABLE_MESSAGE: &str = "Value is immutable";

/// Converts fields against one schema table.
#[derive(Debug)]
pub struct Converter<'a> {
    table: &'a BTreeMap<String, Schema>,
    /// Schemas currently being expanded, outermost first.
    path: Vec<String>,
}

impl<'a> Converter<'a> {
    pub fn new(table: &'a BTreeMap<String, Schema>) -> Self {
        Self {
            table,
            path: Vec::new(),
        }
    }

    /// Push `name` onto the expansion chain.
    ///
    /// # Errors
    ///
    /// Returns [`XrdError::CyclicReference`] when `name` is already on it.
    pub fn enter(&mut self, name: &str) -> Result<()> {
        if self.path.iter().any(|p| p == name) {
            let mut path = self.path.clone();
            path.push(name.to_string());
            return Err(XrdError::CyclicReference { path });
        }
        self.path.push(name.to_string());
        Ok(())
    }

    /// Pop the innermost schema off the expansion chain.
    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// Expand a schema into an object node carrying all its fields.
    pub fn schema_object(&mut self, schema: &Schema) -> Result<PropertySchema> {
        self.enter(&schema.name)?;
        let mut node = PropertySchema {
            description: schema.description.clone(),
            ..PropertySchema::object()
        };
        for field in &schema.fields {
            let property = self.field(field)?;
            node.insert_property(&field.name, property, field.required);
        }
        node.push_groups(&schema.one_of, &schema.any_of);
        self.leave();
        Ok(node)
    }

    /// Convert one field, applying every annotation it carries.
    pub fn field(&mut self, field: &Field) -> Result<PropertySchema> {
        let expr = field.type_expr();
        let mut node = self.type_node(&expr)?;
        if field.description.is_some() {
            node.description = field.description.clone();
        }
        if let Some(raw) = &field.raw_default {
            node.default = Some(coerce_default(raw, &expr));
        }
        apply_validation(&mut node, &field.validation, expr.scalar(), &field.name);
        Ok(node)
    }

    /// Convert a type expression.
    pub fn type_node(&mut self, expr: &TypeExpr) -> Result<PropertySchema> {
        let table = self.table;
        Ok(match expr {
            TypeExpr::Scalar(scalar) => PropertySchema::typed(NodeType::from(*scalar)),
            TypeExpr::Any => PropertySchema::default(),
            TypeExpr::List(item) if item.is_any_dict() => {
                PropertySchema::array(PropertySchema::open_object())
            }
            TypeExpr::List(item) => PropertySchema::array(self.type_node(item)?),
            TypeExpr::Dict { value, .. } => PropertySchema {
                additional_properties: Some(AdditionalProperties::Schema(Box::new(
                    self.type_node(value)?,
                ))),
                ..PropertySchema::object()
            },
            TypeExpr::Named(name) => match table.get(name) {
                Some(schema) => self.schema_object(schema)?,
                None => {
                    tracing::debug!(type_name = %name, "unknown type; emitting generic object");
                    PropertySchema::object()
                }
            },
        })
    }
}

fn apply_validation(node: &mut PropertySchema, v: &Validation, scalar: Option<Scalar>, name: &str) {
    node.pattern = v.pattern.clone();
    node.min_length = v.min_length;
    node.max_length = v.max_length;
    node.minimum = v.minimum;
    node.maximum = v.maximum;
    node.min_items = v.min_items;
    node.max_items = v.max_items;
    node.enum_values = v.enum_values.iter().map(|e| coerce_scalar(e, scalar)).collect();
    if v.format.is_some() {
        node.format = v.format.clone();
    }
    node.map_type = v.map_type.clone();
    node.list_type = v.list_type.clone();
    node.list_map_keys = v.list_map_keys.clone();

    if v.preserve_unknown_fields {
        node.preserve_unknown_fields = Some(true);
    }
    if v.items_preserve_unknown_fields || v.items_format.is_some() {
        match node.items.as_deref_mut() {
            Some(items) => {
                if v.items_preserve_unknown_fields {
                    items.preserve_unknown_fields = Some(true);
                }
                if v.items_format.is_some() {
                    items.format = v.items_format.clone();
                }
            }
            None => tracing::debug!(field = name, "items directive on a non-array field ignored"),
        }
    }
    if v.additional_properties {
        if !node.is_object() {
            tracing::debug!(field = name, "additionalProperties on a non-object field ignored");
        } else if node.additional_properties.is_none() {
            node.additional_properties = Some(AdditionalProperties::Allowed(true));
        }
    }

    if v.immutable {
        node.validations.push(CelRule {
            rule: IMMUTABLE_RULE.to_string(),
            message: Some(IMMUTABLE_MESSAGE.to_string()),
        });
    }
    node.validations.extend(v.rules.iter().map(|r| CelRule {
        rule: r.rule.clone(),
        message: r.message.clone(),
    }));

    node.one_of.extend(v.one_of.iter().map(RequiredGroup::from));
    node.any_of.extend(v.any_of.iter().map(RequiredGroup::from));
}

/// Remove one pair of matching surrounding quotes.
pub fn strip_quotes(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Coerce a default literal by the field's type.
///
/// List and dict defaults are read as JSON when they parse as such.
pub fn coerce_default(raw: &str, expr: &TypeExpr) -> Value {
    match expr {
        TypeExpr::List(_) | TypeExpr::Dict { .. } => {
            serde_json::from_str(raw.trim()).unwrap_or_else(|_| {
                tracing::debug!(default = raw, "collection default is not JSON; kept as string");
                Value::String(strip_quotes(raw).to_string())
            })
        }
        other => coerce_scalar(raw, other.scalar()),
    }
}

/// Coerce a scalar literal, falling back to the unquoted string.
pub fn coerce_scalar(raw: &str, scalar: Option<Scalar>) -> Value {
    let text = strip_quotes(raw);
    let coerced = match scalar {
        Some(Scalar::Integer) => text.parse::<i64>().ok().map(Value::from),
        Some(Scalar::Number) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some(Scalar::Boolean) => match text.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Some(Scalar::String) | None => return Value::String(text.to_string()),
    };
    coerced.unwrap_or_else(|| {
        tracing::debug!(literal = raw, "literal does not coerce to field type; kept as string");
        Value::String(text.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kxrd_core::ValidationRule;
    use serde_json::json;

    fn table(schemas: Vec<Schema>) -> BTreeMap<String, Schema> {
        schemas.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    fn schema(name: &str, fields: Vec<Field>) -> Schema {
        let mut s = Schema::new(name);
        s.fields = fields;
        s
    }

    fn convert(field: &Field, table: &BTreeMap<String, Schema>) -> Value {
        let node = Converter::new(table).field(field).unwrap();
        serde_json::to_value(node).unwrap()
    }

    #[test]
    fn scalar_fields() {
        let t = BTreeMap::new();
        assert_eq!(convert(&Field::new("a", "str", true), &t), json!({"type": "string"}));
        assert_eq!(convert(&Field::new("a", "int", true), &t), json!({"type": "integer"}));
        assert_eq!(convert(&Field::new("a", "float", true), &t), json!({"type": "number"}));
        assert_eq!(convert(&Field::new("a", "bool", true), &t), json!({"type": "boolean"}));
    }

    #[test]
    fn any_is_typeless() {
        let t = BTreeMap::new();
        assert_eq!(convert(&Field::new("a", "any", true), &t), json!({}));

        let mut open = Field::new("a", "any", true);
        open.validation.preserve_unknown_fields = true;
        assert_eq!(
            convert(&open, &t),
            json!({"x-kubernetes-preserve-unknown-fields": true})
        );
    }

    #[test]
    fn list_of_strings() {
        let t = BTreeMap::new();
        assert_eq!(
            convert(&Field::new("tags", "[str]", true), &t),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn list_of_any_dict_marks_items_not_array() {
        let t = BTreeMap::new();
        assert_eq!(
            convert(&Field::new("filter", "[{any:any}]", false), &t),
            json!({
                "type": "array",
                "items": {"type": "object", "x-kubernetes-preserve-unknown-fields": true},
            })
        );
    }

    #[test]
    fn dict_types() {
        let t = BTreeMap::new();
        assert_eq!(
            convert(&Field::new("labels", "{str:str}", false), &t),
            json!({"type": "object", "additionalProperties": {"type": "string"}})
        );
        assert_eq!(
            convert(&Field::new("extra", "{any:any}", false), &t),
            json!({"type": "object", "additionalProperties": {}})
        );
    }

    #[test]
    fn named_schema_expands_inline() {
        let inner = schema(
            "Inner",
            vec![Field::new("a", "str", true), Field::new("b", "int", false)],
        );
        let t = table(vec![inner]);
        assert_eq!(
            convert(&Field::new("p", "Inner", true), &t),
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "integer"}},
                "required": ["a"],
            })
        );
    }

    #[test]
    fn unknown_named_type_is_generic_object() {
        let t = BTreeMap::new();
        assert_eq!(
            convert(&Field::new("p", "Missing", true), &t),
            json!({"type": "object"})
        );
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let a = schema("A", vec![Field::new("b", "B", true)]);
        let b = schema("B", vec![Field::new("items", "[A]", false)]);
        let t = table(vec![a, b]);
        let err = Converter::new(&t)
            .schema_object(t.get("A").unwrap())
            .unwrap_err();
        match err {
            XrdError::CyclicReference { path } => assert_eq!(path, ["A", "B", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let node = schema("Node", vec![Field::new("next", "Node", false)]);
        let t = table(vec![node]);
        assert!(Converter::new(&t).schema_object(t.get("Node").unwrap()).is_err());
    }

    #[test]
    fn repeated_non_cyclic_reference_is_fine() {
        let leaf = schema("Leaf", vec![Field::new("x", "str", true)]);
        let root = schema(
            "Root",
            vec![Field::new("a", "Leaf", true), Field::new("b", "[Leaf]", true)],
        );
        let t = table(vec![leaf, root]);
        let node = Converter::new(&t)
            .schema_object(t.get("Root").unwrap())
            .unwrap();
        assert_eq!(node.properties.len(), 2);
    }

    #[test]
    fn default_coercion() {
        assert_eq!(coerce_scalar("5", Some(Scalar::Integer)), json!(5));
        assert_eq!(coerce_scalar("1.5", Some(Scalar::Number)), json!(1.5));
        assert_eq!(coerce_scalar("True", Some(Scalar::Boolean)), json!(true));
        assert_eq!(coerce_scalar("\"hello\"", Some(Scalar::String)), json!("hello"));
        assert_eq!(coerce_scalar("'x'", None), json!("x"));
    }

    #[test]
    fn failed_coercion_keeps_unquoted_string() {
        assert_eq!(coerce_scalar("\"five\"", Some(Scalar::Integer)), json!("five"));
        assert_eq!(coerce_scalar("maybe", Some(Scalar::Boolean)), json!("maybe"));
        assert_eq!(coerce_scalar("NaN", Some(Scalar::Number)), json!("NaN"));
    }

    #[test]
    fn collection_defaults() {
        let list = TypeExpr::parse("[str]");
        assert_eq!(coerce_default(r#"["a", "b"]"#, &list), json!(["a", "b"]));
        assert_eq!(coerce_default("[x]", &list), json!("[x]"));
    }

    #[test]
    fn optional_int_with_default() {
        let mut f = Field::new("count", "int", false);
        f.raw_default = Some("5".to_string());
        assert_eq!(
            convert(&f, &BTreeMap::new()),
            json!({"type": "integer", "default": 5})
        );
    }

    #[test]
    fn validation_keywords() {
        let mut f = Field::new("size", "int", true);
        f.description = Some("Disk size".to_string());
        f.validation.minimum = Some(1);
        f.validation.maximum = Some(100);
        f.validation.enum_values = vec!["10".to_string(), "20".to_string()];
        f.validation.immutable = true;
        f.validation.rules.push(ValidationRule {
            rule: "self % 10 == 0".to_string(),
            message: Some("multiple of ten".to_string()),
        });
        assert_eq!(
            convert(&f, &BTreeMap::new()),
            json!({
                "type": "integer",
                "description": "Disk size",
                "enum": [10, 20],
                "minimum": 1,
                "maximum": 100,
                "x-kubernetes-validations": [
                    {"rule": "self == oldSelf", "message": "Value is immutable"},
                    {"rule": "self % 10 == 0", "message": "multiple of ten"},
                ],
            })
        );
    }

    #[test]
    fn items_directives_target_item_node() {
        let mut f = Field::new("ids", "[str]", true);
        f.validation.items_format = Some("uuid".to_string());
        f.validation.list_type = Some("set".to_string());
        assert_eq!(
            convert(&f, &BTreeMap::new()),
            json!({
                "type": "array",
                "items": {"type": "string", "format": "uuid"},
                "x-kubernetes-list-type": "set",
            })
        );
    }

    #[test]
    fn additional_properties_only_on_objects() {
        let mut obj = Field::new("extra", "Missing", true);
        obj.validation.additional_properties = true;
        assert_eq!(
            convert(&obj, &BTreeMap::new()),
            json!({"type": "object", "additionalProperties": true})
        );

        let mut s = Field::new("name", "str", true);
        s.validation.additional_properties = true;
        assert_eq!(convert(&s, &BTreeMap::new()), json!({"type": "string"}));
    }

    #[test]
    fn field_level_groups() {
        let mut f = Field::new("source", "Missing", true);
        f.validation.one_of = vec![vec!["url".to_string()], vec!["path".to_string()]];
        assert_eq!(
            convert(&f, &BTreeMap::new()),
            json!({
                "type": "object",
                "oneOf": [{"required": ["url"]}, {"required": ["path"]}],
            })
        );
    }

    #[test]
    fn field_description_overrides_schema_description() {
        let mut inner = schema("Inner", vec![Field::new("a", "str", true)]);
        inner.description = Some("Inner doc".to_string());
        let t = table(vec![inner]);

        let plain = Converter::new(&t).field(&Field::new("p", "Inner", true)).unwrap();
        assert_eq!(plain.description.as_deref(), Some("Inner doc"));

        let mut described = Field::new("p", "Inner", true);
        described.description = Some("Field doc".to_string());
        let node = Converter::new(&t).field(&described).unwrap();
        assert_eq!(node.description.as_deref(), Some("Field doc"));
    }
}
