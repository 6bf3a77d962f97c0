//! Application of buffered annotations to schemas and fields.
//!
//! Annotations are applied in buffer order, so a later occurrence of a
//! directive overwrites an earlier one. `@validate` is the exception: its
//! rules accumulate. A directive whose arguments have the wrong shape is
//! logged at debug level and leaves the attribute untouched.

use kxrd_core::{Field, Placement, Schema, ValidationRule};

use crate::annotation::Annotation;

/// Apply schema-level directives collected before a `schema` header.
pub fn apply_schema_directives(schema: &mut Schema, annotations: &[Annotation]) {
    for ann in annotations {
        match ann.name.as_str() {
            "xrd" => {
                if let Some(v) = flag(ann) {
                    schema.is_marked_root = v;
                }
            }
            "status" => {
                if let Some(v) = flag(ann) {
                    schema.is_status_schema = v;
                }
            }
            "mountPath" => {
                if let Some(path) = string(ann) {
                    schema.spec_mount_path = Some(path);
                }
            }
            "oneOf" => {
                if let Some(groups) = groups(ann) {
                    schema.one_of = groups;
                }
            }
            "anyOf" => {
                if let Some(groups) = groups(ann) {
                    schema.any_of = groups;
                }
            }
            other => {
                tracing::trace!(directive = other, schema = %schema.name, "ignoring directive on schema");
            }
        }
    }
}

/// Apply field-level directives collected before a field declaration.
pub fn apply_field_directives(field: &mut Field, annotations: &[Annotation]) {
    for ann in annotations {
        let v = &mut field.validation;
        match ann.name.as_str() {
            "pattern" => set(&mut v.pattern, string(ann)),
            "minLength" => set(&mut v.min_length, int(ann)),
            "maxLength" => set(&mut v.max_length, int(ann)),
            "minimum" => set(&mut v.minimum, int(ann)),
            "maximum" => set(&mut v.maximum, int(ann)),
            "minItems" => set(&mut v.min_items, int(ann)),
            "maxItems" => set(&mut v.max_items, int(ann)),
            "enum" => {
                if let Some(values) = list(ann) {
                    v.enum_values = values;
                }
            }
            "immutable" => {
                if let Some(b) = flag(ann) {
                    v.immutable = b;
                }
            }
            "validate" => match ann.string_args().as_deref() {
                Some([rule]) => v.rules.push(ValidationRule {
                    rule: rule.clone(),
                    message: None,
                }),
                Some([rule, message]) => v.rules.push(ValidationRule {
                    rule: rule.clone(),
                    message: Some(message.clone()),
                }),
                _ => {
                    malformed::<()>(ann);
                }
            },
            "preserveUnknownFields" => {
                if let Some(b) = flag(ann) {
                    v.preserve_unknown_fields = b;
                }
            }
            "itemsPreserveUnknownFields" => {
                if let Some(b) = flag(ann) {
                    v.items_preserve_unknown_fields = b;
                }
            }
            "format" => set(&mut v.format, string(ann)),
            "itemsFormat" => set(&mut v.items_format, string(ann)),
            "mapType" => set(&mut v.map_type, string(ann)),
            "listType" => set(&mut v.list_type, string(ann)),
            "listMapKeys" => {
                if let Some(keys) = list(ann) {
                    v.list_map_keys = keys;
                }
            }
            "additionalProperties" => {
                if let Some(b) = flag(ann) {
                    v.additional_properties = b;
                }
            }
            "oneOf" => {
                if let Some(g) = groups(ann) {
                    v.one_of = g;
                }
            }
            "anyOf" => {
                if let Some(g) = groups(ann) {
                    v.any_of = g;
                }
            }
            "status" => {
                if flag(ann) == Some(true) {
                    field.placement = Placement::Status;
                }
            }
            "topLevelSpec" => {
                if flag(ann) == Some(true) && field.placement != Placement::Status {
                    field.placement = Placement::TopLevelSpec;
                }
            }
            other => {
                tracing::trace!(directive = other, field = %field.name, "ignoring directive on field");
            }
        }
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn flag(ann: &Annotation) -> Option<bool> {
    ann.flag().or_else(|| malformed(ann))
}

fn string(ann: &Annotation) -> Option<String> {
    ann.string_arg().or_else(|| malformed(ann))
}

fn int(ann: &Annotation) -> Option<i64> {
    ann.int_arg().or_else(|| malformed(ann))
}

fn list(ann: &Annotation) -> Option<Vec<String>> {
    ann.list_arg().or_else(|| malformed(ann))
}

fn groups(ann: &Annotation) -> Option<Vec<Vec<String>>> {
    ann.groups_arg().or_else(|| malformed(ann))
}

fn malformed<T>(ann: &Annotation) -> Option<T> {
    tracing::debug!(
        directive = %ann.name,
        args = ann.args.as_deref().unwrap_or(""),
        "malformed annotation arguments; attribute left unset"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use kxrd_core::Validation;

    fn anns(lines: &[&str]) -> Vec<Annotation> {
        lines.iter().filter_map(|l| Annotation::parse(l)).collect()
    }

    #[test]
    fn schema_directives() {
        let mut schema = Schema::new("XBucket");
        apply_schema_directives(
            &mut schema,
            &anns(&[
                "@xrd",
                r#"@mountPath("network")"#,
                r#"@oneOf([["a"], ["b"]])"#,
                r#"@anyOf([["c", "d"]])"#,
            ]),
        );
        assert!(schema.is_marked_root);
        assert!(!schema.is_status_schema);
        assert_eq!(schema.spec_mount_path.as_deref(), Some("network"));
        assert_eq!(schema.one_of.len(), 2);
        assert_eq!(schema.any_of, vec![vec!["c".to_string(), "d".to_string()]]);
    }

    #[test]
    fn field_validation_directives() {
        let mut field = Field::new("name", "str", true);
        apply_field_directives(
            &mut field,
            &anns(&[
                r#"@pattern("^[a-z]+$")"#,
                "@minLength(3)",
                "@maxLength(63)",
                r#"@enum(["a", "b"])"#,
                "@immutable",
                r#"@format("hostname")"#,
            ]),
        );
        let v = &field.validation;
        assert_eq!(v.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(v.min_length, Some(3));
        assert_eq!(v.max_length, Some(63));
        assert_eq!(v.enum_values, vec!["a".to_string(), "b".to_string()]);
        assert!(v.immutable);
        assert_eq!(v.format.as_deref(), Some("hostname"));
    }

    #[test]
    fn malformed_min_length_is_a_no_op() {
        let mut field = Field::new("name", "str", true);
        apply_field_directives(&mut field, &anns(&["@minLength(three)"]));
        assert_eq!(field.validation, Validation::default());
    }

    #[test]
    fn malformed_annotation_does_not_clear_earlier_value() {
        let mut field = Field::new("name", "str", true);
        apply_field_directives(&mut field, &anns(&["@minLength(2)", "@minLength(x)"]));
        assert_eq!(field.validation.min_length, Some(2));
    }

    #[test]
    fn later_directive_overwrites_earlier() {
        let mut field = Field::new("count", "int", true);
        apply_field_directives(&mut field, &anns(&["@maximum(5)", "@maximum(10)"]));
        assert_eq!(field.validation.maximum, Some(10));
    }

    #[test]
    fn validate_rules_accumulate_in_order() {
        let mut field = Field::new("size", "int", true);
        apply_field_directives(
            &mut field,
            &anns(&[
                r#"@validate("self > 0")"#,
                r#"@validate("self < 100", "too large")"#,
                "@validate(42)",
            ]),
        );
        let rules = &field.validation.rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule, "self > 0");
        assert_eq!(rules[0].message, None);
        assert_eq!(rules[1].message.as_deref(), Some("too large"));
    }

    #[test]
    fn placement_directives() {
        let mut observed = Field::new("ready", "bool", false);
        apply_field_directives(&mut observed, &anns(&["@status"]));
        assert_eq!(observed.placement, Placement::Status);

        let mut top = Field::new("providerConfigRef", "str", false);
        apply_field_directives(&mut top, &anns(&["@topLevelSpec"]));
        assert_eq!(top.placement, Placement::TopLevelSpec);

        let mut both = Field::new("x", "str", false);
        apply_field_directives(&mut both, &anns(&["@status", "@topLevelSpec"]));
        assert_eq!(both.placement, Placement::Status);
    }

    #[test]
    fn items_scoped_directives() {
        let mut field = Field::new("filters", "[{any:any}]", false);
        apply_field_directives(
            &mut field,
            &anns(&["@itemsPreserveUnknownFields", r#"@itemsFormat("uuid")"#]),
        );
        assert!(field.validation.items_preserve_unknown_fields);
        assert!(!field.validation.preserve_unknown_fields);
        assert_eq!(field.validation.items_format.as_deref(), Some("uuid"));
    }
}
