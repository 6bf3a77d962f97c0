//! # Definition Generation
//!
//! Selects the conversion root and assembles the full
//! [`CompositeResourceDefinition`].
//!
//! ## Root Selection
//!
//! 1. An explicitly requested schema name.
//! 2. The single schema marked `@xrd`.
//! 3. The schema named by `__xrd_kind`.
//! 4. The primary schema (the last one closed).
//!
//! ## Placement
//!
//! The root's fields are partitioned in one pass. `@status` fields go to
//! `status`, `@topLevelSpec` fields sit directly under `spec`, and the rest
//! fill `spec.parameters`. Every other schema with a mount path adds one
//! object under `spec`, in schema-name order. Every other `@status` schema
//! seeds `status` ahead of the root's own observed fields.

use std::collections::BTreeMap;

use kxrd_core::{Metadata, ParseResult, Placement, Result, Schema, XrdError};

use crate::convert::Converter;
use crate::document::{
    CompositeResourceDefinition, DefinitionSpec, DefinitionVersion, Names, ObjectMeta,
    VersionSchema, API_VERSION, KIND,
};
use crate::options::{ConversionOptions, Settings};
use crate::property::PropertySchema;

/// Key of the default parameter bag under `spec`.
pub const PARAMETERS: &str = "parameters";

/// Pick the schema to convert.
///
/// # Errors
///
/// - [`XrdError::SchemaNotFound`] when `explicit` names no schema.
/// - [`XrdError::AmbiguousRoot`] when more than one schema is marked `@xrd`.
pub fn select_schema<'r>(result: &'r ParseResult, explicit: Option<&str>) -> Result<&'r Schema> {
    if let Some(name) = explicit {
        return result.schema(name).ok_or_else(|| XrdError::SchemaNotFound {
            name: name.to_string(),
            available: result.schema_names(),
        });
    }

    let mut marked = result.schemas.values().filter(|s| s.is_marked_root);
    match (marked.next(), marked.next()) {
        (Some(first), Some(second)) => {
            return Err(XrdError::AmbiguousRoot {
                first: first.name.clone(),
                second: second.name.clone(),
            })
        }
        (Some(only), None) => return Ok(only),
        _ => {}
    }

    if let Some(schema) = result
        .metadata
        .kind
        .as_deref()
        .and_then(|kind| result.schema(kind))
    {
        return Ok(schema);
    }

    Ok(result.schema(&result.primary.name).unwrap_or(&result.primary))
}

/// Select the root and convert it.
pub fn generate(result: &ParseResult, options: &ConversionOptions) -> Result<CompositeResourceDefinition> {
    let root = select_schema(result, options.schema.as_deref())?;
    convert(root, &result.schemas, &result.metadata, options)
}

/// Convert `root` against `table` into a definition.
///
/// # Errors
///
/// - [`XrdError::MissingGroup`] when no API group is known.
/// - [`XrdError::CyclicReference`] when inline expansion loops.
pub fn convert(
    root: &Schema,
    table: &BTreeMap<String, Schema>,
    metadata: &Metadata,
    options: &ConversionOptions,
) -> Result<CompositeResourceDefinition> {
    let settings = options.resolve(metadata, &root.name)?;
    tracing::debug!(
        root = %root.name,
        kind = %settings.names.kind,
        group = %settings.group,
        version = %settings.version,
        "generating definition"
    );

    let mut converter = Converter::new(table);
    let spec = spec_node(root, table, &mut converter)?;
    let status = status_node(root, table, &mut converter, settings.status_preserve_unknown_fields)?;

    let mut schema = PropertySchema::object();
    schema.insert_property("spec", spec, true);
    if let Some(status) = status {
        schema.insert_property("status", status, false);
    }

    Ok(document(settings, schema))
}

fn spec_node(
    root: &Schema,
    table: &BTreeMap<String, Schema>,
    converter: &mut Converter<'_>,
) -> Result<PropertySchema> {
    let mut parameters = PropertySchema::object();
    let mut top_level = Vec::new();

    converter.enter(&root.name)?;
    for field in &root.fields {
        match field.placement {
            Placement::Parameters => {
                let node = converter.field(field)?;
                parameters.insert_property(&field.name, node, field.required);
            }
            Placement::TopLevelSpec => top_level.push((field, converter.field(field)?)),
            Placement::Status => {}
        }
    }
    converter.leave();
    parameters.push_groups(&root.one_of, &root.any_of);

    let mut spec = PropertySchema::object();
    let parameters_required = !parameters.required.is_empty();
    spec.insert_property(PARAMETERS, parameters, parameters_required);
    for (field, node) in top_level {
        spec.insert_property(&field.name, node, field.required);
    }

    for schema in table.values().filter(|s| s.name != root.name) {
        if let Some(mount) = &schema.spec_mount_path {
            tracing::debug!(schema = %schema.name, mount = %mount, "mounting schema under spec");
            let node = converter.schema_object(schema)?;
            spec.insert_property(mount, node, false);
        }
    }
    Ok(spec)
}

fn status_node(
    root: &Schema,
    table: &BTreeMap<String, Schema>,
    converter: &mut Converter<'_>,
    preserve_unknown_fields: bool,
) -> Result<Option<PropertySchema>> {
    let mut status = PropertySchema::object();

    for schema in table
        .values()
        .filter(|s| s.is_status_schema && s.name != root.name)
    {
        converter.enter(&schema.name)?;
        for field in &schema.fields {
            let node = converter.field(field)?;
            status.insert_property(&field.name, node, field.required);
        }
        converter.leave();
    }

    converter.enter(&root.name)?;
    for field in root.fields.iter().filter(|f| f.placement == Placement::Status) {
        let node = converter.field(field)?;
        status.insert_property(&field.name, node, field.required);
    }
    converter.leave();

    if !status.properties.is_empty() {
        return Ok(Some(status));
    }
    if !preserve_unknown_fields {
        return Ok(None);
    }
    status.preserve_unknown_fields = Some(true);
    Ok(Some(status))
}

fn document(settings: Settings, schema: PropertySchema) -> CompositeResourceDefinition {
    let Settings {
        group,
        version,
        names,
        served,
        referenceable,
        categories,
        printer_columns,
        ..
    } = settings;

    CompositeResourceDefinition {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        metadata: ObjectMeta {
            name: names.definition_name(&group),
        },
        spec: DefinitionSpec {
            group,
            names: Names {
                kind: names.kind,
                plural: names.plural,
                categories,
            },
            claim_names: names.claim.map(Names::from),
            versions: vec![DefinitionVersion {
                name: version,
                served,
                referenceable,
                additional_printer_columns: printer_columns,
                schema: VersionSchema {
                    open_api_v3_schema: schema,
                },
            }],
        },
    }
}
