//! # CompositeResourceDefinition Document
//!
//! Serializable tree for one Crossplane `CompositeResourceDefinition`. The
//! field order of each struct is the key order of the rendered YAML.

use serde::Serialize;

use kxrd_core::{PrinterColumn, Result, XrdError};

use crate::naming::KindNames;
use crate::property::PropertySchema;

pub const API_VERSION: &str = "apiextensions.crossplane.io/v1";
pub const KIND: &str = "CompositeResourceDefinition";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinition {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DefinitionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSpec {
    pub group: String,
    pub names: Names,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_names: Option<Names>,
    pub versions: Vec<DefinitionVersion>,
}

/// `spec.names` / `spec.claimNames`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Names {
    pub kind: String,
    pub plural: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl From<KindNames> for Names {
    fn from(names: KindNames) -> Self {
        Self {
            kind: names.kind,
            plural: names.plural,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionVersion {
    pub name: String,
    pub served: bool,
    pub referenceable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_printer_columns: Vec<PrinterColumn>,
    pub schema: VersionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionSchema {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: PropertySchema,
}

impl CompositeResourceDefinition {
    /// The `openAPIV3Schema` of the first (only) version.
    pub fn open_api_schema(&self) -> Option<&PropertySchema> {
        self.spec.versions.first().map(|v| &v.schema.open_api_v3_schema)
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| XrdError::Serialization(e.to_string()))
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| XrdError::Serialization(e.to_string()))
    }
}
