//! # File-Level Metadata
//!
//! Settings scanned from `__xrd_*` assignments at file level. Every field
//! is optional: a missing or unresolvable value stays unset and the caller
//! may supply it through conversion options instead.

use serde::{Deserialize, Serialize};

/// XRD settings declared by the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// `__xrd_kind`: overrides the root schema name as the XRD kind.
    pub kind: Option<String>,
    /// `__xrd_group`: the API group.
    pub group: Option<String>,
    /// `__xrd_version`: the API version.
    pub version: Option<String>,
    /// `__xrd_categories`.
    pub categories: Vec<String>,
    /// `__xrd_served`.
    pub served: Option<bool>,
    /// `__xrd_referenceable`.
    pub referenceable: Option<bool>,
    /// `__xrd_printer_columns`.
    pub printer_columns: Vec<PrinterColumn>,
    /// `__xrd_status_preserve_unknown_fields`.
    pub status_preserve_unknown_fields: Option<bool>,
}

impl Metadata {
    /// Overlay every value set in `other` onto `self`.
    ///
    /// Used to give an external evaluator's results precedence over the
    /// scanner's own, while keeping scanned values the evaluator missed.
    pub fn overlay(&mut self, other: Metadata) {
        if other.kind.is_some() {
            self.kind = other.kind;
        }
        if other.group.is_some() {
            self.group = other.group;
        }
        if other.version.is_some() {
            self.version = other.version;
        }
        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
        if other.served.is_some() {
            self.served = other.served;
        }
        if other.referenceable.is_some() {
            self.referenceable = other.referenceable;
        }
        if !other.printer_columns.is_empty() {
            self.printer_columns = other.printer_columns;
        }
        if other.status_preserve_unknown_fields.is_some() {
            self.status_preserve_unknown_fields = other.status_preserve_unknown_fields;
        }
    }
}

/// An additional printer column shown by `kubectl get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub json_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PrinterColumn {
    /// Parse the compact `name:type:jsonPath[:description]` form.
    ///
    /// Returns `None` when fewer than three parts are present. Extra `:`
    /// separators after the fourth part are kept in the description.
    pub fn parse_compact(spec: &str) -> Option<Self> {
        let mut parts = spec.splitn(4, ':');
        let name = parts.next()?.trim();
        let column_type = parts.next()?.trim();
        let json_path = parts.next()?.trim();
        let description = parts
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Some(Self {
            name: name.to_string(),
            column_type: column_type.to_string(),
            json_path: json_path.to_string(),
            description,
        })
    }
}
