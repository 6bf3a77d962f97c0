//! # Conversion Options
//!
//! [`ConversionOptions`] is the caller's side of every setting. It is read
//! from a YAML config file, from command-line flags, or built directly.
//! [`ConversionOptions::resolve`] merges it with file metadata into the
//! final [`Settings`]: an explicit option beats metadata, and metadata beats
//! the built-in default.

use serde::Deserialize;

use kxrd_core::{Metadata, PrinterColumn, Result, XrdError};

use crate::naming::{self, ResourceNames};

/// Version used when neither options nor metadata name one.
pub const DEFAULT_VERSION: &str = "v1alpha1";

/// Caller-supplied conversion settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionOptions {
    /// API group. Required here or in `__xrd_group`.
    pub group: Option<String>,
    /// API version.
    pub version: Option<String>,
    /// Kind override; defaults to the root schema name.
    pub kind: Option<String>,
    /// Name of the schema to convert.
    pub schema: Option<String>,
    /// Emit `claimNames`.
    pub with_claims: bool,
    /// Claim kind override; only used with `with_claims`.
    pub claim_kind: Option<String>,
    /// Claim plural override; only used with `with_claims`.
    pub claim_plural: Option<String>,
    pub served: Option<bool>,
    pub referenceable: Option<bool>,
    pub categories: Vec<String>,
    pub printer_columns: Vec<PrinterColumn>,
    /// Emit an open `status` node even when no observed fields exist.
    pub status_preserve_unknown_fields: Option<bool>,
}

impl ConversionOptions {
    /// Overlay every value set in `other` onto `self`.
    ///
    /// Used to layer command-line flags over a config file.
    pub fn overlay(&mut self, other: ConversionOptions) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.group, other.group);
        take(&mut self.version, other.version);
        take(&mut self.kind, other.kind);
        take(&mut self.schema, other.schema);
        self.with_claims |= other.with_claims;
        take(&mut self.claim_kind, other.claim_kind);
        take(&mut self.claim_plural, other.claim_plural);
        take(&mut self.served, other.served);
        take(&mut self.referenceable, other.referenceable);
        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
        if !other.printer_columns.is_empty() {
            self.printer_columns = other.printer_columns;
        }
        take(
            &mut self.status_preserve_unknown_fields,
            other.status_preserve_unknown_fields,
        );
    }

    /// Merge with file metadata.
    ///
    /// # Errors
    ///
    /// Returns [`XrdError::MissingGroup`] when neither source names a group.
    pub fn resolve(&self, metadata: &Metadata, root_name: &str) -> Result<Settings> {
        let group = self
            .group
            .clone()
            .or_else(|| metadata.group.clone())
            .filter(|g| !g.is_empty())
            .ok_or(XrdError::MissingGroup)?;

        let kind = self
            .kind
            .clone()
            .or_else(|| metadata.kind.clone())
            .unwrap_or_else(|| root_name.to_string());

        let names = if self.with_claims {
            naming::with_claims(
                &kind,
                self.claim_kind.as_deref(),
                self.claim_plural.as_deref(),
            )
        } else {
            naming::without_claims(&kind)
        };

        Ok(Settings {
            group,
            version: self
                .version
                .clone()
                .or_else(|| metadata.version.clone())
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            names,
            served: self.served.or(metadata.served).unwrap_or(true),
            referenceable: self.referenceable.or(metadata.referenceable).unwrap_or(true),
            categories: first_nonempty(&self.categories, &metadata.categories),
            printer_columns: first_nonempty(&self.printer_columns, &metadata.printer_columns),
            status_preserve_unknown_fields: self
                .status_preserve_unknown_fields
                .or(metadata.status_preserve_unknown_fields)
                .unwrap_or(false),
        })
    }
}

fn first_nonempty<T: Clone>(preferred: &[T], fallback: &[T]) -> Vec<T> {
    if preferred.is_empty() {
        fallback.to_vec()
    } else {
        preferred.to_vec()
    }
}

/// Fully merged settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub group: String,
    pub version: String,
    pub names: ResourceNames,
    pub served: bool,
    pub referenceable: bool,
    pub categories: Vec<String>,
    pub printer_columns: Vec<PrinterColumn>,
    pub status_preserve_unknown_fields: bool,
}
