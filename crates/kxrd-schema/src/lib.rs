//! # kxrd-schema: Definition Mapping and Rendering
//!
//! Turns a parsed schema table into a Crossplane
//! `CompositeResourceDefinition` and renders it.
//!
//! ## Pipeline
//!
//! - [`select_schema`] picks the conversion root.
//! - [`ConversionOptions::resolve`] merges caller options with file
//!   metadata into final names, group and version.
//! - [`Converter`] maps every field to a [`PropertySchema`], expanding
//!   referenced schemas inline and rejecting reference cycles.
//! - [`generate`] assembles the document; [`CompositeResourceDefinition::to_yaml`]
//!   renders it.
//! - [`InstanceValidator`] checks example manifests against the result.
//!
//! ## Crate Policy
//!
//! - Depends only on `kxrd-core` internally.
//! - Output is deterministic: property and `required` order follow field
//!   declaration order; schema-table iteration is sorted by name.
//! - The only errors are missing group, unknown explicit schema, ambiguous
//!   root marker and cyclic references. Everything else degrades with a
//!   debug-level log.

pub mod convert;
pub mod document;
pub mod generate;
pub mod naming;
pub mod options;
pub mod property;
pub mod validate;

pub use convert::Converter;
pub use document::CompositeResourceDefinition;
pub use generate::{convert, generate, select_schema};
pub use naming::ResourceNames;
pub use options::{ConversionOptions, Settings};
pub use property::{NodeType, PropertySchema};
pub use validate::{InstanceValidationError, InstanceValidator};
