//! # kxrd-core: Foundational Types for kcl2xrd
//!
//! This crate defines the data model shared by the scanner (`kxrd-parser`)
//! and the definition mapper (`kxrd-schema`). It depends on nothing
//! internal; every other crate in the workspace depends on it.
//!
//! ## Key Types
//!
//! - [`Schema`] and [`Field`]: one `schema <Name>:` block and its members,
//!   with every validation and placement attribute carried by annotations.
//! - [`TypeExpr`]: the lexical classification of a field's declared type
//!   (primitive, list, dict, `any`, or a reference to another schema).
//! - [`Metadata`]: file-level `__xrd_*` settings.
//! - [`ParseResult`]: the scanner's output: schema table, primary schema,
//!   and metadata.
//! - [`XrdError`]: the fatal error taxonomy for a conversion.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kxrd-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Schemas and fields are immutable once the scanner finalizes them.

pub mod error;
pub mod metadata;
pub mod model;
pub mod types;

pub use error::{Result, XrdError};
pub use metadata::{Metadata, PrinterColumn};
pub use model::{Field, ParseResult, Placement, Schema, Validation, ValidationRule};
pub use types::{Scalar, TypeExpr};
