//! # kxrd-parser: KCL Schema Scanner
//!
//! Extracts [`Schema`] definitions and file-level `__xrd_*` metadata from KCL
//! source text in one line-oriented pass.
//!
//! ## Modules
//!
//! - [`annotation`]: `@directive(args)` comment recognition and typed
//!   argument extraction.
//! - [`expression`]: resolution of `__xrd_*` right-hand sides against
//!   literal variables in the same file.
//! - [`directives`]: application of buffered annotations to schemas and
//!   fields.
//! - [`scanner`]: the state machine itself.
//! - [`evaluator`]: the seam for an external KCL evaluator.
//!
//! ## Failure Policy
//!
//! Only an input with no `schema` block fails. Everything else degrades:
//! a malformed annotation leaves its attribute unset, an unresolvable
//! metadata expression leaves that metadata unset, and an evaluator failure
//! leaves the scanned metadata in place. Each degradation is logged at
//! debug level through `tracing`.

pub mod annotation;
pub mod directives;
pub mod evaluator;
pub mod expression;
pub mod scanner;

use std::path::Path;

use kxrd_core::{ParseResult, Result, Schema};

pub use annotation::Annotation;
pub use evaluator::{EvaluatorError, MetadataEvaluator, StaticEvaluator};
pub use scanner::Scanner;

/// Parse KCL source text.
pub fn parse_source(source: &str) -> Result<ParseResult> {
    scanner::scan(source)
}

/// Read and parse a KCL file.
pub fn parse_file(path: &Path) -> Result<ParseResult> {
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "parsing KCL file");
    parse_source(&source)
}

/// Read a KCL file and return only its primary schema.
pub fn parse_file_primary(path: &Path) -> Result<Schema> {
    parse_file(path).map(|result| result.primary)
}

/// Parse a KCL file, then overlay metadata from an external evaluator.
///
/// Evaluator failure is logged and otherwise ignored; the scanned metadata
/// stands.
pub fn parse_file_with_evaluator(
    path: &Path,
    evaluator: &dyn MetadataEvaluator,
) -> Result<ParseResult> {
    let mut result = parse_file(path)?;
    match evaluator.evaluate(path) {
        Ok(evaluated) => {
            tracing::debug!(path = %path.display(), "applying evaluated metadata");
            result.metadata.overlay(evaluated);
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "metadata evaluation failed; using scanned values");
        }
    }
    Ok(result)
}
