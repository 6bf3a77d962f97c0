//! # Error Types: Structured Error Hierarchy
//!
//! Defines the fatal errors of a conversion. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Only conditions that leave nothing to convert are errors. Malformed
//!   annotations, unresolved expressions and uncoercible defaults degrade
//!   silently in the scanner and mapper and never surface here.
//! - Selection errors carry enough context (available names, the two
//!   conflicting schemas) to be reported verbatim to a user.

use thiserror::Error;

/// Top-level error type for kcl2xrd.
#[derive(Error, Debug)]
pub enum XrdError {
    /// The input contained no `schema` block.
    #[error("no schema found in input")]
    NoSchema,

    /// An explicitly requested schema is absent from the schema table.
    #[error("schema '{name}' not found; available schemas: {}", available.join(", "))]
    SchemaNotFound {
        /// The requested schema name.
        name: String,
        /// Every schema name in the table, sorted.
        available: Vec<String>,
    },

    /// More than one schema carries the `@xrd` root marker.
    #[error(
        "multiple schemas marked with @xrd: '{first}' and '{second}'; only one schema may be marked"
    )]
    AmbiguousRoot {
        /// First marked schema encountered.
        first: String,
        /// Second marked schema encountered.
        second: String,
    },

    /// No API group in either the options or the file metadata.
    #[error("API group must be specified via options or the '__xrd_group' variable")]
    MissingGroup,

    /// Inline expansion revisited a schema already on the expansion path.
    #[error("cyclic schema reference: {}", path.join(" -> "))]
    CyclicReference {
        /// Schema names from the conversion root to the repeated name.
        path: Vec<String>,
    },

    /// Rendering the document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, XrdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_not_found_lists_available_names() {
        let err = XrdError::SchemaNotFound {
            name: "Missing".to_string(),
            available: vec!["Alpha".to_string(), "Beta".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "schema 'Missing' not found; available schemas: Alpha, Beta"
        );
    }

    #[test]
    fn cyclic_reference_renders_path() {
        let err = XrdError::CyclicReference {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic schema reference: A -> B -> A");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: XrdError = io.into();
        assert!(matches!(err, XrdError::Io(_)));
    }
}
