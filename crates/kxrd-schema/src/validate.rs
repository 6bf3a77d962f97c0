//! # Instance Validation
//!
//! Checks a resource manifest against the `openAPIV3Schema` of a generated
//! definition, using the `jsonschema` crate. The emitted keywords are the
//! JSON Schema subset OpenAPI v3 shares with draft 2020-12; the
//! `x-kubernetes-*` extensions are unknown keywords there and are ignored.
//!
//! This is a quick structural check of example manifests. It does not
//! evaluate CEL rules or apply Kubernetes pruning.

use std::fmt;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::document::CompositeResourceDefinition;

/// Errors from instance validation.
#[derive(Error, Debug)]
pub enum InstanceValidationError {
    /// The manifest does not conform to the schema.
    #[error("manifest does not conform to the generated schema:\n{violations}")]
    ValidationFailed {
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The manifest file could not be loaded or parsed.
    #[error("manifest load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the manifest that failed to load.
        path: String,
        /// Reason the manifest could not be loaded.
        reason: String,
    },

    /// The generated schema could not be compiled.
    #[error("validator build error: {0}")]
    ValidatorBuildError(String),
}

/// A single violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the manifest.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled validator for one definition's schema.
pub struct InstanceValidator {
    validator: Validator,
}

impl fmt::Debug for InstanceValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceValidator").finish_non_exhaustive()
    }
}

impl InstanceValidator {
    /// Compile the `openAPIV3Schema` of `definition`.
    pub fn new(definition: &CompositeResourceDefinition) -> Result<Self, InstanceValidationError> {
        let schema = definition.open_api_schema().ok_or_else(|| {
            InstanceValidationError::ValidatorBuildError("definition has no versions".to_string())
        })?;
        let schema = serde_json::to_value(schema)
            .map_err(|e| InstanceValidationError::ValidatorBuildError(e.to_string()))?;
        Self::from_value(&schema)
    }

    /// Compile an already-serialized schema.
    pub fn from_value(schema: &Value) -> Result<Self, InstanceValidationError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts
            .build(schema)
            .map_err(|e| InstanceValidationError::ValidatorBuildError(e.to_string()))?;
        Ok(Self { validator })
    }

    /// True when `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate a parsed manifest.
    pub fn validate(&self, instance: &Value) -> Result<(), InstanceValidationError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InstanceValidationError::ValidationFailed {
                violations: ValidationViolations { violations },
            })
        }
    }

    /// Load a YAML or JSON manifest and validate it.
    ///
    /// `.json` files are read as JSON; anything else as YAML.
    pub fn validate_file(&self, path: &Path) -> Result<(), InstanceValidationError> {
        let load_error = |reason: String| InstanceValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(format!("cannot read file: {e}")))?;

        let instance: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| load_error(format!("invalid JSON: {e}")))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?,
        };
        self.validate(&instance)
    }
}
