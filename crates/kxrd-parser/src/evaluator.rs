//! # Metadata Evaluator Seam
//!
//! The scanner resolves only literal metadata and simple `.format()`
//! templates. An external evaluator can do better: run the real KCL
//! toolchain over the file and read back the evaluated `__xrd_*` values.
//! This trait is the seam for that. The parser crate never spawns
//! processes itself; the CLI supplies a concrete implementation.

use std::path::Path;

use kxrd_core::Metadata;
use thiserror::Error;

/// Failure of an external metadata evaluator. Never fatal to a conversion.
#[derive(Error, Debug)]
pub enum EvaluatorError {
    /// The evaluator program could not be started.
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),

    /// The evaluator ran but did not produce usable output.
    #[error("evaluation failed: {0}")]
    Failed(String),

    /// IO error while preparing the evaluation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Evaluates a KCL file and returns whatever metadata it could determine.
///
/// Unset fields in the returned [`Metadata`] leave the scanned values in
/// place; set fields replace them.
pub trait MetadataEvaluator {
    fn evaluate(&self, path: &Path) -> Result<Metadata, EvaluatorError>;
}

/// An evaluator backed by a fixed value. Useful in tests and for callers
/// that compute metadata elsewhere.
#[derive(Debug, Clone, Default)]
pub struct StaticEvaluator(pub Metadata);

impl MetadataEvaluator for StaticEvaluator {
    fn evaluate(&self, _path: &Path) -> Result<Metadata, EvaluatorError> {
        Ok(self.0.clone())
    }
}
