//! # KCL Command Evaluator
//!
//! Runs the real KCL toolchain to evaluate `__xrd_*` metadata that the
//! scanner's own resolver cannot, such as values built from imported
//! modules:
//!
//! ```bash
//! kcl run <file> --format json --show_hidden
//! ```
//!
//! When the file fails to evaluate (commonly because an import cannot be
//! resolved outside its package), one retry is made on a temporary copy
//! with every `import` line removed. Either way a failure is returned as an
//! [`EvaluatorError`], which the parser logs and ignores.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use kxrd_core::{Metadata, PrinterColumn};
use kxrd_parser::{EvaluatorError, MetadataEvaluator};

/// Default program name looked up on `PATH`.
pub const DEFAULT_KCL_PROGRAM: &str = "kcl";

/// Evaluates metadata by invoking the `kcl` binary.
#[derive(Debug, Clone)]
pub struct KclCommandEvaluator {
    program: PathBuf,
}

impl Default for KclCommandEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_KCL_PROGRAM)
    }
}

impl KclCommandEvaluator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, path: &Path) -> Result<String, EvaluatorError> {
        let output = Command::new(&self.program)
            .arg("run")
            .arg(path)
            .args(["--format", "json", "--show_hidden"])
            .output()
            .map_err(|e| {
                EvaluatorError::Unavailable(format!("{}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvaluatorError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| EvaluatorError::Failed(format!("output is not UTF-8: {e}")))
    }

    /// Evaluate a copy of `path` with its `import` lines removed.
    fn run_without_imports(&self, path: &Path) -> Result<String, EvaluatorError> {
        let source = std::fs::read_to_string(path)?;
        let copy = tempfile::Builder::new()
            .prefix("kcl2xrd-")
            .suffix(".k")
            .tempfile()?;
        std::fs::write(copy.path(), strip_imports(&source))?;
        self.run(copy.path())
    }
}

impl MetadataEvaluator for KclCommandEvaluator {
    fn evaluate(&self, path: &Path) -> Result<Metadata, EvaluatorError> {
        let stdout = match self.run(path) {
            Ok(stdout) => stdout,
            Err(EvaluatorError::Failed(reason)) => {
                tracing::debug!(%reason, "kcl run failed; retrying without imports");
                self.run_without_imports(path)?
            }
            Err(other) => return Err(other),
        };
        metadata_from_json(&stdout)
    }
}

/// Remove top-level `import` statements.
pub fn strip_imports(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with("import "))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Hidden `__xrd_*` variables as printed by `kcl run --show_hidden`.
#[derive(Debug, Default, Deserialize)]
struct HiddenVariables {
    #[serde(rename = "__xrd_kind")]
    kind: Option<String>,
    #[serde(rename = "__xrd_group")]
    group: Option<String>,
    #[serde(rename = "__xrd_version")]
    version: Option<String>,
    #[serde(rename = "__xrd_categories", default)]
    categories: Vec<String>,
    #[serde(rename = "__xrd_served")]
    served: Option<bool>,
    #[serde(rename = "__xrd_referenceable")]
    referenceable: Option<bool>,
    #[serde(rename = "__xrd_printer_columns", default)]
    printer_columns: Vec<ColumnSpec>,
    #[serde(rename = "__xrd_status_preserve_unknown_fields")]
    status_preserve_unknown_fields: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnSpec {
    Compact(String),
    Full(PrinterColumn),
}

/// Read metadata from `kcl run` JSON output.
pub fn metadata_from_json(stdout: &str) -> Result<Metadata, EvaluatorError> {
    let hidden: HiddenVariables = serde_json::from_str(stdout)
        .map_err(|e| EvaluatorError::Failed(format!("unexpected kcl output: {e}")))?;

    let printer_columns = hidden
        .printer_columns
        .into_iter()
        .filter_map(|spec| match spec {
            ColumnSpec::Compact(s) => PrinterColumn::parse_compact(&s),
            ColumnSpec::Full(column) => Some(column),
        })
        .collect();

    Ok(Metadata {
        kind: hidden.kind,
        group: hidden.group,
        version: hidden.version,
        categories: hidden.categories,
        served: hidden.served,
        referenceable: hidden.referenceable,
        printer_columns,
        status_preserve_unknown_fields: hidden.status_preserve_unknown_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hidden_variables() {
        let stdout = r#"{
            "__xrd_kind": "XBucket",
            "__xrd_group": "storage.example.org",
            "__xrd_categories": ["crossplane"],
            "__xrd_served": true,
            "__xrd_printer_columns": [
                "Region:string:.spec.parameters.region",
                {"name": "Ready", "type": "string", "jsonPath": ".status.ready"}
            ],
            "composition": {"name": "ignored"}
        }"#;
        let meta = metadata_from_json(stdout).unwrap();
        assert_eq!(meta.kind.as_deref(), Some("XBucket"));
        assert_eq!(meta.group.as_deref(), Some("storage.example.org"));
        assert_eq!(meta.served, Some(true));
        assert_eq!(meta.referenceable, None);
        assert_eq!(meta.printer_columns.len(), 2);
        assert_eq!(meta.printer_columns[1].name, "Ready");
    }

    #[test]
    fn non_json_output_is_a_failure() {
        let err = metadata_from_json("not json").unwrap_err();
        assert!(matches!(err, EvaluatorError::Failed(_)));
    }

    #[test]
    fn strip_imports_removes_only_import_lines() {
        let source = "import k8s.api\nimport regex\n_x = \"a\"\nschema A:\n    important: str\n";
        assert_eq!(
            strip_imports(source),
            "_x = \"a\"\nschema A:\n    important: str\n"
        );
    }

    #[test]
    fn missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.k");
        std::fs::write(&file, "schema A:\n    x: str\n").unwrap();

        let evaluator = KclCommandEvaluator::new(dir.path().join("no-such-kcl"));
        let err = evaluator.evaluate(&file).unwrap_err();
        assert!(matches!(err, EvaluatorError::Unavailable(_)));
    }
}
