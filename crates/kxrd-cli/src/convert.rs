//! # Convert Command
//!
//! Reads one KCL file and renders the CompositeResourceDefinition for its
//! root schema.
//!
//! ## Usage
//!
//! ```bash
//! # Print to stdout, taking the group from __xrd_group:
//! kcl2xrd -i bucket.k
//!
//! # Write a file with claim names and check an example claim:
//! kcl2xrd -i bucket.k -o xrd.yaml --with-claims --check examples/claim.yaml
//! ```
//!
//! Options are layered: `--config` file, then explicit flags. Both beat
//! `__xrd_*` metadata in the source file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kxrd_core::PrinterColumn;
use kxrd_parser::{parse_file, parse_file_with_evaluator};
use kxrd_schema::validate::InstanceValidationError;
use kxrd_schema::{generate, ConversionOptions, InstanceValidator};

use crate::config::load_config;
use crate::evaluator::{KclCommandEvaluator, DEFAULT_KCL_PROGRAM};

/// Arguments for a conversion run.
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// KCL source file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// YAML file with conversion options. Flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// API group of the definition.
    #[arg(short, long)]
    pub group: Option<String>,

    /// API version of the definition (default v1alpha1).
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Schema to convert instead of the automatically selected root.
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Kind of the composite resource.
    #[arg(long)]
    pub kind: Option<String>,

    /// Emit claimNames.
    #[arg(long)]
    pub with_claims: bool,

    /// Claim kind. Defaults to the kind without its `X` prefix.
    #[arg(long)]
    pub claim_kind: Option<String>,

    /// Claim plural. Defaults to the lowercased claim kind plus `s`.
    #[arg(long)]
    pub claim_plural: Option<String>,

    #[arg(long)]
    pub served: Option<bool>,

    #[arg(long)]
    pub referenceable: Option<bool>,

    /// Comma-separated categories.
    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Printer column as `name:type:jsonPath[:description]`. Repeatable.
    #[arg(long = "printer-columns")]
    pub printer_columns: Vec<String>,

    /// Emit an open status object even when no status fields exist.
    #[arg(long)]
    pub status_preserve_unknown_fields: bool,

    /// Evaluate metadata with the KCL toolchain before conversion.
    #[arg(long)]
    pub kcl_eval: bool,

    /// KCL executable used by `--kcl-eval`.
    #[arg(long, default_value = DEFAULT_KCL_PROGRAM)]
    pub kcl_bin: PathBuf,

    /// Manifest (YAML or JSON) to validate against the generated schema.
    /// Repeatable.
    #[arg(long)]
    pub check: Vec<PathBuf>,
}

impl ConvertArgs {
    /// Conversion options carried by explicit flags.
    pub fn to_options(&self) -> Result<ConversionOptions> {
        let printer_columns = self
            .printer_columns
            .iter()
            .map(|spec| {
                PrinterColumn::parse_compact(spec).with_context(|| {
                    format!("invalid printer column '{spec}': expected name:type:jsonPath[:description]")
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConversionOptions {
            group: self.group.clone(),
            version: self.api_version.clone(),
            kind: self.kind.clone(),
            schema: self.schema.clone(),
            with_claims: self.with_claims,
            claim_kind: self.claim_kind.clone(),
            claim_plural: self.claim_plural.clone(),
            served: self.served,
            referenceable: self.referenceable,
            categories: self
                .categories
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            printer_columns,
            status_preserve_unknown_fields: self.status_preserve_unknown_fields.then_some(true),
        })
    }

    /// Config file values with flags layered on top.
    pub fn resolve_options(&self) -> Result<ConversionOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => ConversionOptions::default(),
        };
        options.overlay(self.to_options()?);
        Ok(options)
    }
}

/// Execute a conversion run.
///
/// Returns exit code 0 on success and 1 when a `--check` manifest does not
/// conform. Every other failure is an `Err`.
pub fn run_convert(args: &ConvertArgs) -> Result<u8> {
    let options = args.resolve_options()?;

    let parsed = if args.kcl_eval {
        let evaluator = KclCommandEvaluator::new(&args.kcl_bin);
        parse_file_with_evaluator(&args.input, &evaluator)
    } else {
        parse_file(&args.input)
    };
    let result = parsed.with_context(|| format!("failed to parse {}", args.input.display()))?;

    let document = generate(&result, &options)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;
    let yaml = document.to_yaml()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("XRD written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(yaml.as_bytes())
                .context("failed to write to stdout")?;
        }
    }

    if args.check.is_empty() {
        return Ok(0);
    }

    let validator = InstanceValidator::new(&document)?;
    let mut failed = 0usize;
    for manifest in &args.check {
        match validator.validate_file(manifest) {
            Ok(()) => tracing::info!(manifest = %manifest.display(), "manifest conforms"),
            Err(InstanceValidationError::ValidationFailed { violations }) => {
                failed += 1;
                eprintln!(
                    "{}: {} violation(s)\n{violations}",
                    manifest.display(),
                    violations.len()
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    if failed > 0 {
        tracing::error!(failed, total = args.check.len(), "manifests do not conform");
        Ok(1)
    } else {
        Ok(0)
    }
}
