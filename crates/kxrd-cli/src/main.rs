//! # kcl2xrd entry point
//!
//! Parses command-line arguments, installs logging and runs the conversion.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kxrd_cli::convert::{run_convert, ConvertArgs};

/// Convert KCL schemas into a Crossplane CompositeResourceDefinition.
///
/// The root schema's fields become `spec.parameters`; fields marked
/// `@status` become `status`. Group, kind and version come from flags, a
/// config file, or `__xrd_*` variables in the source.
#[derive(Parser, Debug)]
#[command(name = "kcl2xrd", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: ConvertArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(input = %cli.args.input.display(), "kcl2xrd starting");

    match run_convert(&cli.args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_minimal() {
        let cli = Cli::try_parse_from(["kcl2xrd", "-i", "bucket.k"]).unwrap();
        assert_eq!(cli.args.input, PathBuf::from("bucket.k"));
        assert_eq!(cli.verbose, 0);
        assert!(cli.args.output.is_none());
        assert!(!cli.args.with_claims);
        assert!(!cli.args.kcl_eval);
        assert_eq!(cli.args.kcl_bin, PathBuf::from("kcl"));
    }

    #[test]
    fn cli_requires_input() {
        assert!(Cli::try_parse_from(["kcl2xrd"]).is_err());
    }

    #[test]
    fn cli_parse_all_options() {
        let cli = Cli::try_parse_from([
            "kcl2xrd",
            "-vv",
            "--input",
            "bucket.k",
            "-o",
            "xrd.yaml",
            "-g",
            "storage.example.org",
            "--api-version",
            "v1beta1",
            "-s",
            "XBucket",
            "--kind",
            "XObjectBucket",
            "--with-claims",
            "--claim-kind",
            "ObjectBucket",
            "--claim-plural",
            "objectbuckets",
            "--served",
            "false",
            "--referenceable",
            "true",
            "--categories",
            "crossplane,storage",
            "--printer-columns",
            "Region:string:.spec.parameters.region",
            "--printer-columns",
            "Ready:string:.status.ready",
            "--status-preserve-unknown-fields",
            "--kcl-eval",
            "--kcl-bin",
            "/opt/kcl/bin/kcl",
            "--check",
            "claim.yaml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let args = cli.args;
        assert_eq!(args.output, Some(PathBuf::from("xrd.yaml")));
        assert_eq!(args.group.as_deref(), Some("storage.example.org"));
        assert_eq!(args.api_version.as_deref(), Some("v1beta1"));
        assert_eq!(args.schema.as_deref(), Some("XBucket"));
        assert_eq!(args.kind.as_deref(), Some("XObjectBucket"));
        assert!(args.with_claims);
        assert_eq!(args.claim_kind.as_deref(), Some("ObjectBucket"));
        assert_eq!(args.claim_plural.as_deref(), Some("objectbuckets"));
        assert_eq!(args.served, Some(false));
        assert_eq!(args.referenceable, Some(true));
        assert_eq!(args.categories, vec!["crossplane", "storage"]);
        assert_eq!(args.printer_columns.len(), 2);
        assert!(args.status_preserve_unknown_fields);
        assert!(args.kcl_eval);
        assert_eq!(args.kcl_bin, PathBuf::from("/opt/kcl/bin/kcl"));
        assert_eq!(args.check, vec![PathBuf::from("claim.yaml")]);
    }

    #[test]
    fn cli_rejects_non_boolean_served() {
        assert!(Cli::try_parse_from(["kcl2xrd", "-i", "a.k", "--served", "maybe"]).is_err());
    }
}
