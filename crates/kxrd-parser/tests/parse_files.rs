//! Integration tests: parse complete KCL files from disk.

use std::io::Write;
use std::path::Path;

use kxrd_core::{Metadata, Placement, XrdError};
use kxrd_parser::{
    parse_file, parse_file_primary, parse_file_with_evaluator, parse_source, EvaluatorError,
    MetadataEvaluator, StaticEvaluator,
};
use proptest::prelude::*;

const BUCKET: &str = r#"import regex

_sub = "storage"
_platform = "example.org"
__xrd_kind = "XBucket"
__xrd_group = "{}.{}".format(_sub, _platform)
__xrd_version = "v1beta1"
__xrd_categories = ["crossplane", "composite"]
__xrd_printer_columns = ["Region:string:.spec.parameters.region"]

schema Tag:
    key: str
    value?: str

# @xrd
schema XBucket:
    """
    A managed object storage bucket.
    """
    # @pattern("^[a-z0-9-]+$")
    # @maxLength(63)
    # Bucket name
    name: str
    # @enum(["us-east-1", "eu-west-1"])
    region: str = "us-east-1"
    versioning?: bool = False
    tags?: [Tag]
    # @topLevelSpec
    providerConfigRef?: str
    # @status
    arn?: str

composition = {
    name: "xbucket"
}
"#;

fn write_kcl(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".k")
        .tempfile()
        .expect("create temp file");
    file.write_all(source.as_bytes()).expect("write temp file");
    file
}

#[test]
fn parse_complete_file() {
    let file = write_kcl(BUCKET);
    let result = parse_file(file.path()).unwrap();

    assert_eq!(result.schema_names(), vec!["Tag".to_string(), "XBucket".to_string()]);
    assert_eq!(result.primary.name, "XBucket");

    let m = &result.metadata;
    assert_eq!(m.kind.as_deref(), Some("XBucket"));
    assert_eq!(m.group.as_deref(), Some("storage.example.org"));
    assert_eq!(m.version.as_deref(), Some("v1beta1"));
    assert_eq!(m.categories.len(), 2);
    assert_eq!(m.printer_columns[0].name, "Region");

    let bucket = &result.primary;
    assert!(bucket.is_marked_root);
    assert_eq!(bucket.description.as_deref(), Some("A managed object storage bucket."));
    let names: Vec<_> = bucket.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["name", "region", "versioning", "tags", "providerConfigRef", "arn"]
    );

    let name = bucket.field("name").unwrap();
    assert_eq!(name.description.as_deref(), Some("Bucket name"));
    assert_eq!(name.validation.max_length, Some(63));
    assert_eq!(bucket.field("region").unwrap().raw_default.as_deref(), Some("\"us-east-1\""));
    assert_eq!(
        bucket.field("providerConfigRef").unwrap().placement,
        Placement::TopLevelSpec
    );
    assert_eq!(bucket.field("arn").unwrap().placement, Placement::Status);
}

#[test]
fn trailing_composition_is_not_parsed_as_fields() {
    let file = write_kcl(BUCKET);
    let bucket = parse_file_primary(file.path()).unwrap();
    assert!(bucket.field("name").is_some());
    assert_eq!(bucket.fields.len(), 6);
}

#[test]
fn missing_file_is_io_error() {
    let err = parse_file(Path::new("/nonexistent/definitely/missing.k")).unwrap_err();
    assert!(matches!(err, XrdError::Io(_)));
}

#[test]
fn file_without_schema_fails() {
    let file = write_kcl("_x = \"y\"\n");
    assert!(matches!(parse_file(file.path()), Err(XrdError::NoSchema)));
}

#[test]
fn evaluator_values_take_precedence() {
    let file = write_kcl(BUCKET);
    let evaluator = StaticEvaluator(Metadata {
        group: Some("evaluated.example.org".to_string()),
        ..Default::default()
    });
    let result = parse_file_with_evaluator(file.path(), &evaluator).unwrap();
    assert_eq!(result.metadata.group.as_deref(), Some("evaluated.example.org"));
    assert_eq!(result.metadata.version.as_deref(), Some("v1beta1"));
}

struct FailingEvaluator;

impl MetadataEvaluator for FailingEvaluator {
    fn evaluate(&self, _path: &Path) -> Result<Metadata, EvaluatorError> {
        Err(EvaluatorError::Unavailable("kcl not installed".to_string()))
    }
}

#[test]
fn evaluator_failure_is_not_fatal() {
    let file = write_kcl(BUCKET);
    let result = parse_file_with_evaluator(file.path(), &FailingEvaluator).unwrap();
    assert_eq!(result.metadata.group.as_deref(), Some("storage.example.org"));
}

fn schema_source(names: &[String], fields_per_schema: usize) -> String {
    let mut source = String::new();
    for name in names {
        source.push_str(&format!("schema {name}:\n"));
        for i in 0..fields_per_schema {
            source.push_str(&format!("    f{i}: str\n"));
        }
        source.push('\n');
    }
    source
}

proptest! {
    #[test]
    fn every_distinct_header_yields_one_entry(
        names in prop::collection::btree_set("S[a-z]{1,8}", 1..8),
        fields in 1usize..6,
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let result = parse_source(&schema_source(&names, fields)).unwrap();
        prop_assert_eq!(result.schemas.len(), names.len());
        for name in &names {
            let schema = result.schema(name).unwrap();
            let got: Vec<String> = schema.fields.iter().map(|f| f.name.clone()).collect();
            let want: Vec<String> = (0..fields).map(|i| format!("f{i}")).collect();
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn single_schema_is_primary(name in "S[a-z]{1,8}") {
        let result = parse_source(&schema_source(&[name.clone()], 2)).unwrap();
        prop_assert_eq!(&result.primary.name, &name);
        prop_assert_eq!(result.schema(&name), Some(&result.primary));
    }
}
