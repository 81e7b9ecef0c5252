#![cfg(test)]

use std::fs;
use std::path::PathBuf;

use wit_dbi_compiler::{compile_wit, generate_outputs, record_schema, WitError};
use wit_dbi_schema::Validation;

const STATE_SOURCE: &str = "\
record dbi0-state-key {
  namespace: utf8,
  key: utf8,
}

record dbi0-state-value {
  body: bytes,
  revision: s64,
}
";

const REFINED_SOURCE: &str = "\
/// @refine(namespace != \"\")
record dbi0-app-state-key {
  namespace: utf8,
  key: utf8,
}

/// @refine(confidence >= 0.0)
record dbi0-app-state-value {
  body: bytes,
  revision: s64,
  updated-at: timestamp,
  confidence: score,
}
";

struct OutPaths {
    manifest: PathBuf,
    header: PathBuf,
    source: PathBuf,
}

fn out_paths(dir: &tempfile::TempDir) -> OutPaths {
    OutPaths {
        manifest: dir.path().join("dbi_manifest.csv"),
        header: dir.path().join("generated/wit_schema_dbis.h"),
        source: dir.path().join("generated/wit_schema_dbis.c"),
    }
}

#[test]
fn test_worked_example_resolves_and_writes_manifest_row() {
    let dir = tempfile::tempdir().unwrap();
    let out = out_paths(&dir);

    let summary =
        generate_outputs(STATE_SOURCE, &out.manifest, &out.header, &out.source).unwrap();
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.skipped, 0);

    let manifest = fs::read_to_string(&out.manifest).unwrap();
    assert_eq!(
        manifest,
        "dbi,name,key_format,value_format,owner,status\n\
         0,state,wit:dbi0-state-key,wit:dbi0-state-value,runtime,active\n"
    );

    let header = fs::read_to_string(&out.header).unwrap();
    assert!(header.contains("#define WIT_DBI_STATE 0u"));
    assert!(header.contains("} Wit_dbi0_state_key;"));
    assert!(header.contains("static inline int wit_validate_dbi0_state_value"));

    let source = fs::read_to_string(&out.source).unwrap();
    assert!(source.contains("{0u, \"state\", \"dbi0-state-key\", \"dbi0-state-value\"},"));
}

#[test]
fn test_regeneration_preserves_curator_fields_on_unchanged_names() {
    let dir = tempfile::tempdir().unwrap();
    let out = out_paths(&dir);

    generate_outputs(STATE_SOURCE, &out.manifest, &out.header, &out.source).unwrap();

    // A curator takes ownership and retires the entry.
    let edited = fs::read_to_string(&out.manifest)
        .unwrap()
        .replace("runtime,active", "platform,frozen");
    fs::write(&out.manifest, &edited).unwrap();

    generate_outputs(STATE_SOURCE, &out.manifest, &out.header, &out.source).unwrap();
    let manifest = fs::read_to_string(&out.manifest).unwrap();
    assert!(manifest.contains("0,state,wit:dbi0-state-key,wit:dbi0-state-value,platform,frozen"));
}

#[test]
fn test_pipeline_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let out = out_paths(&dir);

    generate_outputs(REFINED_SOURCE, &out.manifest, &out.header, &out.source).unwrap();
    let first = (
        fs::read_to_string(&out.manifest).unwrap(),
        fs::read_to_string(&out.header).unwrap(),
        fs::read_to_string(&out.source).unwrap(),
    );

    generate_outputs(REFINED_SOURCE, &out.manifest, &out.header, &out.source).unwrap();
    let second = (
        fs::read_to_string(&out.manifest).unwrap(),
        fs::read_to_string(&out.header).unwrap(),
        fs::read_to_string(&out.source).unwrap(),
    );

    assert_eq!(first, second);
}

#[test]
fn test_sequence_gap_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = out_paths(&dir);

    let gapped = "record dbi0-state-key {\n  id: u64,\n}\n\
                  record dbi0-state-value {\n  body: bytes,\n}\n\
                  record dbi2-foo-key {\n  id: u64,\n}\n\
                  record dbi2-foo-value {\n  body: bytes,\n}";
    let err = generate_outputs(gapped, &out.manifest, &out.header, &out.source).unwrap_err();
    match err {
        WitError::SequenceGap { prev, next } => {
            assert_eq!(prev, 0);
            assert_eq!(next, 2);
        }
        other => panic!("expected SequenceGap, got {:?}", other),
    }

    assert!(!out.manifest.exists());
    assert!(!out.header.exists());
    assert!(!out.source.exists());
}

#[test]
fn test_failed_run_leaves_prior_artifacts_intact() {
    let dir = tempfile::tempdir().unwrap();
    let out = out_paths(&dir);

    generate_outputs(STATE_SOURCE, &out.manifest, &out.header, &out.source).unwrap();
    let before = fs::read_to_string(&out.manifest).unwrap();

    let err = generate_outputs(
        "record dbi1-late-key {\n  id: u64,\n}\n\
         record dbi1-late-value {\n  body: bytes,\n}",
        &out.manifest,
        &out.header,
        &out.source,
    )
    .unwrap_err();
    assert!(matches!(err, WitError::MissingZero));
    assert_eq!(fs::read_to_string(&out.manifest).unwrap(), before);
}

#[test]
fn test_refined_value_schema_validates_buffers() {
    let compilation = compile_wit(REFINED_SOURCE).unwrap();
    let value = &compilation.entries[0].value;
    let schema = record_schema(value).unwrap();

    // body (offset,len) + revision + updated-at + confidence
    assert_eq!(schema.layout.size, 8 + 8 + 8 + 8);

    assert_eq!(schema.validate(&[]), Validation::Empty);
    assert_eq!(schema.validate(&[0u8; 16]), Validation::Corrupt);

    let mut buf = Vec::new();
    buf.extend_from_slice(&[0u8; 8]); // body offset/len
    buf.extend_from_slice(&7i64.to_le_bytes());
    buf.extend_from_slice(&1_700_000_000u64.to_le_bytes());
    buf.extend_from_slice(&0.75f64.to_le_bytes());
    assert_eq!(schema.validate(&buf), Validation::Valid);

    let negative_confidence_at = buf.len() - 8;
    buf[negative_confidence_at..].copy_from_slice(&(-0.75f64).to_le_bytes());
    assert_eq!(schema.validate(&buf), Validation::RefinementViolation);
}

#[test]
fn test_refined_key_schema_checks_namespace_emptiness() {
    let compilation = compile_wit(REFINED_SOURCE).unwrap();
    let key = &compilation.entries[0].key;
    let schema = record_schema(key).unwrap();

    let mut buf = Vec::new();
    buf.extend_from_slice(&16u32.to_le_bytes()); // namespace offset
    buf.extend_from_slice(&4u32.to_le_bytes()); // namespace len
    buf.extend_from_slice(&[0u8; 8]); // key offset/len
    assert_eq!(schema.validate(&buf), Validation::Valid);

    let empty_namespace = [0u8; 16];
    assert_eq!(
        schema.validate(&empty_namespace),
        Validation::RefinementViolation
    );
}

#[test]
fn test_rule_over_missing_field_degenerates_to_length_check() {
    let source = "/// @refine(ghost > 0)\n\
                  record dbi0-x-key {\n  id: u64,\n}\n\
                  record dbi0-x-value {\n  body: bytes,\n}";
    let compilation = compile_wit(source).unwrap();
    let schema = record_schema(&compilation.entries[0].key).unwrap();
    assert!(schema.refine.is_none());
    assert_eq!(schema.validate(&[0u8; 8]), Validation::Valid);
}

#[test]
fn test_malformed_refinement_is_fatal() {
    let source = "/// @refine(confidence >=)\n\
                  record dbi0-x-key {\n  confidence: score,\n}\n\
                  record dbi0-x-value {\n  body: bytes,\n}";
    let err = compile_wit(source).unwrap_err();
    assert!(matches!(err, WitError::ParseError { .. }));
}
