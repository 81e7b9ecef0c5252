use crate::codegen::{generate_header, generate_source, record_layout};
use crate::error::WitError;
use crate::manifest::{reconcile_rows, render_manifest};
use crate::parser::parse_records;
use crate::refine::parse_refine_rule;
use crate::resolver::resolve_entries;
use crate::types::{DbiEntry, SkippedFragment, WitRecord};
use serde::Serialize;
use std::fs;
use std::path::Path;
use wit_dbi_schema::RecordSchema;

/// Everything derived from one WIT source text.
#[derive(Debug, Serialize)]
pub struct WitCompilation {
    /// All parsed records, dbi or not, in source order.
    pub records: Vec<WitRecord>,
    /// Body fragments dropped by the permissive field pass.
    pub skipped: Vec<SkippedFragment>,
    /// Resolved dbi entries, ascending by index.
    pub entries: Vec<DbiEntry>,
}

/// Compile WIT source text: extract records, resolve the dbi entry list, and
/// reject unparsable refinement rules before anything is emitted.
pub fn compile_wit(text: &str) -> Result<WitCompilation, WitError> {
    let outcome = parse_records(text);
    let entries = resolve_entries(&outcome.records)?;
    for entry in &entries {
        record_schema(&entry.key)?;
        record_schema(&entry.value)?;
    }
    Ok(WitCompilation {
        records: outcome.records,
        skipped: outcome.skipped,
        entries,
    })
}

/// Build the runtime schema for one record: its packed layout plus the
/// parsed refinement rule.
///
/// A rule referencing a field the record does not declare degenerates the
/// runtime validator to the length-only check; the rule is dropped rather
/// than left to fail on every buffer.
pub fn record_schema(record: &WitRecord) -> Result<RecordSchema, WitError> {
    let layout = record_layout(record);
    let refine = match &record.refine_rule {
        Some(rule) => {
            let expr = parse_refine_rule(&record.name, rule)?;
            let all_known = expr
                .field_refs()
                .iter()
                .all(|name| record.fields.iter().any(|f| f.name == *name));
            if all_known {
                Some(expr)
            } else {
                None
            }
        }
        None => None,
    };
    Ok(RecordSchema::new(layout, refine))
}

/// What `generate_outputs` wrote, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    pub entries: usize,
    pub skipped: usize,
}

/// Run the full pipeline and write the manifest, header, and source.
///
/// Every output is computed in memory before the first write, and files are
/// written one at a time in that fixed order, so a failure ahead of the write
/// phase leaves previously generated artifacts intact.
pub fn generate_outputs(
    text: &str,
    manifest: &Path,
    header: &Path,
    source: &Path,
) -> Result<GenerateSummary, WitError> {
    let compilation = compile_wit(text)?;

    let prior = if manifest.exists() {
        fs::read_to_string(manifest)?
    } else {
        String::new()
    };
    let rows = reconcile_rows(&compilation.entries, &prior);
    let manifest_text = render_manifest(&rows);
    let header_text = generate_header(&compilation.entries);
    let header_include = header.to_string_lossy().replace('\\', "/");
    let source_text = generate_source(&compilation.entries, &header_include);

    write_file(manifest, &manifest_text)?;
    write_file(header, &header_text)?;
    write_file(source, &source_text)?;

    Ok(GenerateSummary {
        entries: compilation.entries.len(),
        skipped: compilation.skipped.len(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), WitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}
