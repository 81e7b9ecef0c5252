use crate::types::{SkippedFragment, WitField, WitRecord};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Optional `/// @refine(...)` annotation on the line directly above the
    // record keyword, then the record block. Bodies cannot nest braces.
    static ref RECORD_BLOCK: Regex = Regex::new(
        r"(?m)(?:^[ \t]*///\s*@refine\(([^)]+)\)\s*\n)?[ \t]*record\s+([a-z0-9][a-z0-9-]*)\s*\{([^}]*)\}"
    )
    .unwrap();
    static ref FIELD_LINE: Regex = Regex::new(
        r"^([a-z0-9-]+)\s*:\s*([a-z0-9-]+(?:<[^>]+>)?)\s*,$"
    )
    .unwrap();
}

/// Result of the extraction pass: records in source order, plus the body
/// fragments that did not parse as fields.
#[derive(Debug, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<WitRecord>,
    pub skipped: Vec<SkippedFragment>,
}

/// Extract record declarations from WIT source text.
///
/// The field pass is deliberately lossy: a body line that does not match the
/// field grammar is reported as a `SkippedFragment` and dropped instead of
/// failing the record. A field is never invented; it either matches exactly
/// or is skipped.
pub fn parse_records(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for caps in RECORD_BLOCK.captures_iter(text) {
        let refine_rule = caps.get(1).map(|m| m.as_str().trim().to_string());
        let name = caps[2].to_string();
        let body = &caps[3];

        let mut fields = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            match FIELD_LINE.captures(line) {
                Some(f) => fields.push(WitField {
                    name: f[1].to_string(),
                    wit_type: f[2].to_string(),
                }),
                None => outcome.skipped.push(SkippedFragment {
                    record: name.clone(),
                    fragment: line.to_string(),
                }),
            }
        }

        outcome.records.push(WitRecord {
            name,
            refine_rule,
            fields,
        });
    }

    outcome
}
