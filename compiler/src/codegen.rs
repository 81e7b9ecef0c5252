use crate::types::{DbiEntry, WitRecord};
use std::collections::HashSet;
use wit_dbi_schema::RecordLayout;

const GENERATED_NOTE: &str = "/* Auto-generated by witdbi; DO NOT EDIT. */";
const HEADER_GUARD: &str = "WIT_SCHEMA_DBIS_H";

/// Packed layout for one record, in declaration order.
pub fn record_layout(record: &WitRecord) -> RecordLayout {
    let fields: Vec<(&str, &str)> = record
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.wit_type.as_str()))
        .collect();
    RecordLayout::build(&record.c_name(), &fields)
}

/// Replace whole-word occurrences of `word` in `text`. Word characters are
/// the WIT identifier alphabet plus underscore, so one field name can never
/// match inside another.
fn replace_whole_word(text: &str, word: &str, replacement: &str) -> String {
    fn is_ident(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let prev_ok = text[..i].chars().next_back().map_or(true, |c| !is_ident(c));
        if prev_ok && rest.starts_with(word) {
            let after = &rest[word.len()..];
            if after.chars().next().map_or(true, |c| !is_ident(c)) {
                out.push_str(replacement);
                i += word.len();
                continue;
            }
        }
        match rest.chars().next() {
            Some(c) => {
                out.push(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }
    out
}

fn struct_lines(record: &WitRecord) -> Vec<String> {
    let layout = record_layout(record);
    let mut lines = vec!["typedef struct __attribute__((packed)) {".to_string()];
    for field in &layout.fields {
        for cell in field.cells.cells() {
            lines.push(format!("    {} {};", cell.repr.c_type(), cell.name));
        }
    }
    lines.push(format!("}} Wit_{};", layout.record));
    lines.push(String::new());
    lines
}

fn validator_lines(record: &WitRecord) -> Vec<String> {
    let c_name = record.c_name();
    let mut lines = vec![
        format!(
            "static inline int wit_validate_{}(const void *data, uint32_t len) {{",
            c_name
        ),
        "    if (data == NULL || len == 0) return 0; /* Deletion or empty payload bypass */"
            .to_string(),
        format!(
            "    if (len < sizeof(Wit_{})) return -1; /* ERR_CORRUPT */",
            c_name
        ),
    ];

    if let Some(rule) = &record.refine_rule {
        lines.push(format!(
            "    const Wit_{} *rec = (const Wit_{} *)data;",
            c_name, c_name
        ));
        let mut substituted = rule.clone();
        for field in &record.fields {
            substituted = replace_whole_word(
                &substituted,
                &field.name,
                &format!("rec->{}", field.c_name()),
            );
        }
        lines.push(format!(
            "    if (!({})) return -1; /* Refinement violation! */",
            substituted
        ));
    } else {
        lines.push("    (void)data; /* No refinement constraints */".to_string());
    }

    lines.push("    return 0;".to_string());
    lines.push("}".to_string());
    lines.push(String::new());
    lines
}

/// Render the generated header: dbi constants, one packed struct and one
/// validator per distinct record, and the schema table declaration.
pub fn generate_header(entries: &[DbiEntry]) -> String {
    let mut lines = vec![
        GENERATED_NOTE.to_string(),
        format!("#ifndef {}", HEADER_GUARD),
        format!("#define {}", HEADER_GUARD),
        String::new(),
        "#include <stdint.h>".to_string(),
        "#include <stddef.h>".to_string(),
        String::new(),
        "typedef struct {".to_string(),
        "    uint32_t dbi;".to_string(),
        "    const char *name;".to_string(),
        "    const char *key_wit_record;".to_string(),
        "    const char *value_wit_record;".to_string(),
        "} WitDbiSchema;".to_string(),
        String::new(),
    ];

    for entry in entries {
        lines.push(format!("#define WIT_DBI_{} {}u", entry.const_name(), entry.dbi));
    }
    lines.push(String::new());

    // Key and value share the generation path; helper records referenced by
    // more than one role are emitted once.
    let mut seen: HashSet<String> = HashSet::new();
    for entry in entries {
        for record in [&entry.key, &entry.value] {
            if seen.insert(record.name.clone()) {
                lines.extend(struct_lines(record));
                lines.extend(validator_lines(record));
            }
        }
    }

    lines.extend([
        String::new(),
        "extern const WitDbiSchema wit_dbi_schema[];".to_string(),
        "extern const uint32_t wit_dbi_schema_count;".to_string(),
        String::new(),
        format!("#endif /* {} */", HEADER_GUARD),
        String::new(),
    ]);
    lines.join("\n")
}

/// Render the generated source: the per-index table and its count.
pub fn generate_source(entries: &[DbiEntry], header_include: &str) -> String {
    let mut lines = vec![
        GENERATED_NOTE.to_string(),
        format!("#include \"{}\"", header_include),
        String::new(),
        "const WitDbiSchema wit_dbi_schema[] = {".to_string(),
    ];

    for entry in entries {
        lines.push(format!(
            "    {{{}u, \"{}\", \"{}\", \"{}\"}},",
            entry.dbi,
            entry.manifest_name(),
            entry.key.name,
            entry.value.name
        ));
    }

    lines.extend([
        "};".to_string(),
        String::new(),
        "const uint32_t wit_dbi_schema_count = \
         (uint32_t)(sizeof(wit_dbi_schema) / sizeof(wit_dbi_schema[0]));"
            .to_string(),
        String::new(),
    ]);
    lines.join("\n")
}
