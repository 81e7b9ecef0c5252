use crate::types::{DbiEntry, ManifestRow};
use std::collections::BTreeMap;

/// Exact header every manifest must carry.
pub const MANIFEST_HEADER: &str = "dbi,name,key_format,value_format,owner,status";

/// Owner assigned to rows with no preserved curator metadata.
pub const DEFAULT_OWNER: &str = "runtime";

/// Curator-owned metadata recovered from one prior manifest row.
struct PriorRow {
    name: String,
    owner: String,
    status: String,
}

/// Recover per-dbi curator metadata from prior manifest text. This pass only
/// salvages what it can: rows with an unparsable dbi or an empty name are
/// ignored, and empty owner/status fall back to the defaults.
fn prior_rows(text: &str) -> BTreeMap<u32, PriorRow> {
    let mut rows = BTreeMap::new();

    for line in text.lines().skip(1) {
        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() != 6 {
            continue;
        }
        let dbi = match cols[0].trim().parse::<u32>() {
            Ok(dbi) => dbi,
            Err(_) => continue,
        };
        let name = cols[1].trim();
        if name.is_empty() {
            continue;
        }
        let owner = cols[4].trim();
        let status = cols[5].trim();
        rows.insert(
            dbi,
            PriorRow {
                name: name.to_string(),
                owner: if owner.is_empty() { DEFAULT_OWNER } else { owner }.to_string(),
                status: if status.is_empty() { "planned" } else { status }.to_string(),
            },
        );
    }

    rows
}

/// Merge the freshly derived entry list with curator-owned fields from the
/// prior manifest.
///
/// `owner` and `status` carry forward only when the prior row's stored name
/// equals the newly derived name; a rename is a new logical entry and takes
/// the defaults (dbi 0 starts `active`, everything else `planned`). The
/// derived columns are always overwritten.
pub fn reconcile_rows(entries: &[DbiEntry], prior_text: &str) -> Vec<ManifestRow> {
    let prior = prior_rows(prior_text);

    entries
        .iter()
        .map(|entry| {
            let name = entry.manifest_name();
            let mut owner = DEFAULT_OWNER.to_string();
            let mut status = if entry.dbi == 0 { "active" } else { "planned" }.to_string();
            if let Some(old) = prior.get(&entry.dbi) {
                if old.name == name {
                    owner = old.owner.clone();
                    status = old.status.clone();
                }
            }
            ManifestRow {
                dbi: entry.dbi,
                name,
                key_format: format!("wit:{}", entry.key.name),
                value_format: format!("wit:{}", entry.value.name),
                owner,
                status,
            }
        })
        .collect()
}

/// Render rows as manifest text: header first, one row per line, ascending
/// dbi order, trailing newline.
pub fn render_manifest(rows: &[ManifestRow]) -> String {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(MANIFEST_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.dbi, row.name, row.key_format, row.value_format, row.owner, row.status
        ));
    }
    out
}
