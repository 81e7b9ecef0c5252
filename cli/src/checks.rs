use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use wit_dbi_compiler::manifest::MANIFEST_HEADER;

lazy_static! {
    static ref MACRO_DEF: Regex =
        Regex::new(r"(?m)^\s*#define\s+(WIT_DBI_[A-Z0-9_]+)\s+([0-9]+)u?\s*$").unwrap();
    static ref MACRO_USE: Regex = Regex::new(r"\bWIT_DBI_[A-Z0-9_]+\b").unwrap();
    static ref DOC_DBI: Regex = Regex::new(r"\bDBI\s*([0-9]+)\b").unwrap();
}

/// Validate a manifest file: exact header, no empty fields, non-negative
/// unique dbi values, zero-based and gap-free. Returns a PASS summary or the
/// first failure message.
pub fn check_manifest(manifest: &Path) -> Result<String, String> {
    let text = fs::read_to_string(manifest)
        .map_err(|_| format!("file not found: {}", manifest.display()))?;

    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header == MANIFEST_HEADER => {}
        other => {
            return Err(format!(
                "expected header {:?}, got {:?}",
                MANIFEST_HEADER,
                other.unwrap_or("")
            ))
        }
    }

    let mut seen = BTreeSet::new();
    let mut row_count = 0;
    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() != 6 {
            return Err(format!("line {}: expected 6 fields, got {}", line_no, cols.len()));
        }
        let names = ["dbi", "name", "key_format", "value_format", "owner", "status"];
        for (name, value) in names.iter().zip(&cols) {
            if value.trim().is_empty() {
                return Err(format!("line {}: empty {}", line_no, name));
            }
        }
        let dbi: i64 = cols[0]
            .trim()
            .parse()
            .map_err(|_| format!("line {}: dbi is not an integer: {}", line_no, cols[0]))?;
        if dbi < 0 {
            return Err(format!("line {}: dbi must be >= 0", line_no));
        }
        if !seen.insert(dbi) {
            return Err(format!("line {}: duplicate dbi {}", line_no, dbi));
        }
        row_count += 1;
    }

    if row_count == 0 {
        return Err("manifest has no entries".to_string());
    }

    let sorted: Vec<i64> = seen.iter().copied().collect();
    if sorted[0] != 0 {
        return Err("dbi 0 entry is required".to_string());
    }
    for pair in sorted.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(format!("dbi sequence has a gap between {} and {}", pair[0], pair[1]));
        }
    }

    Ok(format!(
        "(entries={} max_dbi={} file={})",
        row_count,
        sorted[sorted.len() - 1],
        manifest.display()
    ))
}

struct StatusRow {
    name: String,
    status: String,
}

fn load_manifest_rows(manifest: &Path) -> Result<BTreeMap<u32, StatusRow>, String> {
    let text = fs::read_to_string(manifest)
        .map_err(|_| format!("file not found: {}", manifest.display()))?;
    let mut by_dbi = BTreeMap::new();
    for (idx, line) in text.lines().skip(1).enumerate() {
        let line_no = idx + 2;
        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() != 6 {
            continue;
        }
        let dbi: u32 = cols[0]
            .trim()
            .parse()
            .map_err(|_| format!("line {}: invalid dbi value {:?}", line_no, cols[0]))?;
        by_dbi.insert(
            dbi,
            StatusRow {
                name: cols[1].trim().to_string(),
                status: cols[5].trim().to_string(),
            },
        );
    }
    Ok(by_dbi)
}

fn load_header_macros(header: &Path) -> Result<BTreeMap<String, u32>, String> {
    let text = fs::read_to_string(header)
        .map_err(|_| format!("file not found: {}", header.display()))?;
    let mut macros = BTreeMap::new();
    for caps in MACRO_DEF.captures_iter(&text) {
        if let Ok(dbi) = caps[2].parse::<u32>() {
            macros.insert(caps[1].to_string(), dbi);
        }
    }
    Ok(macros)
}

fn sorted_dir_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir).map_err(|_| format!("path not found: {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && keep(p))
        .collect();
    files.sort();
    Ok(files)
}

fn collect_runtime_usage(
    runner_dir: &Path,
    macros: &BTreeMap<String, u32>,
) -> Result<BTreeSet<u32>, String> {
    let files = sorted_dir_files(runner_dir, |p| {
        matches!(
            p.extension().and_then(|e| e.to_str()),
            Some("c") | Some("h")
        )
    })?;
    let mut used = BTreeSet::new();
    for path in files {
        let text = fs::read_to_string(&path)
            .map_err(|_| format!("unreadable file: {}", path.display()))?;
        for token in MACRO_USE.find_iter(&text) {
            if let Some(dbi) = macros.get(token.as_str()) {
                used.insert(*dbi);
            }
        }
    }
    Ok(used)
}

fn collect_doc_usage(docs_dir: &Path) -> Result<BTreeSet<u32>, String> {
    let files = sorted_dir_files(docs_dir, |p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("RUNNER_") && n.ends_with(".md"))
    })?;
    let mut used = BTreeSet::new();
    for path in files {
        let text = fs::read_to_string(&path)
            .map_err(|_| format!("unreadable file: {}", path.display()))?;
        for caps in DOC_DBI.captures_iter(&text) {
            if let Ok(dbi) = caps[1].parse::<u32>() {
                used.insert(dbi);
            }
        }
    }
    Ok(used)
}

/// Cross-check manifest status against the running codebase: every dbi the
/// runner code or docs reference must exist and be `active`, and every
/// generated constant must match a manifest row by index and derived name.
pub fn check_status(manifest: &Path, header: &Path, repo_root: &Path) -> Result<String, String> {
    let runner_dir = repo_root.join("src").join("runner");
    let docs_dir = repo_root.join("docs");
    for path in [manifest, header, runner_dir.as_path(), docs_dir.as_path()] {
        if !path.exists() {
            return Err(format!("path not found: {}", path.display()));
        }
    }

    let by_dbi = load_manifest_rows(manifest)?;
    let macros = load_header_macros(header)?;
    if macros.is_empty() {
        return Err(format!("no WIT_DBI_* macros found in {}", header.display()));
    }

    let runtime_used = collect_runtime_usage(&runner_dir, &macros)?;
    let doc_used = collect_doc_usage(&docs_dir)?;
    let required_active: BTreeSet<u32> = runtime_used.union(&doc_used).copied().collect();

    for dbi in &required_active {
        let row = by_dbi.get(dbi).ok_or_else(|| {
            format!(
                "DBI {} is referenced by runner code/docs but missing in manifest",
                dbi
            )
        })?;
        if !row.status.eq_ignore_ascii_case("active") {
            return Err(format!(
                "DBI {} ({}) is referenced by runner code/docs but has status={:?}; expected 'active'",
                dbi, row.name, row.status
            ));
        }
    }

    for (name, dbi) in &macros {
        let row = by_dbi
            .get(dbi)
            .ok_or_else(|| format!("{}={} missing from manifest", name, dbi))?;
        let macro_name = name["WIT_DBI_".len()..].to_lowercase();
        if macro_name != row.name {
            return Err(format!(
                "{} name mismatch: macro implies {:?}, manifest has {:?}",
                name, macro_name, row.name
            ));
        }
    }

    Ok(format!(
        "(runtime_dbis={} doc_dbis={} required_active={})",
        runtime_used.len(),
        doc_used.len(),
        required_active.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GOOD_MANIFEST: &str = "dbi,name,key_format,value_format,owner,status\n\
                                 0,app_state,wit:dbi0-app-state-key,wit:dbi0-app-state-value,runtime,active\n\
                                 1,audit_log,wit:dbi1-audit-log-key,wit:dbi1-audit-log-value,runtime,planned\n";

    fn write_manifest(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("dbi_manifest.csv");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_check_manifest_accepts_well_formed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, GOOD_MANIFEST);
        let summary = check_manifest(&path).unwrap();
        assert!(summary.contains("entries=2"));
        assert!(summary.contains("max_dbi=1"));
    }

    #[test]
    fn test_check_manifest_rejects_wrong_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, "dbi,name,owner,status\n0,x,runtime,active\n");
        let err = check_manifest(&path).unwrap_err();
        assert!(err.contains("expected header"));
    }

    #[test]
    fn test_check_manifest_rejects_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            &dir,
            "dbi,name,key_format,value_format,owner,status\n0,app_state,wit:k,wit:v,,active\n",
        );
        let err = check_manifest(&path).unwrap_err();
        assert_eq!(err, "line 2: empty owner");
    }

    #[test]
    fn test_check_manifest_rejects_negative_and_duplicate_dbi() {
        let dir = tempfile::tempdir().unwrap();
        let negative = write_manifest(
            &dir,
            "dbi,name,key_format,value_format,owner,status\n-1,x,k,v,runtime,active\n",
        );
        assert_eq!(check_manifest(&negative).unwrap_err(), "line 2: dbi must be >= 0");

        let duplicate = write_manifest(
            &dir,
            "dbi,name,key_format,value_format,owner,status\n\
             0,x,k,v,runtime,active\n\
             0,y,k,v,runtime,active\n",
        );
        assert_eq!(check_manifest(&duplicate).unwrap_err(), "line 3: duplicate dbi 0");
    }

    #[test]
    fn test_check_manifest_rejects_missing_zero_and_gap() {
        let dir = tempfile::tempdir().unwrap();
        let no_zero = write_manifest(
            &dir,
            "dbi,name,key_format,value_format,owner,status\n1,x,k,v,runtime,active\n",
        );
        assert_eq!(check_manifest(&no_zero).unwrap_err(), "dbi 0 entry is required");

        let gapped = write_manifest(
            &dir,
            "dbi,name,key_format,value_format,owner,status\n\
             0,x,k,v,runtime,active\n\
             2,y,k,v,runtime,active\n",
        );
        assert_eq!(
            check_manifest(&gapped).unwrap_err(),
            "dbi sequence has a gap between 0 and 2"
        );
    }

    fn status_fixture(dir: &tempfile::TempDir, manifest: &str, runner_c: &str, doc: &str) -> (PathBuf, PathBuf, PathBuf) {
        let root = dir.path().to_path_buf();
        let runner = root.join("src").join("runner");
        let docs = root.join("docs");
        fs::create_dir_all(&runner).unwrap();
        fs::create_dir_all(&docs).unwrap();

        let manifest_path = root.join("dbi_manifest.csv");
        fs::write(&manifest_path, manifest).unwrap();

        let header_path = root.join("wit_schema_dbis.h");
        fs::write(
            &header_path,
            "#define WIT_DBI_APP_STATE 0u\n#define WIT_DBI_AUDIT_LOG 1u\n",
        )
        .unwrap();

        fs::write(runner.join("store.c"), runner_c).unwrap();
        fs::write(docs.join("RUNNER_STORE.md"), doc).unwrap();

        (manifest_path, header_path, root)
    }

    #[test]
    fn test_check_status_passes_when_referenced_dbis_are_active() {
        let dir = tempfile::tempdir().unwrap();
        let (manifest, header, root) = status_fixture(
            &dir,
            GOOD_MANIFEST,
            "int open(void) { return mdb_open(WIT_DBI_APP_STATE); }\n",
            "The store keeps session data in DBI 0.\n",
        );
        let summary = check_status(&manifest, &header, &root).unwrap();
        assert!(summary.contains("runtime_dbis=1"));
        assert!(summary.contains("doc_dbis=1"));
        assert!(summary.contains("required_active=1"));
    }

    #[test]
    fn test_check_status_rejects_inactive_referenced_dbi() {
        let dir = tempfile::tempdir().unwrap();
        let (manifest, header, root) = status_fixture(
            &dir,
            GOOD_MANIFEST,
            "int open(void) { return mdb_open(WIT_DBI_AUDIT_LOG); }\n",
            "Nothing to see here.\n",
        );
        let err = check_status(&manifest, &header, &root).unwrap_err();
        assert!(err.contains("DBI 1 (audit_log)"));
        assert!(err.contains("expected 'active'"));
    }

    #[test]
    fn test_check_status_rejects_macro_name_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = "dbi,name,key_format,value_format,owner,status\n\
                       0,session_state,wit:k,wit:v,runtime,active\n\
                       1,audit_log,wit:k,wit:v,runtime,planned\n";
        let (manifest, header, root) = status_fixture(&dir, renamed, "", "");
        let err = check_status(&manifest, &header, &root).unwrap_err();
        assert!(err.contains("WIT_DBI_APP_STATE name mismatch"));
    }

    #[test]
    fn test_check_status_rejects_macro_missing_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let short = "dbi,name,key_format,value_format,owner,status\n\
                     0,app_state,wit:k,wit:v,runtime,active\n";
        let (manifest, header, root) = status_fixture(&dir, short, "", "");
        let err = check_status(&manifest, &header, &root).unwrap_err();
        assert_eq!(err, "WIT_DBI_AUDIT_LOG=1 missing from manifest");
    }
}
