use serde::Serialize;
use std::fmt;

/// Role of a record within a dbi pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Key,
    Value,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Key => "key",
            RecordKind::Value => "value",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed field of a record, exactly as written in the WIT source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WitField {
    pub name: String,
    pub wit_type: String,
}

impl WitField {
    /// C identifier for the field (dashes canonicalized to underscores).
    pub fn c_name(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// One `record` declaration: name, optional refinement rule text, and fields
/// in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WitRecord {
    pub name: String,
    pub refine_rule: Option<String>,
    pub fields: Vec<WitField>,
}

impl WitRecord {
    pub fn c_name(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// A record body line that did not parse as a field and was dropped by the
/// permissive extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFragment {
    pub record: String,
    pub fragment: String,
}

/// One resolved dbi: its index, label, and key/value record pair. The full
/// entry list is built once per run, sorted ascending by index, and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbiEntry {
    pub dbi: u32,
    /// Label as written in the record names (dashes preserved).
    pub name: String,
    pub key: WitRecord,
    pub value: WitRecord,
}

impl DbiEntry {
    /// Normalized name used in the manifest and generated table.
    pub fn manifest_name(&self) -> String {
        self.name.replace('-', "_")
    }

    /// Canonical uppercase name for the generated numeric constant.
    pub fn const_name(&self) -> String {
        self.manifest_name().to_uppercase()
    }
}

/// One row of the persisted manifest. `owner` and `status` are curator-owned;
/// the rest is derived from the current entry list on every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRow {
    pub dbi: u32,
    pub name: String,
    pub key_format: String,
    pub value_format: String,
    pub owner: String,
    pub status: String,
}
