use crate::error::WitError;
use crate::types::{DbiEntry, RecordKind, WitRecord};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref DBI_RECORD: Regex =
        Regex::new(r"^dbi([0-9]+)-([a-z0-9][a-z0-9-]*)-(key|value)$").unwrap();
}

#[derive(Default)]
struct Slot {
    key: Option<WitRecord>,
    value: Option<WitRecord>,
}

/// Group records following the `dbi<N>-<label>-<key|value>` convention into
/// the resolved entry list.
///
/// Records not matching the convention are ignored. The returned entries are
/// sorted ascending by index; that order is the stable iteration order for
/// every downstream emitter. Index registration is kept in a sorted map
/// rather than a position-indexed arena so an absurd index in source text
/// cannot force a huge allocation before the gap check rejects it.
pub fn resolve_entries(records: &[WitRecord]) -> Result<Vec<DbiEntry>, WitError> {
    let mut labels: BTreeMap<u32, String> = BTreeMap::new();
    let mut slots: BTreeMap<u32, Slot> = BTreeMap::new();

    for record in records {
        let caps = match DBI_RECORD.captures(&record.name) {
            Some(caps) => caps,
            None => continue,
        };
        let dbi = match caps[1].parse::<u32>() {
            Ok(dbi) => dbi,
            Err(_) => continue,
        };
        let label = caps[2].to_string();
        let kind = if &caps[3] == "key" {
            RecordKind::Key
        } else {
            RecordKind::Value
        };

        if let Some(existing) = labels.get(&dbi) {
            if existing != &label {
                return Err(WitError::LabelConflict {
                    dbi,
                    first: existing.clone(),
                    second: label,
                });
            }
        } else {
            labels.insert(dbi, label);
        }

        let slot = slots.entry(dbi).or_default();
        let target = match kind {
            RecordKind::Key => &mut slot.key,
            RecordKind::Value => &mut slot.value,
        };
        if target.is_some() {
            return Err(WitError::DuplicateKind {
                dbi,
                kind,
                record: record.name.clone(),
            });
        }
        *target = Some(record.clone());
    }

    if slots.is_empty() {
        return Err(WitError::EmptySchema);
    }

    let indices: Vec<u32> = slots.keys().copied().collect();
    if indices[0] != 0 {
        return Err(WitError::MissingZero);
    }
    for pair in indices.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(WitError::SequenceGap {
                prev: pair[0],
                next: pair[1],
            });
        }
    }

    let mut entries = Vec::with_capacity(slots.len());
    for (dbi, slot) in slots {
        let key = slot.key.ok_or(WitError::IncompletePair {
            dbi,
            kind: RecordKind::Key,
        })?;
        let value = slot.value.ok_or(WitError::IncompletePair {
            dbi,
            kind: RecordKind::Value,
        })?;
        let name = match labels.remove(&dbi) {
            Some(name) => name,
            None => continue,
        };
        entries.push(DbiEntry {
            dbi,
            name,
            key,
            value,
        });
    }

    Ok(entries)
}
