use crate::types::RecordKind;
use thiserror::Error;

/// Errors that abort a compilation run. Any of these surfacing before the
/// write phase means no output file is touched.
#[derive(Debug, Error)]
pub enum WitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid refinement in record {record} at column {column}: {msg}")]
    ParseError {
        record: String,
        msg: String,
        column: usize,
    },

    #[error("dbi {dbi} has multiple names ({first} vs {second})")]
    LabelConflict {
        dbi: u32,
        first: String,
        second: String,
    },

    #[error("duplicate {kind} record for dbi {dbi}: {record}")]
    DuplicateKind {
        dbi: u32,
        kind: RecordKind,
        record: String,
    },

    #[error("no dbi records found (expected dbiN-*-key/value records)")]
    EmptySchema,

    #[error("dbi sequence must start at 0")]
    MissingZero,

    #[error("dbi sequence gap between {prev} and {next}")]
    SequenceGap { prev: u32, next: u32 },

    #[error("dbi {dbi} missing {kind} record")]
    IncompletePair { dbi: u32, kind: RecordKind },
}
