use crate::layout::RecordLayout;
use crate::refine::RefineExpr;
use serde::Serialize;

/// Outcome of validating one stored buffer against a record schema.
///
/// These mirror the result codes of the generated C validators: outcomes are
/// returned to the caller, never raised, and the caller decides policy (for
/// example, rejecting a write versus treating it as a tombstone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Validation {
    /// Zero-length payload: a deletion marker, always accepted.
    Empty,
    /// Payload shorter than the packed layout.
    Corrupt,
    /// Payload is large enough and satisfies the refinement rule, if any.
    Valid,
    /// Payload decodes but the refinement rule evaluates to false.
    RefinementViolation,
}

/// A record's packed layout together with its optional refinement rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSchema {
    pub layout: RecordLayout,
    pub refine: Option<RefineExpr>,
}

impl RecordSchema {
    pub fn new(layout: RecordLayout, refine: Option<RefineExpr>) -> RecordSchema {
        RecordSchema { layout, refine }
    }

    /// Validate a stored buffer against this schema.
    pub fn validate(&self, data: &[u8]) -> Validation {
        if data.is_empty() {
            return Validation::Empty;
        }
        if data.len() < self.layout.size {
            return Validation::Corrupt;
        }
        if let Some(rule) = &self.refine {
            if !rule.eval(&self.layout, data) {
                return Validation::RefinementViolation;
            }
        }
        Validation::Valid
    }
}
