use crate::layout::{CellRepr, FieldClass, FieldLayout, RecordLayout};
use crate::reader::LayoutReader;
use serde::Serialize;

/// Comparison operator of a refinement clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Field(String),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A refinement rule: a boolean expression over the fields of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RefineExpr {
    And(Box<RefineExpr>, Box<RefineExpr>),
    Or(Box<RefineExpr>, Box<RefineExpr>),
    Cmp {
        lhs: Operand,
        op: CmpOp,
        rhs: Operand,
    },
}

impl RefineExpr {
    /// Field names referenced by the rule, in first-occurrence order.
    pub fn field_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            RefineExpr::And(a, b) | RefineExpr::Or(a, b) => {
                a.collect_refs(refs);
                b.collect_refs(refs);
            }
            RefineExpr::Cmp { lhs, rhs, .. } => {
                for operand in [lhs, rhs] {
                    if let Operand::Field(name) = operand {
                        if !refs.contains(&name.as_str()) {
                            refs.push(name.as_str());
                        }
                    }
                }
            }
        }
    }

    /// Evaluate the rule against a packed record buffer. A clause that cannot
    /// be resolved (unknown field, unreadable cell) evaluates to false.
    pub fn eval(&self, layout: &RecordLayout, data: &[u8]) -> bool {
        match self {
            RefineExpr::And(a, b) => a.eval(layout, data) && b.eval(layout, data),
            RefineExpr::Or(a, b) => a.eval(layout, data) || b.eval(layout, data),
            RefineExpr::Cmp { lhs, op, rhs } => {
                match (resolve(lhs, layout, data), resolve(rhs, layout, data)) {
                    (Some(l), Some(r)) => compare(&l, *op, &r),
                    _ => false,
                }
            }
        }
    }
}

/// A resolved comparison operand: either a literal or a decoded cell value.
enum Scalar {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    /// Length cell of a variable-length field; the payload is out-of-band.
    Len(u32),
    Str(String),
}

fn resolve(operand: &Operand, layout: &RecordLayout, data: &[u8]) -> Option<Scalar> {
    match operand {
        Operand::Int(v) => Some(Scalar::Signed(*v)),
        Operand::Float(v) => Some(Scalar::Float(*v)),
        Operand::Str(v) => Some(Scalar::Str(v.clone())),
        Operand::Field(name) => read_field(layout.field(name)?, data),
    }
}

fn first_repr(field: &FieldLayout) -> CellRepr {
    field.cells.cells()[0].repr
}

fn read_unsigned(reader: &mut LayoutReader, repr: CellRepr) -> Result<u64, ()> {
    match repr {
        CellRepr::U8 => Ok(reader.read_u8()? as u64),
        CellRepr::U16 => Ok(reader.read_u16()? as u64),
        CellRepr::U32 => Ok(reader.read_u32()? as u64),
        CellRepr::U64 => reader.read_u64(),
        CellRepr::F32 | CellRepr::F64 => Err(()),
    }
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - 8 * width as u32;
    ((raw << shift) as i64) >> shift
}

fn read_field(field: &FieldLayout, data: &[u8]) -> Option<Scalar> {
    let mut reader = LayoutReader::new(data.get(field.offset..)?);
    match field.class {
        FieldClass::VarLen => {
            // Skip the offset cell; only the length is observable.
            reader.read_u32().ok()?;
            Some(Scalar::Len(reader.read_u32().ok()?))
        }
        FieldClass::Float => match first_repr(field) {
            CellRepr::F32 => Some(Scalar::Float(reader.read_f32().ok()? as f64)),
            _ => Some(Scalar::Float(reader.read_f64().ok()?)),
        },
        FieldClass::Signed => {
            let repr = first_repr(field);
            let raw = read_unsigned(&mut reader, repr).ok()?;
            Some(Scalar::Signed(sign_extend(raw, repr.width())))
        }
        FieldClass::Unsigned | FieldClass::Opaque => {
            let raw = read_unsigned(&mut reader, first_repr(field)).ok()?;
            Some(Scalar::Unsigned(raw))
        }
    }
}

fn as_i128(scalar: &Scalar) -> Option<i128> {
    match scalar {
        Scalar::Unsigned(v) => Some(*v as i128),
        Scalar::Signed(v) => Some(*v as i128),
        Scalar::Len(v) => Some(*v as i128),
        Scalar::Float(_) | Scalar::Str(_) => None,
    }
}

fn as_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Unsigned(v) => Some(*v as f64),
        Scalar::Signed(v) => Some(*v as f64),
        Scalar::Len(v) => Some(*v as f64),
        Scalar::Float(v) => Some(*v),
        Scalar::Str(_) => None,
    }
}

fn compare(lhs: &Scalar, op: CmpOp, rhs: &Scalar) -> bool {
    match (lhs, rhs) {
        // A variable-length field equals a string literal only when both are
        // empty; the payload bytes are not available for inspection.
        (Scalar::Len(len), Scalar::Str(s)) | (Scalar::Str(s), Scalar::Len(len)) => {
            let eq = *len == 0 && s.is_empty();
            match op {
                CmpOp::Eq => eq,
                CmpOp::Ne => !eq,
                _ => false,
            }
        }
        (Scalar::Str(a), Scalar::Str(b)) => match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            _ => false,
        },
        (Scalar::Str(_), _) | (_, Scalar::Str(_)) => false,
        _ => {
            if matches!(lhs, Scalar::Float(_)) || matches!(rhs, Scalar::Float(_)) {
                match (as_f64(lhs), as_f64(rhs)) {
                    (Some(a), Some(b)) => cmp_ordered(a.partial_cmp(&b), op),
                    _ => false,
                }
            } else {
                match (as_i128(lhs), as_i128(rhs)) {
                    (Some(a), Some(b)) => cmp_ordered(a.partial_cmp(&b), op),
                    _ => false,
                }
            }
        }
    }
}

fn cmp_ordered(ordering: Option<std::cmp::Ordering>, op: CmpOp) -> bool {
    use std::cmp::Ordering;
    let ordering = match ordering {
        Some(o) => o,
        None => return false,
    };
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    }
}
