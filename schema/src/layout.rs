use serde::Serialize;

/// Fixed-width representation of a single layout cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellRepr {
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl CellRepr {
    /// Width of the cell in bytes.
    pub fn width(self) -> usize {
        match self {
            CellRepr::U8 => 1,
            CellRepr::U16 => 2,
            CellRepr::U32 | CellRepr::F32 => 4,
            CellRepr::U64 | CellRepr::F64 => 8,
        }
    }

    /// The C spelling used by the generated packed structs.
    pub fn c_type(self) -> &'static str {
        match self {
            CellRepr::U8 => "uint8_t",
            CellRepr::U16 => "uint16_t",
            CellRepr::U32 => "uint32_t",
            CellRepr::U64 => "uint64_t",
            CellRepr::F32 => "float",
            CellRepr::F64 => "double",
        }
    }
}

/// One named slot in a packed record layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub name: String,
    pub repr: CellRepr,
}

/// How a field's declared type participates in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldClass {
    Unsigned,
    Signed,
    Float,
    /// Variable-length payload stored out-of-band; only the length cell is
    /// observable at validation time.
    VarLen,
    Opaque,
}

/// Cells contributed by one field. `Opaque` marks the fallback taken for a
/// type token the canonical mapping does not know, so callers can detect
/// schema drift instead of silently widening.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldCells {
    Known(Vec<Cell>),
    Opaque(Cell),
}

impl FieldCells {
    pub fn cells(&self) -> &[Cell] {
        match self {
            FieldCells::Known(cells) => cells,
            FieldCells::Opaque(cell) => std::slice::from_ref(cell),
        }
    }

    pub fn width(&self) -> usize {
        self.cells().iter().map(|c| c.repr.width()).sum()
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, FieldCells::Opaque(_))
    }
}

/// Canonical ABI mapping from a WIT type token to packed cells.
///
/// Variable-length types become an `(offset, len)` pair of 4-byte cells since
/// the payload itself lives out-of-band. Unrecognized tokens map to a single
/// opaque 8-byte cell named `<field>_unknown_layout`.
pub fn map_wit_type(wit_type: &str, c_name: &str) -> (FieldCells, FieldClass) {
    let known = |repr: CellRepr, class: FieldClass| {
        (
            FieldCells::Known(vec![Cell { name: c_name.to_string(), repr }]),
            class,
        )
    };

    match wit_type {
        "u8" | "bool" => known(CellRepr::U8, FieldClass::Unsigned),
        "s8" => known(CellRepr::U8, FieldClass::Signed),
        "u16" => known(CellRepr::U16, FieldClass::Unsigned),
        "s16" => known(CellRepr::U16, FieldClass::Signed),
        "u32" => known(CellRepr::U32, FieldClass::Unsigned),
        "s32" => known(CellRepr::U32, FieldClass::Signed),
        "u64" | "timestamp" => known(CellRepr::U64, FieldClass::Unsigned),
        "s64" => known(CellRepr::U64, FieldClass::Signed),
        "f32" => known(CellRepr::F32, FieldClass::Float),
        "f64" | "score" => known(CellRepr::F64, FieldClass::Float),
        "utf8" | "bytes" | "string" => (
            FieldCells::Known(vec![
                Cell { name: format!("{}_offset", c_name), repr: CellRepr::U32 },
                Cell { name: format!("{}_len", c_name), repr: CellRepr::U32 },
            ]),
            FieldClass::VarLen,
        ),
        _ => (
            FieldCells::Opaque(Cell {
                name: format!("{}_unknown_layout", c_name),
                repr: CellRepr::U64,
            }),
            FieldClass::Opaque,
        ),
    }
}

/// One field of a packed record layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldLayout {
    /// Field name as written in the WIT source (dashes preserved).
    pub name: String,
    /// C identifier (dashes canonicalized to underscores).
    pub c_name: String,
    pub wit_type: String,
    pub class: FieldClass,
    pub cells: FieldCells,
    /// Byte offset of the field's first cell within the packed layout.
    pub offset: usize,
}

/// The packed, unpadded layout of one record: fields in declaration order,
/// no alignment beyond natural field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordLayout {
    /// Sanitized record identifier.
    pub record: String,
    pub fields: Vec<FieldLayout>,
    /// Total packed size in bytes.
    pub size: usize,
}

impl RecordLayout {
    /// Build the layout for `record` from `(field-name, wit-type)` pairs in
    /// declaration order.
    pub fn build(record: &str, fields: &[(&str, &str)]) -> RecordLayout {
        let mut laid_out = Vec::with_capacity(fields.len());
        let mut offset = 0;

        for (name, wit_type) in fields {
            let c_name = name.replace('-', "_");
            let (cells, class) = map_wit_type(wit_type, &c_name);
            let width = cells.width();
            laid_out.push(FieldLayout {
                name: name.to_string(),
                c_name,
                wit_type: wit_type.to_string(),
                class,
                cells,
                offset,
            });
            offset += width;
        }

        RecordLayout {
            record: record.to_string(),
            fields: laid_out,
            size: offset,
        }
    }

    /// Look up a field by its WIT name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}
