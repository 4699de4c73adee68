//! Shape descriptors.
//!
//! A shape describes the binary layout of a shaped value. Shapes are interned
//! by a [`crate::ShapeTable`] and never change once they have an id.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, ShapeTableError};
use crate::limits::{
    AID_SIZE, BOOLEAN_SIZE, NUMBER_SIZE, OFFSET_SIZE, SHAPE_HEADER_SIZE, SHORT_STRING_SIZE,
    SID_SIZE, SIZE_VARIABLE,
};

/// Shape identifier.
pub type Sid = u64;

/// Attribute identifier. Zero is never a valid attribute.
pub type Aid = u64;

/// Never a valid shape id.
pub const SID_ILLEGAL: Sid = 0;
pub const SID_NULL: Sid = 1;
pub const SID_BOOLEAN: Sid = 2;
pub const SID_NUMBER: Sid = 3;
pub const SID_SHORT_STRING: Sid = 4;
pub const SID_LONG_STRING: Sid = 5;
/// The heterogeneous list shape, shared by every heterogeneous list.
pub const SID_LIST: Sid = 6;

/// First id handed out for composite shapes.
pub const FIRST_DYNAMIC_SID: Sid = 7;

/// Shapes that exist in every table under fixed ids.
pub static BASIC_SHAPES: [Shape; 6] = [
    Shape { sid: SID_NULL, kind: ShapeKind::Null },
    Shape { sid: SID_BOOLEAN, kind: ShapeKind::Boolean },
    Shape { sid: SID_NUMBER, kind: ShapeKind::Number },
    Shape { sid: SID_SHORT_STRING, kind: ShapeKind::ShortString },
    Shape { sid: SID_LONG_STRING, kind: ShapeKind::LongString },
    Shape { sid: SID_LIST, kind: ShapeKind::List },
];

/// Returns the pre-interned shape for a basic id.
pub fn basic_shape(sid: Sid) -> Option<&'static Shape> {
    match sid {
        SID_NULL..=SID_LIST => BASIC_SHAPES.get((sid - SID_NULL) as usize),
        _ => None,
    }
}

/// Shape type codes as stored in the descriptor `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShapeType {
    Null = 1,
    Boolean = 2,
    Number = 3,
    ShortString = 4,
    LongString = 5,
    Array = 6,
    List = 7,
    HomogeneousList = 8,
    HomogeneousSizedList = 9,
}

impl ShapeType {
    /// Creates a ShapeType from its descriptor code.
    pub fn from_u8(v: u8) -> Option<ShapeType> {
        match v {
            1 => Some(ShapeType::Null),
            2 => Some(ShapeType::Boolean),
            3 => Some(ShapeType::Number),
            4 => Some(ShapeType::ShortString),
            5 => Some(ShapeType::LongString),
            6 => Some(ShapeType::Array),
            7 => Some(ShapeType::List),
            8 => Some(ShapeType::HomogeneousList),
            9 => Some(ShapeType::HomogeneousSizedList),
            _ => None,
        }
    }

    /// Ordering weight used when canonicalizing object members.
    ///
    /// Note the sized list sorts before arrays, unlike the type codes.
    pub fn weight(self) -> u16 {
        match self {
            ShapeType::Null => 100,
            ShapeType::Boolean => 200,
            ShapeType::Number => 300,
            ShapeType::ShortString => 400,
            ShapeType::LongString => 500,
            ShapeType::HomogeneousSizedList => 600,
            ShapeType::Array => 700,
            ShapeType::List => 800,
            ShapeType::HomogeneousList => 900,
        }
    }

    /// Lower-case name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Null => "null",
            ShapeType::Boolean => "boolean",
            ShapeType::Number => "number",
            ShapeType::ShortString => "short string",
            ShapeType::LongString => "long string",
            ShapeType::Array => "array",
            ShapeType::List => "list",
            ShapeType::HomogeneousList => "homogeneous list",
            ShapeType::HomogeneousSizedList => "homogeneous sized list",
        }
    }

    /// Returns true for the two string encodings.
    pub fn is_string(self) -> bool {
        matches!(self, ShapeType::ShortString | ShapeType::LongString)
    }
}

/// Layout of an object shape.
///
/// Entries are stored in canonical order: the first `fixed_entries` entries
/// have a size known from their shape and sit at `fixed_offsets` inside the
/// data; the remaining entries are located through the offset table at the
/// start of the data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    fixed_entries: usize,
    variable_entries: usize,
    sids: Vec<Sid>,
    aids: Vec<Aid>,
    fixed_offsets: Vec<u64>,
}

impl ArrayShape {
    /// Creates an array shape, checking the entry-count invariants.
    pub fn new(
        fixed_entries: usize,
        variable_entries: usize,
        sids: Vec<Sid>,
        aids: Vec<Aid>,
        fixed_offsets: Vec<u64>,
    ) -> Result<Self, ShapeTableError> {
        let n = fixed_entries
            .checked_add(variable_entries)
            .ok_or(ShapeTableError::InvalidShape { reason: "entry count overflow" })?;
        if sids.len() != n || aids.len() != n {
            return Err(ShapeTableError::InvalidShape {
                reason: "entry arrays do not match entry count",
            });
        }
        if fixed_offsets.len() != fixed_entries + 1 {
            return Err(ShapeTableError::InvalidShape {
                reason: "fixed offset table must have fixed_entries + 1 entries",
            });
        }
        let table_size = (variable_entries as u64 + 1) * OFFSET_SIZE as u64;
        if fixed_offsets[0] != table_size {
            return Err(ShapeTableError::InvalidShape {
                reason: "fixed block must start after the variable offset table",
            });
        }
        if fixed_offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(ShapeTableError::InvalidShape {
                reason: "fixed offsets must not decrease",
            });
        }
        if aids.contains(&0) {
            return Err(ShapeTableError::InvalidShape { reason: "attribute id 0 is reserved" });
        }
        Ok(Self {
            fixed_entries,
            variable_entries,
            sids,
            aids,
            fixed_offsets,
        })
    }

    pub fn fixed_entries(&self) -> usize {
        self.fixed_entries
    }

    pub fn variable_entries(&self) -> usize {
        self.variable_entries
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.sids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sids.is_empty()
    }

    pub fn sids(&self) -> &[Sid] {
        &self.sids
    }

    pub fn aids(&self) -> &[Aid] {
        &self.aids
    }

    /// Offsets of the fixed entries, with the end of the fixed block last.
    pub fn fixed_offsets(&self) -> &[u64] {
        &self.fixed_offsets
    }

    /// Size of the data when there are no variable entries.
    fn fixed_data_size(&self) -> u64 {
        self.fixed_offsets[self.fixed_entries]
    }
}

/// Variant-specific part of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Null,
    Boolean,
    Number,
    ShortString,
    LongString,
    Array(ArrayShape),
    List,
    HomogeneousList { entry_sid: Sid },
    HomogeneousSizedList { entry_sid: Sid, entry_size: u64 },
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Null => ShapeType::Null,
            ShapeKind::Boolean => ShapeType::Boolean,
            ShapeKind::Number => ShapeType::Number,
            ShapeKind::ShortString => ShapeType::ShortString,
            ShapeKind::LongString => ShapeType::LongString,
            ShapeKind::Array(_) => ShapeType::Array,
            ShapeKind::List => ShapeType::List,
            ShapeKind::HomogeneousList { .. } => ShapeType::HomogeneousList,
            ShapeKind::HomogeneousSizedList { .. } => ShapeType::HomogeneousSizedList,
        }
    }

    /// Returns the id of this kind if it is one of the basic shapes.
    pub fn basic_sid(&self) -> Option<Sid> {
        match self {
            ShapeKind::Null => Some(SID_NULL),
            ShapeKind::Boolean => Some(SID_BOOLEAN),
            ShapeKind::Number => Some(SID_NUMBER),
            ShapeKind::ShortString => Some(SID_SHORT_STRING),
            ShapeKind::LongString => Some(SID_LONG_STRING),
            ShapeKind::List => Some(SID_LIST),
            _ => None,
        }
    }

    /// Size of the data of every value with this shape, or [`SIZE_VARIABLE`].
    pub fn data_size(&self) -> u64 {
        match self {
            ShapeKind::Null => 0,
            ShapeKind::Boolean => BOOLEAN_SIZE as u64,
            ShapeKind::Number => NUMBER_SIZE as u64,
            ShapeKind::ShortString => SHORT_STRING_SIZE as u64,
            ShapeKind::Array(array) if array.variable_entries == 0 => array.fixed_data_size(),
            ShapeKind::LongString
            | ShapeKind::Array(_)
            | ShapeKind::List
            | ShapeKind::HomogeneousList { .. }
            | ShapeKind::HomogeneousSizedList { .. } => SIZE_VARIABLE,
        }
    }

    /// Returns true if every value with this shape has the same data size.
    pub fn is_fixed_size(&self) -> bool {
        self.data_size() != SIZE_VARIABLE
    }

    /// Size of the serialized descriptor.
    pub fn total_size(&self) -> u64 {
        let extra = match self {
            ShapeKind::Array(array) => {
                2 * 8
                    + array.len() * (SID_SIZE + AID_SIZE)
                    + array.fixed_offsets.len() * OFFSET_SIZE
            }
            ShapeKind::HomogeneousList { .. } => SID_SIZE,
            ShapeKind::HomogeneousSizedList { .. } => SID_SIZE + 8,
            _ => 0,
        };
        (SHAPE_HEADER_SIZE + extra) as u64
    }

    /// SHA-256 over the descriptor without its sid.
    ///
    /// Two kinds have the same fingerprint iff they describe the same layout.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut writer = Writer::new();
        self.write_body(&mut writer);
        Sha256::digest(writer.as_bytes()).into()
    }

    fn write_body(&self, writer: &mut Writer) {
        writer.write_u64(self.shape_type() as u64);
        writer.write_u64(self.total_size());
        writer.write_u64(self.data_size());
        match self {
            ShapeKind::Array(array) => {
                writer.write_u64(array.fixed_entries as u64);
                writer.write_u64(array.variable_entries as u64);
                writer.write_u64_slice(&array.sids);
                writer.write_u64_slice(&array.aids);
                writer.write_u64_slice(&array.fixed_offsets);
            }
            ShapeKind::HomogeneousList { entry_sid } => writer.write_u64(*entry_sid),
            ShapeKind::HomogeneousSizedList {
                entry_sid,
                entry_size,
            } => {
                writer.write_u64(*entry_sid);
                writer.write_u64(*entry_size);
            }
            _ => {}
        }
    }
}

/// An interned shape: an id plus its layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    pub sid: Sid,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(sid: Sid, kind: ShapeKind) -> Self {
        Self { sid, kind }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    pub fn data_size(&self) -> u64 {
        self.kind.data_size()
    }

    pub fn total_size(&self) -> u64 {
        self.kind.total_size()
    }

    pub fn fingerprint(&self) -> [u8; 32] {
        self.kind.fingerprint()
    }

    /// Returns the object layout if this is an array shape.
    pub fn as_array(&self) -> Option<&ArrayShape> {
        match &self.kind {
            ShapeKind::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Serializes the descriptor.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_u64(self.sid);
        self.kind.write_body(&mut writer);
        writer.into_bytes()
    }

    /// Parses a descriptor written by [`Shape::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Shape, DecodeError> {
        let mut reader = Reader::new(data);
        let sid = reader.read_u64("shape sid")?;
        let code = reader.read_u64("shape type")?;
        let total_size = reader.read_u64("shape total size")?;
        let data_size = reader.read_u64("shape data size")?;

        let shape_type = u8::try_from(code)
            .ok()
            .and_then(ShapeType::from_u8)
            .ok_or(DecodeError::InvalidShape {
                reason: "unknown shape type",
            })?;
        if total_size != data.len() as u64 {
            return Err(DecodeError::LengthMismatch {
                context: "shape descriptor",
                expected: total_size,
                actual: data.len(),
            });
        }

        let kind = match shape_type {
            ShapeType::Null => ShapeKind::Null,
            ShapeType::Boolean => ShapeKind::Boolean,
            ShapeType::Number => ShapeKind::Number,
            ShapeType::ShortString => ShapeKind::ShortString,
            ShapeType::LongString => ShapeKind::LongString,
            ShapeType::List => ShapeKind::List,
            ShapeType::HomogeneousList => ShapeKind::HomogeneousList {
                entry_sid: reader.read_u64("entry sid")?,
            },
            ShapeType::HomogeneousSizedList => ShapeKind::HomogeneousSizedList {
                entry_sid: reader.read_u64("entry sid")?,
                entry_size: reader.read_u64("entry size")?,
            },
            ShapeType::Array => {
                let fixed = read_count(&mut reader, "fixed entries")?;
                let variable = read_count(&mut reader, "variable entries")?;
                let n = fixed.checked_add(variable).ok_or(DecodeError::InvalidShape {
                    reason: "entry count overflow",
                })?;
                let sids = reader.read_u64_vec(n, "entry sids")?;
                let aids = reader.read_u64_vec(n, "entry aids")?;
                let offsets = reader.read_u64_vec(fixed.saturating_add(1), "fixed offsets")?;
                let array = ArrayShape::new(fixed, variable, sids, aids, offsets).map_err(
                    |e| match e {
                        ShapeTableError::InvalidShape { reason } => {
                            DecodeError::InvalidShape { reason }
                        }
                        _ => DecodeError::InvalidShape {
                            reason: "invalid array shape",
                        },
                    },
                )?;
                ShapeKind::Array(array)
            }
        };

        if !reader.is_empty() || kind.total_size() != total_size {
            return Err(DecodeError::LengthMismatch {
                context: "shape descriptor",
                expected: kind.total_size(),
                actual: data.len(),
            });
        }
        if kind.data_size() != data_size {
            return Err(DecodeError::InvalidShape {
                reason: "data size does not match layout",
            });
        }
        Ok(Shape { sid, kind })
    }
}

fn read_count(reader: &mut Reader<'_>, context: &'static str) -> Result<usize, DecodeError> {
    let v = reader.read_u64(context)?;
    usize::try_from(v).map_err(|_| DecodeError::InvalidShape {
        reason: "entry count out of range",
    })
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.shape_type().name(), self.sid)?;
        match self.data_size() {
            SIZE_VARIABLE => write!(f, " (variable size)")?,
            size => write!(f, " (size {size})")?,
        }
        match &self.kind {
            ShapeKind::Array(array) => {
                write!(
                    f,
                    " fixed {} variable {} [",
                    array.fixed_entries, array.variable_entries
                )?;
                for (i, (sid, aid)) in array.sids.iter().zip(&array.aids).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "@{aid}:#{sid}")?;
                }
                write!(f, "]")
            }
            ShapeKind::HomogeneousList { entry_sid } => write!(f, " of #{entry_sid}"),
            ShapeKind::HomogeneousSizedList {
                entry_sid,
                entry_size,
            } => write!(f, " of #{entry_sid} x {entry_size}"),
            _ => Ok(()),
        }
    }
}
