//! Random access into shaped data without decoding it.
//!
//! The list accessors locate one element in O(1): heterogeneous lists read the
//! element's sid and offsets from the data, homogeneous lists take the sid from
//! the shape, and sized lists compute the range arithmetically.

use std::ops::{ControlFlow, Range};

use crate::codec::cache::ShapeCache;
use crate::codec::primitives::{range_at, u32_at, u64_at};
use crate::error::DecodeError;
use crate::limits::{
    LIST_LENGTH_SIZE, LONG_STRING_LENGTH_SIZE, MAX_EMPTY_ENTRY_LIST_LEN, OFFSET_SIZE,
    SHORT_STRING_CUT, SHORT_STRING_LENGTH_SIZE, SID_SIZE,
};
use crate::model::{ArrayShape, Shape, ShapeKind, ShapeTable, ShapeType, ShapedRef, Sid};

/// One element located inside a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry<'a> {
    /// Shape of the element.
    pub sid: Sid,
    /// Byte range of the element inside the list data.
    pub range: Range<usize>,
    /// The element data.
    pub data: &'a [u8],
}

impl<'a> ListEntry<'a> {
    pub fn as_shaped_ref(&self) -> ShapedRef<'a> {
        ShapedRef::new(self.sid, self.data)
    }
}

// =============================================================================
// LIST LAYOUT
// =============================================================================

/// Validated view of the header of a list.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ListLayout {
    Heterogeneous { len: usize },
    Homogeneous { len: usize, entry_sid: Sid },
    Sized { len: usize, entry_sid: Sid, entry_size: usize },
}

impl ListLayout {
    /// Reads the element count and checks that the tables it implies fit.
    pub(crate) fn parse(shape: &Shape, data: &[u8]) -> Result<Self, DecodeError> {
        let layout = match shape.kind {
            ShapeKind::List => ListLayout::Heterogeneous {
                len: read_len(data)?,
            },
            ShapeKind::HomogeneousList { entry_sid } => ListLayout::Homogeneous {
                len: read_len(data)?,
                entry_sid,
            },
            ShapeKind::HomogeneousSizedList {
                entry_sid,
                entry_size,
            } => {
                let len = read_len(data)?;
                let entry_size = usize::try_from(entry_size).map_err(|_| {
                    DecodeError::InvalidShape {
                        reason: "entry size out of range",
                    }
                })?;
                let expected = len
                    .checked_mul(entry_size)
                    .and_then(|n| n.checked_add(LIST_LENGTH_SIZE));
                if expected != Some(data.len()) {
                    return Err(DecodeError::LengthMismatch {
                        context: "homogeneous sized list",
                        expected: (len as u64)
                            .saturating_mul(entry_size as u64)
                            .saturating_add(LIST_LENGTH_SIZE as u64),
                        actual: data.len(),
                    });
                }
                return Ok(ListLayout::Sized {
                    len,
                    entry_sid,
                    entry_size,
                });
            }
            _ => {
                return Err(DecodeError::ShapeMismatch {
                    expected: "list",
                    found: shape.shape_type(),
                });
            }
        };

        // An empty list carries only its count
        if layout.len() > 0 {
            let end = layout
                .offsets_start()
                .checked_add((layout.len() + 1) * OFFSET_SIZE)
                .ok_or(DecodeError::UnexpectedEof {
                    context: "list offsets",
                })?;
            if end > data.len() {
                return Err(DecodeError::UnexpectedEof {
                    context: "list offsets",
                });
            }
        }
        Ok(layout)
    }

    /// Bounds the count of a list whose entries occupy no data.
    ///
    /// Every other list needs data for each counted entry, so its count is
    /// already limited by the blob length.
    pub(crate) fn check_len(&self, max: usize) -> Result<(), DecodeError> {
        match *self {
            ListLayout::Sized {
                len, entry_size: 0, ..
            } if len > max => Err(DecodeError::ListTooLong {
                context: "list of empty entries",
                len,
                max,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match *self {
            ListLayout::Heterogeneous { len }
            | ListLayout::Homogeneous { len, .. }
            | ListLayout::Sized { len, .. } => len,
        }
    }

    fn offsets_start(&self) -> usize {
        match *self {
            ListLayout::Heterogeneous { len } => LIST_LENGTH_SIZE + len * SID_SIZE,
            _ => LIST_LENGTH_SIZE,
        }
    }

    /// Locates element `index`.
    pub(crate) fn entry<'a>(&self, data: &'a [u8], index: usize) -> Result<ListEntry<'a>, DecodeError> {
        let len = self.len();
        if index >= len {
            return Err(DecodeError::IndexOutOfBounds { index, len });
        }

        let (sid, range) = match *self {
            ListLayout::Sized {
                entry_sid,
                entry_size,
                ..
            } => {
                let start = LIST_LENGTH_SIZE + index * entry_size;
                (entry_sid, start..start + entry_size)
            }
            ListLayout::Heterogeneous { .. } | ListLayout::Homogeneous { .. } => {
                let sid = match *self {
                    ListLayout::Homogeneous { entry_sid, .. } => entry_sid,
                    _ => u64_at(data, LIST_LENGTH_SIZE + index * SID_SIZE, "list sid")?,
                };
                let at = self.offsets_start() + index * OFFSET_SIZE;
                let start = u64_at(data, at, "list offset")?;
                let end = u64_at(data, at + OFFSET_SIZE, "list offset")?;
                range_at(data, start, end, "list element")?;
                // range_at checked both ends fit in usize and data
                (sid, start as usize..end as usize)
            }
        };

        let slice = data.get(range.clone()).ok_or(DecodeError::UnexpectedEof {
            context: "list element",
        })?;
        Ok(ListEntry {
            sid,
            range,
            data: slice,
        })
    }
}

fn read_len(data: &[u8]) -> Result<usize, DecodeError> {
    Ok(u32_at(data, 0, "list length")? as usize)
}

// =============================================================================
// ACCESSORS
// =============================================================================

fn expect_list(shape: &Shape, expected: ShapeType) -> Result<(), DecodeError> {
    if shape.shape_type() != expected {
        return Err(DecodeError::ShapeMismatch {
            expected: expected.name(),
            found: shape.shape_type(),
        });
    }
    Ok(())
}

/// Returns element `index` of a heterogeneous list.
pub fn at<'a>(shape: &Shape, data: &'a [u8], index: usize) -> Result<ListEntry<'a>, DecodeError> {
    expect_list(shape, ShapeType::List)?;
    ListLayout::parse(shape, data)?.entry(data, index)
}

/// Returns element `index` of a homogeneous list.
pub fn at_homogeneous<'a>(
    shape: &Shape,
    data: &'a [u8],
    index: usize,
) -> Result<ListEntry<'a>, DecodeError> {
    expect_list(shape, ShapeType::HomogeneousList)?;
    ListLayout::parse(shape, data)?.entry(data, index)
}

/// Returns element `index` of a homogeneous sized list.
pub fn at_homogeneous_sized<'a>(
    shape: &Shape,
    data: &'a [u8],
    index: usize,
) -> Result<ListEntry<'a>, DecodeError> {
    expect_list(shape, ShapeType::HomogeneousSizedList)?;
    ListLayout::parse(shape, data)?.entry(data, index)
}

/// Element count of a heterogeneous list.
pub fn list_len(shape: &Shape, data: &[u8]) -> Result<usize, DecodeError> {
    expect_list(shape, ShapeType::List)?;
    read_len(data)
}

/// Element count of a homogeneous list.
pub fn homogeneous_list_len(shape: &Shape, data: &[u8]) -> Result<usize, DecodeError> {
    expect_list(shape, ShapeType::HomogeneousList)?;
    read_len(data)
}

/// Element count of a homogeneous sized list.
pub fn homogeneous_sized_list_len(shape: &Shape, data: &[u8]) -> Result<usize, DecodeError> {
    expect_list(shape, ShapeType::HomogeneousSizedList)?;
    read_len(data)
}

// =============================================================================
// STRINGS
// =============================================================================

/// Returns the content of a short or long string, or `None` for other shapes.
pub fn string_value<'a>(shape: &Shape, data: &'a [u8]) -> Result<Option<&'a str>, DecodeError> {
    let shape_type = shape.shape_type();
    if !shape_type.is_string() {
        return Ok(None);
    }
    string_cell(shape_type, data).map(Some)
}

/// Reads a string cell. The stored length counts the terminator.
pub(crate) fn string_cell(shape_type: ShapeType, data: &[u8]) -> Result<&str, DecodeError> {
    let (context, prefix, stored, capacity) = if shape_type == ShapeType::ShortString {
        let stored = *data.first().ok_or(DecodeError::UnexpectedEof {
            context: "short string",
        })? as u64;
        ("short string", SHORT_STRING_LENGTH_SIZE, stored, SHORT_STRING_CUT as u64)
    } else {
        let stored = u32_at(data, 0, "long string")? as u64;
        let capacity = (data.len() - LONG_STRING_LENGTH_SIZE) as u64;
        ("long string", LONG_STRING_LENGTH_SIZE, stored, capacity)
    };

    if stored == 0 || stored > capacity {
        return Err(DecodeError::InvalidStringLength {
            context,
            len: stored,
        });
    }
    let bytes = data
        .get(prefix..prefix + stored as usize - 1)
        .ok_or(DecodeError::UnexpectedEof { context })?;
    std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { context })
}

// =============================================================================
// OBJECT MEMBERS
// =============================================================================

/// Returns the data of member `index` of an object.
pub(crate) fn array_member<'a>(
    array: &ArrayShape,
    data: &'a [u8],
    index: usize,
) -> Result<&'a [u8], DecodeError> {
    let fixed = array.fixed_entries();
    if index < fixed {
        let offsets = array.fixed_offsets();
        return range_at(data, offsets[index], offsets[index + 1], "fixed member");
    }
    let slot = (index - fixed) * OFFSET_SIZE;
    let start = u64_at(data, slot, "member offset")?;
    let end = u64_at(data, slot + OFFSET_SIZE, "member offset")?;
    range_at(data, start, end, "variable member")
}

/// Calls `visitor` with the name, shape and data of every object member in
/// canonical order.
///
/// Members whose attribute or shape is unknown are logged and skipped.
pub fn iterate_array<'t, T, F>(
    table: &'t T,
    shape: &Shape,
    data: &[u8],
    mut visitor: F,
) -> Result<(), DecodeError>
where
    T: ShapeTable + ?Sized,
    F: FnMut(&'t str, &'t Shape, &[u8]) -> ControlFlow<()>,
{
    let array = shape.as_array().ok_or(DecodeError::ShapeMismatch {
        expected: "array",
        found: shape.shape_type(),
    })?;
    let mut cache = ShapeCache::new();
    for (index, (&sid, &aid)) in array.sids().iter().zip(array.aids()).enumerate() {
        let member = array_member(array, data, index)?;
        let Some(name) = table.lookup_attribute_name(aid) else {
            log::warn!("cannot find attribute #{aid}");
            continue;
        };
        let Some(sub_shape) = cache.lookup(table, sid) else {
            log::warn!("cannot find shape #{sid}");
            continue;
        };
        if visitor(name, sub_shape, member).is_break() {
            break;
        }
    }
    Ok(())
}

/// Calls `visitor` with the shape and data of every list element in order.
///
/// Elements whose shape is unknown are logged and skipped. A list of empty
/// entries longer than [`MAX_EMPTY_ENTRY_LIST_LEN`] is rejected.
pub fn iterate_list<'t, T, F>(
    table: &'t T,
    shape: &Shape,
    data: &[u8],
    mut visitor: F,
) -> Result<(), DecodeError>
where
    T: ShapeTable + ?Sized,
    F: FnMut(&'t Shape, &[u8]) -> ControlFlow<()>,
{
    let layout = ListLayout::parse(shape, data)?;
    layout.check_len(MAX_EMPTY_ENTRY_LIST_LEN)?;
    let mut cache = ShapeCache::new();
    for index in 0..layout.len() {
        let entry = layout.entry(data, index)?;
        let Some(sub_shape) = cache.lookup(table, entry.sid) else {
            log::warn!("cannot find shape #{}", entry.sid);
            continue;
        };
        if visitor(sub_shape, entry.data).is_break() {
            break;
        }
    }
    Ok(())
}
