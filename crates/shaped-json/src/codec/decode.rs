//! Unshaping: rebuilding a [`Value`] from a shaped document.
//!
//! Members and elements whose shape or attribute cannot be resolved are
//! logged and left out; the rest of the document is still returned. Only the
//! root shape must be known.

use crate::codec::access::{array_member, string_cell, ListLayout};
use crate::codec::cache::ShapeCache;
use crate::codec::primitives::{u32_at, u64_at};
use crate::error::DecodeError;
use crate::limits::{MAX_EMPTY_ENTRY_LIST_LEN, MAX_NESTING_DEPTH};
use crate::model::{Aid, ArrayShape, Shape, ShapeKind, ShapeTable, ShapedRef, Sid, Value};

/// Options for decoding and stringifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum container nesting depth.
    pub max_depth: usize,
    /// Maximum element count of a list whose elements take no bytes, such
    /// as a list of nulls.
    pub max_list_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            max_list_len: MAX_EMPTY_ENTRY_LIST_LEN,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_list_len(mut self, max_list_len: usize) -> Self {
        self.max_list_len = max_list_len;
        self
    }

    /// Returns the depth of the children of a container at `depth`.
    pub(crate) fn enter(&self, depth: usize) -> Result<usize, DecodeError> {
        if depth >= self.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(depth + 1)
    }
}

/// Decodes a shaped document.
pub fn decode<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
) -> Result<Value, DecodeError> {
    decode_with_options(table, doc, &DecodeOptions::default())
}

/// Decodes a shaped document with custom options.
pub fn decode_with_options<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
    options: &DecodeOptions,
) -> Result<Value, DecodeError> {
    let doc = doc.into();
    let shape = table
        .lookup_shape_by_id(doc.sid)
        .ok_or(DecodeError::ShapeNotFound { sid: doc.sid })?;
    let decoder = Decoder {
        table,
        options: *options,
    };
    decoder.decode_shape(shape, doc.data, 0)
}

struct Decoder<'t, T: ?Sized> {
    table: &'t T,
    options: DecodeOptions,
}

impl<'t, T: ShapeTable + ?Sized> Decoder<'t, T> {
    fn decode_shape(&self, shape: &Shape, data: &[u8], depth: usize) -> Result<Value, DecodeError> {
        match &shape.kind {
            ShapeKind::Null => Ok(Value::Null),
            ShapeKind::Boolean => Ok(Value::Bool(u32_at(data, 0, "boolean")? != 0)),
            ShapeKind::Number => Ok(Value::Number(f64::from_bits(u64_at(data, 0, "number")?))),
            ShapeKind::ShortString | ShapeKind::LongString => {
                let s = string_cell(shape.shape_type(), data)?;
                Ok(Value::String(s.to_string()))
            }
            ShapeKind::Array(array) => self.decode_array(array, data, depth),
            ShapeKind::List
            | ShapeKind::HomogeneousList { .. }
            | ShapeKind::HomogeneousSizedList { .. } => self.decode_list(shape, data, depth),
        }
    }

    fn decode_array(
        &self,
        array: &ArrayShape,
        data: &[u8],
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let child_depth = self.options.enter(depth)?;
        let mut members = try_vec(array.len(), "object members")?;
        let mut cache = ShapeCache::new();

        for (index, (&sid, &aid)) in array.sids().iter().zip(array.aids()).enumerate() {
            let member = array_member(array, data, index)?;
            match self.decode_member(&mut cache, sid, aid, member, child_depth) {
                Ok(pair) => members.push(pair),
                Err(e) if e.is_recoverable() => log::warn!("skipping object member: {e}"),
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Object(members))
    }

    fn decode_member(
        &self,
        cache: &mut ShapeCache<'t>,
        sid: Sid,
        aid: Aid,
        data: &[u8],
        depth: usize,
    ) -> Result<(String, Value), DecodeError> {
        let name = self
            .table
            .lookup_attribute_name(aid)
            .ok_or(DecodeError::AttributeNotFound { aid })?;
        let shape = cache
            .lookup(self.table, sid)
            .ok_or(DecodeError::ShapeNotFound { sid })?;
        Ok((name.to_string(), self.decode_shape(shape, data, depth)?))
    }

    fn decode_list(&self, shape: &Shape, data: &[u8], depth: usize) -> Result<Value, DecodeError> {
        let child_depth = self.options.enter(depth)?;
        let layout = ListLayout::parse(shape, data)?;
        layout.check_len(self.options.max_list_len)?;
        let mut items = try_vec(layout.len(), "list elements")?;
        let mut cache = ShapeCache::new();

        for index in 0..layout.len() {
            let entry = layout.entry(data, index)?;
            let Some(sub_shape) = cache.lookup(self.table, entry.sid) else {
                let err = DecodeError::ShapeNotFound { sid: entry.sid };
                // An unknown entry shape makes the whole list unreadable
                if !matches!(layout, ListLayout::Heterogeneous { .. }) {
                    return Err(err);
                }
                log::warn!("skipping list element: {err}");
                continue;
            };
            match self.decode_shape(sub_shape, entry.data, child_depth) {
                Ok(value) => items.push(value),
                Err(e) if e.is_recoverable() => log::warn!("skipping list element: {e}"),
                Err(e) => return Err(e),
            }
        }
        Ok(Value::List(items))
    }
}

pub(crate) fn try_vec<T>(capacity: usize, context: &'static str) -> Result<Vec<T>, DecodeError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| DecodeError::AllocationFailure {
            context,
            count: capacity,
        })?;
    Ok(v)
}
