//! Writing shaped documents directly as JSON text.
//!
//! No intermediate [`Value`] tree is built. When a member is skipped because
//! its shape or attribute is unknown, the text written for it is rolled back so
//! the output stays valid JSON.

use std::fmt::Write;

use crate::codec::access::{array_member, string_cell, ListLayout};
use crate::codec::cache::ShapeCache;
use crate::codec::decode::DecodeOptions;
use crate::codec::primitives::{u32_at, u64_at};
use crate::error::DecodeError;
use crate::model::{Aid, ArrayShape, Shape, ShapeKind, ShapeTable, ShapedRef, Sid, Value};

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Appends the JSON text of a shaped document to `out`.
///
/// On error nothing is appended.
pub fn stringify<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
    out: &mut String,
) -> Result<(), DecodeError> {
    stringify_with_options(table, doc, &DecodeOptions::default(), out)
}

/// Appends the JSON text of a shaped document to `out`, with custom options.
pub fn stringify_with_options<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
    options: &DecodeOptions,
    out: &mut String,
) -> Result<(), DecodeError> {
    let doc = doc.into();
    let shape = root_shape(table, doc.sid)?;
    let mark = out.len();
    let result = Stringifier::new(table, options).write_shape(shape, doc.data, 0, out);
    if result.is_err() {
        out.truncate(mark);
    }
    result
}

/// Returns the JSON text of a shaped document.
pub fn to_json_string<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
) -> Result<String, DecodeError> {
    let mut out = String::new();
    stringify(table, doc, &mut out)?;
    Ok(out)
}

/// Appends the members of an object document without the surrounding braces.
///
/// With `prepend` set, a `,` is written before the first member so the output
/// can follow members written by the caller. Returns the number of members
/// written.
pub fn stringify_array_body<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
    prepend: bool,
    out: &mut String,
) -> Result<usize, DecodeError> {
    let doc = doc.into();
    let shape = root_shape(table, doc.sid)?;
    let array = shape.as_array().ok_or(DecodeError::ShapeMismatch {
        expected: "array",
        found: shape.shape_type(),
    })?;
    let options = DecodeOptions::default();
    let mark = out.len();
    let result = Stringifier::new(table, &options).write_members(array, doc.data, 0, prepend, out);
    if result.is_err() {
        out.truncate(mark);
    }
    result
}

/// Like [`stringify`], but appends the members of `augment` to an object
/// document.
///
/// If the document is not an object or `augment` is not an object, this is
/// plain [`stringify`].
pub fn stringify_augmented<'d, T: ShapeTable + ?Sized>(
    table: &T,
    doc: impl Into<ShapedRef<'d>>,
    augment: &Value,
    out: &mut String,
) -> Result<(), DecodeError> {
    let doc = doc.into();
    let shape = root_shape(table, doc.sid)?;
    let (Some(_), Value::Object(extra)) = (shape.as_array(), augment) else {
        return stringify(table, doc, out);
    };

    let mark = out.len();
    out.push('{');
    let written = match stringify_array_body(table, doc, false, out) {
        Ok(written) => written,
        Err(e) => {
            out.truncate(mark);
            return Err(e);
        }
    };
    for (i, (name, value)) in extra.iter().enumerate() {
        if written > 0 || i > 0 {
            out.push(',');
        }
        write_string(name, out);
        out.push(':');
        stringify_value(value, out);
    }
    out.push('}');
    Ok(())
}

/// Appends the JSON text of a value tree, using the same number and string
/// formatting as [`stringify`].
pub fn stringify_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => write_bool(*b, out),
        Value::Number(n) => write_number(*n, out),
        Value::String(s) => write_string(s, out),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                stringify_value(item, out);
            }
            out.push(']');
        }
        Value::Object(members) => {
            out.push('{');
            for (i, (name, v)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out);
                out.push(':');
                stringify_value(v, out);
            }
            out.push('}');
        }
    }
}

fn root_shape<T: ShapeTable + ?Sized>(table: &T, sid: Sid) -> Result<&Shape, DecodeError> {
    table
        .lookup_shape_by_id(sid)
        .ok_or(DecodeError::ShapeNotFound { sid })
}

// =============================================================================
// STRINGIFIER
// =============================================================================

struct Stringifier<'t, T: ?Sized> {
    table: &'t T,
    options: DecodeOptions,
}

impl<'t, T: ShapeTable + ?Sized> Stringifier<'t, T> {
    fn new(table: &'t T, options: &DecodeOptions) -> Self {
        Self {
            table,
            options: *options,
        }
    }

    fn write_shape(
        &self,
        shape: &Shape,
        data: &[u8],
        depth: usize,
        out: &mut String,
    ) -> Result<(), DecodeError> {
        match &shape.kind {
            ShapeKind::Null => out.push_str("null"),
            ShapeKind::Boolean => write_bool(u32_at(data, 0, "boolean")? != 0, out),
            ShapeKind::Number => write_number(f64::from_bits(u64_at(data, 0, "number")?), out),
            ShapeKind::ShortString | ShapeKind::LongString => {
                write_string(string_cell(shape.shape_type(), data)?, out)
            }
            ShapeKind::Array(array) => {
                out.push('{');
                self.write_members(array, data, depth, false, out)?;
                out.push('}');
            }
            ShapeKind::List
            | ShapeKind::HomogeneousList { .. }
            | ShapeKind::HomogeneousSizedList { .. } => {
                out.push('[');
                self.write_elements(shape, data, depth, out)?;
                out.push(']');
            }
        }
        Ok(())
    }

    fn write_members(
        &self,
        array: &ArrayShape,
        data: &[u8],
        depth: usize,
        leading_comma: bool,
        out: &mut String,
    ) -> Result<usize, DecodeError> {
        let child_depth = self.options.enter(depth)?;
        let mut cache = ShapeCache::new();
        let mut written = 0;

        for (index, (&sid, &aid)) in array.sids().iter().zip(array.aids()).enumerate() {
            let member = array_member(array, data, index)?;
            let mark = out.len();
            if written > 0 || leading_comma {
                out.push(',');
            }
            match self.write_member(&mut cache, sid, aid, member, child_depth, out) {
                Ok(()) => written += 1,
                Err(e) if e.is_recoverable() => {
                    log::warn!("skipping object member: {e}");
                    out.truncate(mark);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn write_member(
        &self,
        cache: &mut ShapeCache<'t>,
        sid: Sid,
        aid: Aid,
        data: &[u8],
        depth: usize,
        out: &mut String,
    ) -> Result<(), DecodeError> {
        let name = self
            .table
            .lookup_attribute_name(aid)
            .ok_or(DecodeError::AttributeNotFound { aid })?;
        let shape = cache
            .lookup(self.table, sid)
            .ok_or(DecodeError::ShapeNotFound { sid })?;
        write_string(name, out);
        out.push(':');
        self.write_shape(shape, data, depth, out)
    }

    fn write_elements(
        &self,
        shape: &Shape,
        data: &[u8],
        depth: usize,
        out: &mut String,
    ) -> Result<(), DecodeError> {
        let child_depth = self.options.enter(depth)?;
        let layout = ListLayout::parse(shape, data)?;
        layout.check_len(self.options.max_list_len)?;
        let mut cache = ShapeCache::new();
        let mut written = 0usize;

        for index in 0..layout.len() {
            let entry = layout.entry(data, index)?;
            let Some(sub_shape) = cache.lookup(self.table, entry.sid) else {
                let err = DecodeError::ShapeNotFound { sid: entry.sid };
                if !matches!(layout, ListLayout::Heterogeneous { .. }) {
                    return Err(err);
                }
                log::warn!("skipping list element: {err}");
                continue;
            };

            let mark = out.len();
            if written > 0 {
                out.push(',');
            }
            match self.write_shape(sub_shape, entry.data, child_depth, out) {
                Ok(()) => written += 1,
                Err(e) if e.is_recoverable() => {
                    log::warn!("skipping list element: {e}");
                    out.truncate(mark);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

// =============================================================================
// TOKENS
// =============================================================================

fn write_bool(b: bool, out: &mut String) {
    out.push_str(if b { "true" } else { "false" });
}

/// NaN and infinities have no JSON form and are written as `null`.
fn write_number(n: f64, out: &mut String) {
    if !n.is_finite() {
        out.push_str("null");
        return;
    }
    let abs = n.abs();
    // Writing to a String cannot fail
    let _ = if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        write!(out, "{n:e}")
    } else {
        write!(out, "{n}")
    };
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
