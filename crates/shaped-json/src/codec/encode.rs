//! Shaping: converting a [`Value`] into a shape id plus data.
//!
//! Scalars and heterogeneous lists use the basic shapes. Objects and
//! homogeneous lists are interned in the shape table, which deduplicates
//! structurally identical shapes across documents.

use std::fmt;

use crate::codec::canonical::{self, CanonicalKey};
use crate::codec::primitives::Writer;
use crate::error::EncodeError;
use crate::limits::{
    BOOLEAN_SIZE, LIST_LENGTH_SIZE, LONG_STRING_LENGTH_SIZE, MAX_LIST_LEN, MAX_NESTING_DEPTH,
    MAX_STRING_LEN, NUMBER_SIZE, OFFSET_SIZE, SHORT_STRING_CUT, SHORT_STRING_SIZE, SID_SIZE,
};
use crate::model::{
    Aid, ArrayShape, ShapeKind, ShapeTable, ShapeType, ShapedJson, Sid, Value, SID_BOOLEAN,
    SID_LIST, SID_LONG_STRING, SID_NULL, SID_NUMBER, SID_SHORT_STRING,
};

/// Top-level keys that a document store typically manages itself.
pub const SYSTEM_ATTRIBUTES: [&str; 5] = ["_key", "_rev", "_id", "_from", "_to"];

/// Returns true for the system attribute names in [`SYSTEM_ATTRIBUTES`].
///
/// Pass this as the reserved key filter to keep those keys out of shapes.
pub fn is_system_attribute(name: &str) -> bool {
    SYSTEM_ATTRIBUTES.contains(&name)
}

/// Options for shaping.
#[derive(Clone, Copy)]
pub struct EncodeOptions<'a> {
    /// Whether unseen shapes and attribute names may be interned.
    ///
    /// When false the table is never mutated and an unseen shape or name
    /// fails the call.
    pub create_if_missing: bool,
    /// Top-level keys for which this returns true are left out.
    pub reserved_key_filter: Option<&'a dyn Fn(&str) -> bool>,
    /// Maximum container nesting depth.
    pub max_depth: usize,
}

impl Default for EncodeOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EncodeOptions<'a> {
    /// Creates default options (interning enabled, no filter).
    pub fn new() -> Self {
        Self {
            create_if_missing: true,
            reserved_key_filter: None,
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Creates options that never mutate the shape table.
    pub fn read_only() -> Self {
        Self {
            create_if_missing: false,
            ..Self::new()
        }
    }

    /// Sets the top-level reserved key filter.
    pub fn with_reserved_key_filter(mut self, filter: &'a dyn Fn(&str) -> bool) -> Self {
        self.reserved_key_filter = Some(filter);
        self
    }

    /// Sets the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl fmt::Debug for EncodeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("create_if_missing", &self.create_if_missing)
            .field("reserved_key_filter", &self.reserved_key_filter.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Shapes a value, interning new shapes and attribute names as needed.
pub fn encode<T: ShapeTable + ?Sized>(
    table: &mut T,
    value: &Value,
) -> Result<ShapedJson, EncodeError> {
    encode_with_options(table, value, &EncodeOptions::default())
}

/// Shapes a value with custom options.
pub fn encode_with_options<T: ShapeTable + ?Sized>(
    table: &mut T,
    value: &Value,
    options: &EncodeOptions<'_>,
) -> Result<ShapedJson, EncodeError> {
    let access = if options.create_if_missing {
        TableAccess::ReadWrite(table)
    } else {
        TableAccess::ReadOnly(&*table)
    };
    run(access, value, options)
}

/// Shapes a value against a shared table, using only existing shapes and
/// attribute names. `options.create_if_missing` is ignored.
pub fn encode_existing<T: ShapeTable + ?Sized>(
    table: &T,
    value: &Value,
    options: &EncodeOptions<'_>,
) -> Result<ShapedJson, EncodeError> {
    run(TableAccess::ReadOnly(table), value, options)
}

fn run<T: ShapeTable + ?Sized>(
    table: TableAccess<'_, T>,
    value: &Value,
    options: &EncodeOptions<'_>,
) -> Result<ShapedJson, EncodeError> {
    let mut encoder = Encoder {
        table,
        filter: options.reserved_key_filter,
        max_depth: options.max_depth,
    };
    let shaped = encoder.encode_value(value, 0)?;
    Ok(ShapedJson::new(shaped.sid, shaped.data))
}

// =============================================================================
// ENCODER
// =============================================================================

enum TableAccess<'t, T: ?Sized> {
    ReadOnly(&'t T),
    ReadWrite(&'t mut T),
}

impl<T: ShapeTable + ?Sized> TableAccess<'_, T> {
    fn attribute(&mut self, name: &str) -> Result<Aid, EncodeError> {
        match self {
            TableAccess::ReadOnly(table) => {
                table
                    .find_attribute(name)
                    .ok_or_else(|| EncodeError::AttributeNotFound {
                        name: name.to_string(),
                    })
            }
            TableAccess::ReadWrite(table) => Ok(table.find_or_create_attribute(name)?),
        }
    }

    fn shape(&mut self, kind: ShapeKind) -> Result<Sid, EncodeError> {
        match self {
            TableAccess::ReadOnly(table) => {
                let shape_type = kind.shape_type();
                table
                    .find_shape(&kind)
                    .map(|shape| shape.sid)
                    .ok_or(EncodeError::ShapeNotFound { shape_type })
            }
            TableAccess::ReadWrite(table) => Ok(table.find_or_create_shape(kind)?.sid),
        }
    }
}

/// One shaped value before it is folded into its parent.
struct ShapeValue {
    sid: Sid,
    shape_type: ShapeType,
    fixed: bool,
    data: Vec<u8>,
}

impl ShapeValue {
    fn fixed(sid: Sid, shape_type: ShapeType, data: Vec<u8>) -> Self {
        Self {
            sid,
            shape_type,
            fixed: true,
            data,
        }
    }

    fn variable(sid: Sid, shape_type: ShapeType, data: Vec<u8>) -> Self {
        Self {
            sid,
            shape_type,
            fixed: false,
            data,
        }
    }
}

struct Member<'v> {
    name: &'v str,
    key: CanonicalKey,
    value: ShapeValue,
}

struct Encoder<'a, 't, T: ?Sized> {
    table: TableAccess<'t, T>,
    filter: Option<&'a dyn Fn(&str) -> bool>,
    max_depth: usize,
}

// Layout work stays out of the recursive methods to keep their frames small.
impl<T: ShapeTable + ?Sized> Encoder<'_, '_, T> {
    fn encode_value(&mut self, value: &Value, depth: usize) -> Result<ShapeValue, EncodeError> {
        match value {
            Value::Null => Ok(ShapeValue::fixed(SID_NULL, ShapeType::Null, Vec::new())),
            Value::Bool(b) => encode_bool(*b),
            Value::Number(n) => encode_number(*n),
            Value::String(s) => encode_string(s),
            Value::List(items) => self.encode_list(items, depth),
            Value::Object(members) => self.encode_object(members, depth),
        }
    }

    /// Returns the depth of the children of a container at `depth`.
    fn enter(&self, depth: usize) -> Result<usize, EncodeError> {
        if depth >= self.max_depth {
            return Err(EncodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(depth + 1)
    }

    fn encode_list(&mut self, items: &[Value], depth: usize) -> Result<ShapeValue, EncodeError> {
        let child_depth = self.enter(depth)?;
        if items.len() > MAX_LIST_LEN {
            return Err(EncodeError::LengthExceedsLimit {
                field: "list",
                len: items.len(),
                max: MAX_LIST_LEN,
            });
        }
        if items.is_empty() {
            return encode_empty_list();
        }

        let mut children: Vec<ShapeValue> = try_vec(items.len(), "list elements")?;
        for item in items {
            children.push(self.encode_value(item, child_depth)?);
        }
        self.finish_list(children)
    }

    #[inline(never)]
    fn finish_list(&mut self, children: Vec<ShapeValue>) -> Result<ShapeValue, EncodeError> {
        let n = children.len();
        let entry_sid = children[0].sid;
        let entry_size = children[0].data.len();
        let homogeneous = children.iter().all(|c| c.sid == entry_sid);
        let sized = homogeneous && children.iter().all(|c| c.data.len() == entry_size);
        let payload = total(children.iter().map(|c| c.data.len()))?;

        if sized {
            let sid = self.table.shape(ShapeKind::HomogeneousSizedList {
                entry_sid,
                entry_size: entry_size as u64,
            })?;
            let size = total([LIST_LENGTH_SIZE, payload])?;
            let mut writer = Writer::try_with_capacity(size, "homogeneous sized list")?;
            writer.write_u32(n as u32);
            for child in &children {
                writer.write_bytes(&child.data);
            }
            return Ok(ShapeValue::variable(
                sid,
                ShapeType::HomogeneousSizedList,
                writer.into_bytes(),
            ));
        }

        let offsets_size = (n + 1) * OFFSET_SIZE;
        let (sid, shape_type, header) = if homogeneous {
            let sid = self.table.shape(ShapeKind::HomogeneousList { entry_sid })?;
            (sid, ShapeType::HomogeneousList, LIST_LENGTH_SIZE + offsets_size)
        } else {
            (
                SID_LIST,
                ShapeType::List,
                LIST_LENGTH_SIZE + n * SID_SIZE + offsets_size,
            )
        };

        let size = total([header, payload])?;
        let mut writer = Writer::try_with_capacity(size, "list")?;
        writer.write_u32(n as u32);
        if !homogeneous {
            for child in &children {
                writer.write_u64(child.sid);
            }
        }
        let mut offset = header as u64;
        for child in &children {
            writer.write_u64(offset);
            offset += child.data.len() as u64;
        }
        writer.write_u64(offset);
        for child in &children {
            writer.write_bytes(&child.data);
        }
        Ok(ShapeValue::variable(sid, shape_type, writer.into_bytes()))
    }

    fn encode_object<'v>(
        &mut self,
        members: &'v [(String, Value)],
        depth: usize,
    ) -> Result<ShapeValue, EncodeError> {
        let child_depth = self.enter(depth)?;
        let top_level = depth == 0;

        let mut entries: Vec<Member<'v>> = try_vec(members.len(), "object members")?;
        for (name, value) in members {
            if top_level && self.filter.is_some_and(|reserved| reserved(name.as_str())) {
                continue;
            }
            if name.is_empty() {
                return Err(EncodeError::EmptyAttributeName);
            }
            let aid = self.table.attribute(name)?;
            let value = self.encode_value(value, child_depth)?;
            entries.push(Member {
                name: name.as_str(),
                key: CanonicalKey::new(value.fixed, value.shape_type, aid),
                value,
            });
        }
        self.finish_object(entries)
    }

    #[inline(never)]
    fn finish_object(&mut self, mut entries: Vec<Member<'_>>) -> Result<ShapeValue, EncodeError> {
        check_duplicates(&entries)?;
        entries.sort_unstable_by(|a, b| canonical::compare(&a.key, &b.key));

        let n = entries.len();
        let fixed = entries.iter().take_while(|m| m.value.fixed).count();
        let variable = n - fixed;
        let table_size = (variable + 1) * OFFSET_SIZE;
        let payload = total(entries.iter().map(|m| m.value.data.len()))?;
        let size = total([table_size, payload])?;

        let mut sids = try_vec(n, "member sids")?;
        let mut aids = try_vec(n, "member aids")?;
        let mut fixed_offsets = try_vec(fixed + 1, "fixed offsets")?;
        for member in &entries {
            sids.push(member.value.sid);
            aids.push(member.key.aid);
        }

        // Fixed offsets go into the shape, variable offsets into the data
        let mut offset = table_size as u64;
        for member in &entries[..fixed] {
            fixed_offsets.push(offset);
            offset += member.value.data.len() as u64;
        }
        fixed_offsets.push(offset);

        let mut writer = Writer::try_with_capacity(size, "object")?;
        for member in &entries[fixed..] {
            writer.write_u64(offset);
            offset += member.value.data.len() as u64;
        }
        writer.write_u64(offset);
        for member in &entries {
            writer.write_bytes(&member.value.data);
        }

        let array = ArrayShape::new(fixed, variable, sids, aids, fixed_offsets)?;
        let sid = self.table.shape(ShapeKind::Array(array))?;
        Ok(ShapeValue {
            sid,
            shape_type: ShapeType::Array,
            fixed: variable == 0,
            data: writer.into_bytes(),
        })
    }
}

fn encode_bool(b: bool) -> Result<ShapeValue, EncodeError> {
    let mut writer = Writer::try_with_capacity(BOOLEAN_SIZE, "boolean")?;
    writer.write_u32(u32::from(b));
    Ok(ShapeValue::fixed(SID_BOOLEAN, ShapeType::Boolean, writer.into_bytes()))
}

fn encode_number(n: f64) -> Result<ShapeValue, EncodeError> {
    let mut writer = Writer::try_with_capacity(NUMBER_SIZE, "number")?;
    writer.write_f64(n);
    Ok(ShapeValue::fixed(SID_NUMBER, ShapeType::Number, writer.into_bytes()))
}

fn encode_empty_list() -> Result<ShapeValue, EncodeError> {
    let mut writer = Writer::try_with_capacity(LIST_LENGTH_SIZE, "empty list")?;
    writer.write_u32(0);
    Ok(ShapeValue::variable(SID_LIST, ShapeType::List, writer.into_bytes()))
}

fn encode_string(s: &str) -> Result<ShapeValue, EncodeError> {
    let len = s.len();
    if len < SHORT_STRING_CUT {
        let mut writer = Writer::try_with_capacity(SHORT_STRING_SIZE, "short string")?;
        writer.write_byte((len + 1) as u8);
        writer.write_bytes(s.as_bytes());
        // terminator plus padding
        writer.write_zeros(SHORT_STRING_CUT - len);
        return Ok(ShapeValue::fixed(
            SID_SHORT_STRING,
            ShapeType::ShortString,
            writer.into_bytes(),
        ));
    }

    if len > MAX_STRING_LEN {
        return Err(EncodeError::LengthExceedsLimit {
            field: "string",
            len,
            max: MAX_STRING_LEN,
        });
    }
    let size = total([LONG_STRING_LENGTH_SIZE, len, 1])?;
    let mut writer = Writer::try_with_capacity(size, "long string")?;
    writer.write_u32((len + 1) as u32);
    writer.write_bytes(s.as_bytes());
    writer.write_byte(0);
    Ok(ShapeValue::variable(
        SID_LONG_STRING,
        ShapeType::LongString,
        writer.into_bytes(),
    ))
}

fn check_duplicates(entries: &[Member<'_>]) -> Result<(), EncodeError> {
    let mut aids: Vec<(Aid, &str)> = try_vec(entries.len(), "duplicate check")?;
    aids.extend(entries.iter().map(|m| (m.key.aid, m.name)));
    aids.sort_unstable_by_key(|(aid, _)| *aid);
    match aids.windows(2).find(|w| w[0].0 == w[1].0) {
        Some(w) => Err(EncodeError::DuplicateAttribute {
            name: w[0].1.to_string(),
        }),
        None => Ok(()),
    }
}

fn try_vec<T>(capacity: usize, context: &'static str) -> Result<Vec<T>, EncodeError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| EncodeError::AllocationFailure {
            context,
            bytes: capacity.saturating_mul(size_of::<T>()),
        })?;
    Ok(v)
}

fn total(parts: impl IntoIterator<Item = usize>) -> Result<usize, EncodeError> {
    parts
        .into_iter()
        .try_fold(0usize, |acc, part| acc.checked_add(part))
        .ok_or(EncodeError::AllocationFailure {
            context: "data size",
            bytes: usize::MAX,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemoryShapeTable, FIRST_DYNAMIC_SID};

    fn obj(members: &[(&str, Value)]) -> Value {
        Value::object(members.iter().map(|(k, v)| (*k, v.clone())))
    }

    #[test]
    fn test_scalars_use_basic_shapes() {
        let mut table = MemoryShapeTable::new();
        let null = encode(&mut table, &Value::Null).unwrap();
        assert_eq!((null.sid, null.data.len()), (SID_NULL, 0));

        let b = encode(&mut table, &Value::Bool(true)).unwrap();
        assert_eq!(b.sid, SID_BOOLEAN);
        assert_eq!(b.data, vec![1, 0, 0, 0]);

        let n = encode(&mut table, &Value::Number(1.5)).unwrap();
        assert_eq!(n.sid, SID_NUMBER);
        assert_eq!(n.data, 1.5f64.to_le_bytes().to_vec());

        assert_eq!(table.len_shapes(), 0);
    }

    #[test]
    fn test_short_string_boundary() {
        let mut table = MemoryShapeTable::new();
        let abc = encode(&mut table, &Value::from("abc")).unwrap();
        assert_eq!(abc.sid, SID_SHORT_STRING);
        assert_eq!(abc.data, vec![4, b'a', b'b', b'c', 0, 0, 0, 0]);

        let six = encode(&mut table, &Value::from("abcdef")).unwrap();
        assert_eq!(six.sid, SID_SHORT_STRING);
        assert_eq!(six.data, vec![7, b'a', b'b', b'c', b'd', b'e', b'f', 0]);

        let seven = encode(&mut table, &Value::from("abcdefg")).unwrap();
        assert_eq!(seven.sid, SID_LONG_STRING);
        assert_eq!(&seven.data[..4], &8u32.to_le_bytes());
        assert_eq!(&seven.data[4..], b"abcdefg\0");

        let empty = encode(&mut table, &Value::from("")).unwrap();
        assert_eq!(empty.data, vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_list() {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &Value::List(vec![])).unwrap();
        assert_eq!(doc.sid, SID_LIST);
        assert_eq!(doc.data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_homogeneous_sized_list() {
        let mut table = MemoryShapeTable::new();
        let list = Value::List(vec![1.into(), 2.into(), 3.into()]);
        let doc = encode(&mut table, &list).unwrap();
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        assert_eq!(
            shape.kind,
            ShapeKind::HomogeneousSizedList {
                entry_sid: SID_NUMBER,
                entry_size: 8
            }
        );
        assert_eq!(doc.data.len(), 4 + 3 * 8);
        assert_eq!(&doc.data[..4], &3u32.to_le_bytes());
        assert_eq!(&doc.data[12..20], &2.0f64.to_le_bytes());
    }

    #[test]
    fn test_heterogeneous_list() {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &Value::List(vec![1.into(), "a".into()])).unwrap();
        assert_eq!(doc.sid, SID_LIST);
        // count, two sids, three offsets, two 8-byte payloads
        assert_eq!(doc.data.len(), 4 + 16 + 24 + 16);
        assert_eq!(&doc.data[4..12], &SID_NUMBER.to_le_bytes());
        assert_eq!(&doc.data[12..20], &SID_SHORT_STRING.to_le_bytes());
        assert_eq!(&doc.data[20..28], &44u64.to_le_bytes());
        assert_eq!(&doc.data[28..36], &52u64.to_le_bytes());
        assert_eq!(&doc.data[36..44], &60u64.to_le_bytes());
    }

    #[test]
    fn test_short_and_long_strings_are_heterogeneous() {
        let mut table = MemoryShapeTable::new();
        let list = Value::List(vec![
            "short".into(),
            "a-very-long-string-that-exceeds-the-short-string-capacity".into(),
        ]);
        assert_eq!(encode(&mut table, &list).unwrap().sid, SID_LIST);
    }

    #[test]
    fn test_homogeneous_list() {
        let mut table = MemoryShapeTable::new();
        let list = Value::List(vec!["longer one".into(), "long string two".into()]);
        let doc = encode(&mut table, &list).unwrap();
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        assert_eq!(
            shape.kind,
            ShapeKind::HomogeneousList {
                entry_sid: SID_LONG_STRING
            }
        );
        // offsets start after the count and three offsets
        assert_eq!(&doc.data[4..12], &28u64.to_le_bytes());
    }

    #[test]
    fn test_empty_object_is_fixed() {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &Value::Object(vec![])).unwrap();
        assert_eq!(doc.sid, FIRST_DYNAMIC_SID);
        assert_eq!(doc.data, 8u64.to_le_bytes().to_vec());
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        assert_eq!(shape.data_size(), 8);
    }

    #[test]
    fn test_object_layout() {
        let mut table = MemoryShapeTable::new();
        let value = obj(&[("b", "a long string value".into()), ("a", 1.into())]);
        let doc = encode(&mut table, &value).unwrap();
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        let array = shape.as_array().unwrap();

        let aid_a = table.find_attribute("a").unwrap();
        let aid_b = table.find_attribute("b").unwrap();
        assert_eq!(array.fixed_entries(), 1);
        assert_eq!(array.variable_entries(), 1);
        assert_eq!(array.aids(), &[aid_a, aid_b]);
        assert_eq!(array.sids(), &[SID_NUMBER, SID_LONG_STRING]);
        assert_eq!(array.fixed_offsets(), &[16, 24]);

        let string_len = 4 + "a long string value".len() as u64 + 1;
        assert_eq!(&doc.data[0..8], &24u64.to_le_bytes());
        assert_eq!(&doc.data[8..16], &(24 + string_len).to_le_bytes());
        assert_eq!(&doc.data[16..24], &1.0f64.to_le_bytes());
        assert_eq!(doc.data.len() as u64, 24 + string_len);
    }

    #[test]
    fn test_key_order_does_not_change_shape() {
        let mut table = MemoryShapeTable::new();
        let a = obj(&[("x", 1.into()), ("y", "text".into()), ("z", Value::Null)]);
        let b = obj(&[("z", Value::Null), ("x", 99.into()), ("y", "other".into())]);
        let doc_a = encode(&mut table, &a).unwrap();
        let doc_b = encode(&mut table, &b).unwrap();
        assert_eq!(doc_a.sid, doc_b.sid);
        assert_eq!(table.len_shapes(), 1);
    }

    #[test]
    fn test_invalid_keys() {
        let mut table = MemoryShapeTable::new();
        assert_eq!(
            encode(&mut table, &obj(&[("", 1.into())])),
            Err(EncodeError::EmptyAttributeName)
        );
        let dup = obj(&[("a", 1.into()), ("a", "x".into())]);
        assert_eq!(
            encode(&mut table, &dup),
            Err(EncodeError::DuplicateAttribute { name: "a".into() })
        );
    }

    #[test]
    fn test_read_only() {
        let mut table = MemoryShapeTable::new();
        let value = obj(&[("a", 1.into())]);
        assert_eq!(
            encode_with_options(&mut table, &value, &EncodeOptions::read_only()),
            Err(EncodeError::AttributeNotFound { name: "a".into() })
        );

        table.find_or_create_attribute("a").unwrap();
        assert!(matches!(
            encode_existing(&table, &value, &EncodeOptions::new()),
            Err(EncodeError::ShapeNotFound {
                shape_type: ShapeType::Array
            })
        ));
        assert_eq!(table.len_shapes(), 0);

        let created = encode(&mut table, &value).unwrap();
        let existing = encode_existing(&table, &value, &EncodeOptions::new()).unwrap();
        assert_eq!(created, existing);

        // scalars need no table entry at all
        assert!(encode_existing(&table, &Value::from("abc"), &EncodeOptions::new()).is_ok());
    }

    #[test]
    fn test_reserved_key_filter_top_level_only() {
        let mut table = MemoryShapeTable::new();
        let value = obj(&[
            ("_key", "k1".into()),
            ("name", "n".into()),
            ("inner", obj(&[("_key", "k2".into())])),
        ]);
        let options = EncodeOptions::new().with_reserved_key_filter(&is_system_attribute);
        let doc = encode_with_options(&mut table, &value, &options).unwrap();
        let array = table.lookup_shape_by_id(doc.sid).unwrap().as_array().unwrap().clone();
        assert_eq!(array.len(), 2);
        // _key is interned only for the nested object
        let aid = table.find_attribute("_key").unwrap();
        assert!(!array.aids().contains(&aid));
    }

    #[test]
    fn test_depth_limit() {
        let mut table = MemoryShapeTable::new();
        let options = EncodeOptions::new().with_max_depth(2);
        let two = Value::List(vec![Value::List(vec![1.into()])]);
        let three = Value::List(vec![two.clone()]);
        assert!(encode_with_options(&mut table, &two, &options).is_ok());
        assert_eq!(
            encode_with_options(&mut table, &three, &options),
            Err(EncodeError::DepthExceeded { max: 2 })
        );
    }

    #[test]
    fn test_deepest_allowed_nesting() {
        let mut value = Value::Null;
        for _ in 0..MAX_NESTING_DEPTH {
            value = Value::List(vec![value]);
        }
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &value).unwrap();
        assert_eq!(table.len_shapes(), MAX_NESTING_DEPTH);
        assert_eq!(doc.data, 1u32.to_le_bytes().to_vec().repeat(MAX_NESTING_DEPTH));

        let too_deep = Value::List(vec![value]);
        assert_eq!(
            encode(&mut table, &too_deep),
            Err(EncodeError::DepthExceeded {
                max: MAX_NESTING_DEPTH
            })
        );
    }

    #[test]
    fn test_system_attributes() {
        assert!(is_system_attribute("_key"));
        assert!(is_system_attribute("_to"));
        assert!(!is_system_attribute("_other"));
    }
}
