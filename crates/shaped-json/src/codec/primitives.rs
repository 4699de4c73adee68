//! Fixed-width primitive encoding/decoding for shaped data.
//!
//! All integers and doubles are little-endian. Every read is bounds-checked
//! and reports [`DecodeError`] instead of reading past the end of a blob.

use crate::error::{DecodeError, EncodeError};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding shaped data sequentially.
///
/// Wraps a byte slice and provides methods for reading fixed-width
/// primitives with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let bytes = slice(self.data, self.pos, n, context)?;
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(context)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let bytes = self.read_array::<8>(context)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a little-endian f64. NaN and infinities are passed through.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        let bytes = self.read_array::<8>(context)?;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads `count` consecutive u64 values.
    pub fn read_u64_vec(
        &mut self,
        count: usize,
        context: &'static str,
    ) -> Result<Vec<u64>, DecodeError> {
        // Check the whole run first so a hostile count cannot drive allocation
        let needed = count
            .checked_mul(8)
            .ok_or(DecodeError::UnexpectedEof { context })?;
        if needed > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let mut values = Vec::new();
        values
            .try_reserve_exact(count)
            .map_err(|_| DecodeError::AllocationFailure { context, count })?;
        for _ in 0..count {
            values.push(self.read_u64(context)?);
        }
        Ok(values)
    }

    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// Returns `data[start..start + len]`, or an error if the range is out of bounds.
#[inline]
pub fn slice<'a>(
    data: &'a [u8],
    start: usize,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::UnexpectedEof { context })?;
    data.get(start..end)
        .ok_or(DecodeError::UnexpectedEof { context })
}

/// Reads a little-endian u32 at a byte offset.
#[inline]
pub fn u32_at(data: &[u8], offset: usize, context: &'static str) -> Result<u32, DecodeError> {
    let bytes = slice(data, offset, 4, context)?;
    let mut out = [0u8; 4];
    out.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(out))
}

/// Reads a little-endian u64 at a byte offset.
#[inline]
pub fn u64_at(data: &[u8], offset: usize, context: &'static str) -> Result<u64, DecodeError> {
    let bytes = slice(data, offset, 8, context)?;
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(out))
}

/// Resolves a stored `[start, end)` offset pair into a sub-slice of `data`.
///
/// Offsets come from untrusted data, so both ends and their order are checked.
pub fn range_at<'a>(
    data: &'a [u8],
    start: u64,
    end: u64,
    context: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let len = data.len();
    let to_index = |offset: u64| -> Result<usize, DecodeError> {
        usize::try_from(offset)
            .ok()
            .filter(|o| *o <= len)
            .ok_or(DecodeError::InvalidOffset { context, offset, len })
    };
    let s = to_index(start)?;
    let e = to_index(end)?;
    if s > e {
        return Err(DecodeError::InvalidOffset {
            context,
            offset: start,
            len,
        });
    }
    Ok(&data[s..e])
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding shaped data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with exactly `capacity` bytes reserved.
    ///
    /// Reports allocation failure instead of aborting.
    pub fn try_with_capacity(capacity: usize, context: &'static str) -> Result<Self, EncodeError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| EncodeError::AllocationFailure {
                context,
                bytes: capacity,
            })?;
        Ok(Self { buf })
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `n` zero bytes.
    #[inline]
    pub fn write_zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    /// Writes a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a run of u64 values.
    pub fn write_u64_slice(&mut self, values: &[u64]) {
        for v in values {
            self.write_u64(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_roundtrip() {
        let mut writer = Writer::new();
        writer.write_byte(7);
        writer.write_u32(0xDEAD_BEEF);
        writer.write_u64(u64::MAX - 1);
        writer.write_f64(-2.5);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_byte("b").unwrap(), 7);
        assert_eq!(reader.read_u32("u32").unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u64("u64").unwrap(), u64::MAX - 1);
        assert_eq!(reader.read_f64("f64").unwrap(), -2.5);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_little_endian() {
        let mut writer = Writer::new();
        writer.write_u32(1);
        assert_eq!(writer.as_bytes(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_u64("test"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        // A failed read does not advance
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_u64_vec_rejects_huge_count() {
        let data = [0u8; 16];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_u64_vec(usize::MAX, "offsets"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        assert_eq!(reader.read_u64_vec(2, "offsets").unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_random_access() {
        let mut writer = Writer::new();
        writer.write_u32(3);
        writer.write_u64(42);
        let data = writer.as_bytes();
        assert_eq!(u32_at(data, 0, "n").unwrap(), 3);
        assert_eq!(u64_at(data, 4, "x").unwrap(), 42);
        assert!(u64_at(data, 5, "x").is_err());
        assert!(slice(data, usize::MAX, 2, "overflow").is_err());
    }

    #[test]
    fn test_range_at() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(range_at(&data, 1, 3, "r").unwrap(), &[2, 3]);
        assert_eq!(range_at(&data, 4, 4, "r").unwrap(), &[] as &[u8]);
        assert!(matches!(
            range_at(&data, 3, 1, "r"),
            Err(DecodeError::InvalidOffset { .. })
        ));
        assert!(matches!(
            range_at(&data, 0, 9, "r"),
            Err(DecodeError::InvalidOffset { offset: 9, .. })
        ));
    }

    #[test]
    fn test_write_zeros() {
        let mut writer = Writer::try_with_capacity(4, "test").unwrap();
        writer.write_byte(1);
        writer.write_zeros(3);
        assert_eq!(writer.into_bytes(), vec![1, 0, 0, 0]);
    }
}
