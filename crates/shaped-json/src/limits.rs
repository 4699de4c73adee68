//! Layout constants and safety limits.
//!
//! The sizes below are part of the interchange format: changing any of them
//! changes the bytes of every shaped document.

/// Size of the element count that prefixes every list blob.
pub const LIST_LENGTH_SIZE: usize = 4;

/// Size of an offset entry (fixed-entry offsets in shapes, variable-entry
/// and list offsets in data).
pub const OFFSET_SIZE: usize = 8;

/// Size of a serialized shape identifier.
pub const SID_SIZE: usize = 8;

/// Size of a serialized attribute identifier.
pub const AID_SIZE: usize = 8;

/// Size of a boolean cell.
pub const BOOLEAN_SIZE: usize = 4;

/// Size of a number cell (IEEE 754 double).
pub const NUMBER_SIZE: usize = 8;

/// Size of the short-string length prefix.
pub const SHORT_STRING_LENGTH_SIZE: usize = 1;

/// Payload capacity of a short string, terminator included.
///
/// A string of `n` bytes is short iff `n + 1 <= SHORT_STRING_CUT`.
pub const SHORT_STRING_CUT: usize = 7;

/// Total size of a short-string cell.
pub const SHORT_STRING_SIZE: usize = SHORT_STRING_LENGTH_SIZE + SHORT_STRING_CUT;

/// Size of the long-string length prefix.
pub const LONG_STRING_LENGTH_SIZE: usize = 4;

/// Data size sentinel meaning "variable, consult the data".
pub const SIZE_VARIABLE: u64 = u64::MAX;

/// Size of the common shape descriptor header: sid, type, total size, data size.
pub const SHAPE_HEADER_SIZE: usize = 32;

/// Default maximum nesting depth for encode, decode and stringify.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Default maximum element count, when decoding, of a list whose elements
/// take no bytes (a list of nulls). Other lists are bounded by their data.
pub const MAX_EMPTY_ENTRY_LIST_LEN: usize = 1 << 20;

/// Maximum number of elements in a list (bounded by the 4-byte count).
pub const MAX_LIST_LEN: usize = u32::MAX as usize;

/// Maximum long-string content length (stored length includes the terminator).
pub const MAX_STRING_LEN: usize = u32::MAX as usize - 1;
