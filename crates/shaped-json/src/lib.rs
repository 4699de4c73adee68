//! Shaped JSON: structure-sharing binary encoding for JSON-like documents.
//!
//! A document is split into a *shape*, which describes its layout, and the
//! *data* laid out by that shape. Shapes are interned in a [`ShapeTable`], so
//! documents with the same structure share one shape and their data carries no
//! key names or type tags.
//!
//! # Quick Start
//!
//! ```rust
//! use shaped_json::{decode, encode, to_json_string, MemoryShapeTable, Value};
//!
//! let mut table = MemoryShapeTable::new();
//! let value = Value::object([
//!     ("name", Value::from("Alice")),
//!     ("age", Value::from(42)),
//! ]);
//!
//! let doc = encode(&mut table, &value).unwrap();
//!
//! // A second document with the same structure reuses the shape
//! let other = Value::object([("age", Value::from(7)), ("name", Value::from("Bob"))]);
//! assert_eq!(encode(&mut table, &other).unwrap().sid, doc.sid);
//!
//! let decoded = decode(&table, &doc).unwrap();
//! assert_eq!(decoded.get("name"), Some(&Value::from("Alice")));
//!
//! // Object members come back in canonical order
//! assert_eq!(to_json_string(&table, &doc).unwrap(), r#"{"age":42,"name":"Alice"}"#);
//! ```
//!
//! # Modules
//!
//! - [`model`]: values, shapes, documents and the shape table
//! - [`codec`]: encoding, decoding, stringifying and list access
//! - [`error`]: error types
//! - [`limits`]: layout constants and safety limits
//!
//! # Layout
//!
//! All integers are little-endian. Lists start with a 4-byte element count;
//! offsets, shape ids and attribute ids are 8 bytes. Object shapes store the
//! offsets of fixed-size members, and object data starts with the offsets of
//! variable-size members.
//!
//! # Robustness
//!
//! Decoding treats data as untrusted. Every read is bounds-checked, nesting is
//! limited, and members whose shape or attribute is unknown to the table are
//! skipped with a `log` warning instead of failing the whole document.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{
    at, at_homogeneous, at_homogeneous_sized, decode, decode_with_options, encode,
    encode_existing, encode_with_options, is_system_attribute, iterate_array, iterate_list,
    stringify, stringify_array_body, stringify_augmented, stringify_value, stringify_with_options,
    to_json_string, DecodeOptions, EncodeOptions, ListEntry,
};
pub use error::{DecodeError, EncodeError, ErrorCode, ShapeTableError};
pub use model::{
    Aid, ArrayShape, MemoryShapeTable, Shape, ShapeKind, ShapeTable, ShapeType, ShapedJson,
    ShapedRef, Sid, Value,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
