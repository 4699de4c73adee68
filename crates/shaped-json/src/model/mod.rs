//! Data model types for shaped JSON.
//!
//! This module contains:
//! - Values (the JSON-like tree that gets shaped)
//! - Shapes (interned layout descriptors)
//! - Documents (a shape id plus data)
//! - The shape table that interns shapes and attribute names

pub mod document;
pub mod shape;
pub mod table;
pub mod value;

pub use document::{ShapedJson, ShapedRef};
pub use shape::{
    basic_shape, Aid, ArrayShape, Shape, ShapeKind, ShapeType, Sid, BASIC_SHAPES,
    FIRST_DYNAMIC_SID, SID_BOOLEAN, SID_ILLEGAL, SID_LIST, SID_LONG_STRING, SID_NULL, SID_NUMBER,
    SID_SHORT_STRING,
};
pub use table::{MemoryShapeTable, ShapeTable};
pub use value::Value;
