//! Shaped documents: a shape id plus the data laid out by that shape.

use crate::model::Sid;

/// An owned shaped document.
///
/// The document references its shape only by id; the shape itself lives in
/// a [`crate::ShapeTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedJson {
    pub sid: Sid,
    pub data: Vec<u8>,
}

impl ShapedJson {
    pub fn new(sid: Sid, data: Vec<u8>) -> Self {
        Self { sid, data }
    }

    /// Borrows the document.
    pub fn as_shaped_ref(&self) -> ShapedRef<'_> {
        ShapedRef {
            sid: self.sid,
            data: &self.data,
        }
    }
}

/// A borrowed shaped value, such as one element of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedRef<'a> {
    pub sid: Sid,
    pub data: &'a [u8],
}

impl<'a> ShapedRef<'a> {
    pub fn new(sid: Sid, data: &'a [u8]) -> Self {
        Self { sid, data }
    }

    /// Copies the data into an owned document.
    pub fn to_document(&self) -> ShapedJson {
        ShapedJson::new(self.sid, self.data.to_vec())
    }
}

impl<'a> From<&'a ShapedJson> for ShapedRef<'a> {
    fn from(doc: &'a ShapedJson) -> Self {
        doc.as_shaped_ref()
    }
}
