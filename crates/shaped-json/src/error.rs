//! Error types for shaping, unshaping and the shape table.

use thiserror::Error;

use crate::model::{Aid, ShapeType, Sid};

/// Error classes shared by every error in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A buffer or container could not be allocated.
    AllocationFailure,
    /// A shape id is unknown to the shape table.
    ShapeNotFound,
    /// An attribute id or name is unknown to the shape table.
    AttributeNotFound,
    /// Malformed blob or caller contract violation.
    InvalidInput,
    /// A list position past the element count.
    IndexOutOfBounds,
}

impl ErrorCode {
    /// Returns the short code string (e.g., "SHAPE").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::AllocationFailure => "ALLOC",
            ErrorCode::ShapeNotFound => "SHAPE",
            ErrorCode::AttributeNotFound => "ATTR",
            ErrorCode::InvalidInput => "INPUT",
            ErrorCode::IndexOutOfBounds => "INDEX",
        }
    }

    /// Returns true for staleness conditions that decoding recovers from by
    /// skipping the affected member.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::ShapeNotFound | ErrorCode::AttributeNotFound)
    }
}

/// Error raised by a [`crate::ShapeTable`] implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeTableError {
    #[error("[ALLOC] {kind} id space exhausted")]
    IdSpaceExhausted { kind: &'static str },

    #[error("[INPUT] attribute name is empty")]
    EmptyAttributeName,

    #[error("[INPUT] attribute name length {len} exceeds maximum {max}")]
    AttributeNameTooLong { len: usize, max: usize },

    #[error("[INPUT] invalid shape: {reason}")]
    InvalidShape { reason: &'static str },
}

impl ShapeTableError {
    /// Returns the error class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ShapeTableError::IdSpaceExhausted { .. } => ErrorCode::AllocationFailure,
            _ => ErrorCode::InvalidInput,
        }
    }
}

/// Error during shaping (value to blob).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("[ALLOC] cannot allocate {bytes} bytes for {context}")]
    AllocationFailure { context: &'static str, bytes: usize },

    #[error("[SHAPE] shape of type {shape_type:?} is not known and creation is disabled")]
    ShapeNotFound { shape_type: ShapeType },

    #[error("[ATTR] attribute {name:?} is not known and creation is disabled")]
    AttributeNotFound { name: String },

    #[error("[INPUT] attribute name is empty")]
    EmptyAttributeName,

    #[error("[INPUT] duplicate attribute {name:?}")]
    DuplicateAttribute { name: String },

    #[error("[INPUT] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[INPUT] nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error(transparent)]
    Table(#[from] ShapeTableError),
}

impl EncodeError {
    /// Returns the error class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodeError::AllocationFailure { .. } => ErrorCode::AllocationFailure,
            EncodeError::Table(e) => e.code(),
            EncodeError::ShapeNotFound { .. } => ErrorCode::ShapeNotFound,
            EncodeError::AttributeNotFound { .. } => ErrorCode::AttributeNotFound,
            _ => ErrorCode::InvalidInput,
        }
    }
}

/// Error during unshaping (blob to value or text) and list access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("[ALLOC] cannot allocate {count} entries for {context}")]
    AllocationFailure { context: &'static str, count: usize },

    #[error("[SHAPE] cannot find shape #{sid}")]
    ShapeNotFound { sid: Sid },

    #[error("[ATTR] cannot find attribute #{aid}")]
    AttributeNotFound { aid: Aid },

    #[error("[INPUT] unexpected end of data while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[INPUT] {context} offset {offset} outside data of length {len}")]
    InvalidOffset {
        context: &'static str,
        offset: u64,
        len: usize,
    },

    #[error("[INPUT] {context} expects {expected} bytes, found {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: u64,
        actual: usize,
    },

    #[error("[INPUT] invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("[INPUT] invalid stored length {len} in {context}")]
    InvalidStringLength { context: &'static str, len: u64 },

    #[error("[INPUT] expected {expected} shape, found {found:?}")]
    ShapeMismatch {
        expected: &'static str,
        found: ShapeType,
    },

    #[error("[INPUT] invalid shape descriptor: {reason}")]
    InvalidShape { reason: &'static str },

    #[error("[INPUT] {context} of {len} entries exceeds maximum {max}")]
    ListTooLong {
        context: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[INDEX] position {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("[INPUT] nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },
}

impl DecodeError {
    /// Returns the error class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::AllocationFailure { .. } => ErrorCode::AllocationFailure,
            DecodeError::ShapeNotFound { .. } => ErrorCode::ShapeNotFound,
            DecodeError::AttributeNotFound { .. } => ErrorCode::AttributeNotFound,
            DecodeError::IndexOutOfBounds { .. } => ErrorCode::IndexOutOfBounds,
            _ => ErrorCode::InvalidInput,
        }
    }

    /// Returns true if the member that raised this error may be skipped.
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(DecodeError::ShapeNotFound { sid: 9 }.code(), ErrorCode::ShapeNotFound);
        assert_eq!(
            DecodeError::UnexpectedEof { context: "x" }.code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(EncodeError::EmptyAttributeName.code(), ErrorCode::InvalidInput);
        assert_eq!(ErrorCode::ShapeNotFound.code(), "SHAPE");
    }

    #[test]
    fn test_recoverable() {
        assert!(DecodeError::AttributeNotFound { aid: 3 }.is_recoverable());
        assert!(!DecodeError::DepthExceeded { max: 1 }.is_recoverable());
        assert!(!ErrorCode::IndexOutOfBounds.is_recoverable());
    }

    #[test]
    fn test_display_prefix() {
        let err = DecodeError::ShapeNotFound { sid: 42 };
        assert_eq!(err.to_string(), "[SHAPE] cannot find shape #42");
    }

    #[test]
    fn test_table_error_prefix_matches_code() {
        let exhausted = EncodeError::from(ShapeTableError::IdSpaceExhausted { kind: "shape" });
        assert_eq!(exhausted.code(), ErrorCode::AllocationFailure);
        assert_eq!(exhausted.to_string(), "[ALLOC] shape id space exhausted");

        let empty = EncodeError::from(ShapeTableError::EmptyAttributeName);
        assert_eq!(empty.code(), ErrorCode::InvalidInput);
        assert_eq!(empty.to_string(), "[INPUT] attribute name is empty");

        for err in [
            ShapeTableError::IdSpaceExhausted { kind: "attribute" },
            ShapeTableError::AttributeNameTooLong { len: 9, max: 8 },
            ShapeTableError::InvalidShape { reason: "x" },
        ] {
            let prefix = format!("[{}]", err.code().code());
            assert!(err.to_string().starts_with(&prefix), "{err}");
        }
    }
}
