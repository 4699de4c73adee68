//! Binary shaping and unshaping.
//!
//! - [`encode`]: value to shaped document
//! - [`decode`]: shaped document to value
//! - [`stringify`]: shaped document to JSON text
//! - [`access`]: list random access, string access and member iteration

pub mod access;
pub mod cache;
pub mod canonical;
pub mod decode;
pub mod encode;
pub mod primitives;
pub mod stringify;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{
    at, at_homogeneous, at_homogeneous_sized, homogeneous_list_len, homogeneous_sized_list_len,
    iterate_array, iterate_list, list_len, string_value, ListEntry,
};
pub use cache::ShapeCache;
pub use decode::{decode, decode_with_options, DecodeOptions};
pub use encode::{
    encode, encode_existing, encode_with_options, is_system_attribute, EncodeOptions,
    SYSTEM_ATTRIBUTES,
};
pub use primitives::{Reader, Writer};
pub use stringify::{
    stringify, stringify_array_body, stringify_augmented, stringify_value,
    stringify_with_options, to_json_string,
};
