//! The decode-from-bytes capability required of resource payload types.

use serde::de::DeserializeOwned;

/// A payload type a `Resource` can produce from a response body.
///
/// Returning `None` marks the body as invalid for this type; the client then
/// reports `ResourceError::PayloadInvalid`.
pub trait Decodable: Sized {
    fn decode(bytes: &[u8]) -> Option<Self>;
}

/// Strict serde decoding into a concrete type.
///
/// Use `Resource<Typed<MyDto>>` when the response schema is known and a
/// mismatch should fail the request instead of degrading to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed<T>(pub T);

impl<T> Typed<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> Decodable for Typed<T> {
    fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok().map(Typed)
    }
}

impl Decodable for String {
    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }
}

impl Decodable for Vec<u8> {
    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }
}
