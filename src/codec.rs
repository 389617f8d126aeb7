//! Payload codecs: the capability a [`crate::Serializer`] uses to turn an
//! arbitrary value into bytes and back.
//!
//! A codec is a zero-sized marker type implementing [`PayloadCodec`], not a
//! value, so `Serializer<C>` picks its wire format at the type level with no
//! runtime dispatch.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, PayloadError, Result};

/// The capability a [`crate::Serializer`] needs from its payload format:
/// serialize a value to bytes, and parse bytes back into a value.
pub trait PayloadCodec {
    /// Whether this codec's `dumps` output is guaranteed to be valid UTF-8
    /// text. Both codecs in this crate are (JSON always is), but the flag
    /// is part of the trait so a binary codec (e.g. CBOR) could opt out.
    const IS_TEXT: bool;

    /// Serializes `value`.
    fn dumps<T: Serialize>(value: &T) -> Result<Vec<u8>>;

    /// Deserializes a value previously produced by [`Self::dumps`].
    fn loads<T: DeserializeOwned>(bytes: &[u8]) -> Result<T>;
}

/// The default payload codec: JSON via `serde_json`.
#[derive(Debug, Clone, Copy)]
pub struct Json;

impl PayloadCodec for Json {
    const IS_TEXT: bool = true;

    fn dumps<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| {
            Error::bad_payload(
                format!("failed to serialize payload: {e}"),
                Some(PayloadError::Codec(e.to_string())),
            )
        })
    }

    fn loads<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            Error::bad_payload(
                format!("failed to deserialize payload: {e}"),
                Some(PayloadError::Codec(e.to_string())),
            )
        })
    }
}

/// JSON with no incidental whitespace.
///
/// `serde_json`'s default formatter is already whitespace-free, so this
/// produces byte-identical output to [`Json`] today. It is kept as its own
/// type because the URL-safe and JWS wire formats are specified in terms of
/// a *compact* JSON codec, and a future change to `Json` (e.g. adding a
/// pretty-printing option) must not silently change those wire formats.
#[derive(Debug, Clone, Copy)]
pub struct CompactJson;

impl PayloadCodec for CompactJson {
    const IS_TEXT: bool = true;

    fn dumps<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        Json::dumps(value)
    }

    fn loads<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Json::loads(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_roundtrips() {
        let value = json!({"a": "dictionary", "n": 1});
        let bytes = Json::dumps(&value).unwrap();
        let back: serde_json::Value = Json::loads(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn compact_json_has_no_incidental_whitespace() {
        let value = json!({"a": 1, "b": 2});
        let bytes = CompactJson::dumps(&value).unwrap();
        assert_eq!(bytes, br#"{"a":1,"b":2}"#.to_vec());
    }

    #[test]
    fn invalid_json_is_bad_payload() {
        let err = Json::loads::<serde_json::Value>(b"{not json").unwrap_err();
        assert!(err.is_bad_data());
    }
}
