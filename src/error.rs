//! Error taxonomy for signing, timestamping, serialization, and the JWS profile.
//!
//! Rust has no class inheritance, so the catch hierarchy described by the
//! Python original (`SignatureExpired` is-a `BadTimeSignature` is-a
//! `BadSignature` is-a `BadData`; `BadPayload` is-a `BadData`; `BadHeader`
//! is-a `BadSignature`) is expressed as a flat [`Error`] enum plus a set of
//! `is_*` predicates that reproduce exactly which variants a given "catch"
//! would have caught.

use chrono::{DateTime, Utc};

/// Underlying cause of a [`Error::BadPayload`] or [`Error::BadHeader`] failure.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The payload was not valid URL-safe base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The zlib-compressed payload could not be inflated.
    #[error("zlib decompression failed: {0}")]
    Zlib(#[from] std::io::Error),
    /// The payload codec (e.g. JSON) could not decode the bytes.
    #[error("codec error: {0}")]
    Codec(String),
}

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signature did not match the value it was supposed to protect.
    ///
    /// `payload` holds the bytes that preceded the separator, if the token
    /// could be split at all -- present so a caller can inspect (but not
    /// trust) the claimed content of a forged or expired token.
    #[error("signature does not match: {message}")]
    BadSignature {
        message: String,
        payload: Option<Vec<u8>>,
    },

    /// The outer signature was fine, but the embedded timestamp segment was
    /// missing or malformed.
    #[error("bad time signature: {message}")]
    BadTimeSignature {
        message: String,
        payload: Option<Vec<u8>>,
        date_signed: Option<DateTime<Utc>>,
    },

    /// The signature and timestamp were both valid, but `now - date_signed`
    /// exceeded the caller-supplied `max_age`.
    #[error("signature expired")]
    SignatureExpired {
        payload: Option<Vec<u8>>,
        date_signed: Option<DateTime<Utc>>,
    },

    /// The JWS header was structurally invalid, or its `alg` did not match
    /// the serializer's configured algorithm. Only constructed by the
    /// `jws` module, which requires the `serde` feature.
    #[cfg(feature = "serde")]
    #[error("bad header: {message}")]
    BadHeader {
        message: String,
        payload: Option<Vec<u8>>,
        header: Option<serde_json::Value>,
        #[source]
        source: Option<PayloadError>,
    },

    /// The payload codec (JSON decode, base64 decode, zlib inflate, ...)
    /// failed.
    #[error("bad payload: {message}")]
    BadPayload {
        message: String,
        #[source]
        source: Option<PayloadError>,
    },
}

impl Error {
    /// Bytes preceding the separator in the token that failed, if any was
    /// recovered before the failure occurred.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::BadSignature { payload, .. }
            | Self::BadTimeSignature { payload, .. }
            | Self::SignatureExpired { payload, .. } => payload.as_deref(),
            #[cfg(feature = "serde")]
            Self::BadHeader { payload, .. } => payload.as_deref(),
            Self::BadPayload { .. } => None,
        }
    }

    /// The timestamp recovered from the token, if the failure happened at or
    /// after timestamp parsing.
    pub fn date_signed(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::BadTimeSignature { date_signed, .. } | Self::SignatureExpired { date_signed, .. } => {
                *date_signed
            }
            _ => None,
        }
    }

    /// `true` for every variant that a Python `except BadSignature:` would
    /// have caught: `BadSignature`, `BadTimeSignature`, `SignatureExpired`,
    /// and `BadHeader`.
    pub const fn is_bad_signature(&self) -> bool {
        match self {
            Self::BadSignature { .. } | Self::BadTimeSignature { .. } | Self::SignatureExpired { .. } => true,
            #[cfg(feature = "serde")]
            Self::BadHeader { .. } => true,
            _ => false,
        }
    }

    /// `true` for `BadTimeSignature` and its subkind `SignatureExpired`.
    pub const fn is_bad_time_signature(&self) -> bool {
        matches!(self, Self::BadTimeSignature { .. } | Self::SignatureExpired { .. })
    }

    /// `true` only for `SignatureExpired`.
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::SignatureExpired { .. })
    }

    /// `BadData` is the root of the whole hierarchy -- every variant of
    /// this enum corresponds to some `BadData` subclass, so this is always
    /// `true`. Kept as a named predicate (rather than inlined at call
    /// sites) so it reads the same way as `is_bad_signature`/`is_bad_time_signature`.
    pub const fn is_bad_data(&self) -> bool {
        true
    }

    pub(crate) fn bad_signature(message: impl Into<String>, payload: Option<Vec<u8>>) -> Self {
        Self::BadSignature {
            message: message.into(),
            payload,
        }
    }

    pub(crate) fn bad_payload(message: impl Into<String>, source: Option<PayloadError>) -> Self {
        Self::BadPayload {
            message: message.into(),
            source,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_bad_signature_covers_the_whole_subtree() {
        let sig = Error::bad_signature("nope", None);
        let time = Error::BadTimeSignature {
            message: "nope".into(),
            payload: None,
            date_signed: None,
        };
        let expired = Error::SignatureExpired {
            payload: None,
            date_signed: None,
        };
        let header = Error::BadHeader {
            message: "nope".into(),
            payload: None,
            header: None,
            source: None,
        };
        for err in [&sig, &time, &expired, &header] {
            assert!(err.is_bad_signature());
            assert!(err.is_bad_data());
        }
        assert!(!sig.is_bad_time_signature());
        assert!(time.is_bad_time_signature());
        assert!(expired.is_bad_time_signature());
        assert!(expired.is_expired());
        assert!(!time.is_expired());
    }

    #[test]
    fn bad_payload_is_not_bad_signature() {
        let err = Error::bad_payload("broken json", None);
        assert!(!err.is_bad_signature());
        assert!(err.is_bad_data());
    }

    #[test]
    fn is_bad_data_holds_for_every_variant_since_it_is_the_root_of_the_hierarchy() {
        assert!(Error::bad_signature("nope", None).is_bad_data());
        assert!(Error::BadTimeSignature {
            message: "nope".into(),
            payload: None,
            date_signed: None,
        }
        .is_bad_data());
        assert!(Error::SignatureExpired {
            payload: None,
            date_signed: None,
        }
        .is_bad_data());
    }

    #[test]
    fn payload_accessor_returns_the_forensic_bytes() {
        let err = Error::bad_signature("nope", Some(b"value".to_vec()));
        assert_eq!(err.payload(), Some(b"value".as_slice()));
    }
}
