//! URL-safe base64 framing and big-endian integer encoding shared by the
//! signer, timestamp, and JWS layers.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

/// The base64url alphabet, including the padding character. A [`crate::Signer`]
/// separator must not be drawn from this set, or it could collide with
/// signature bytes and make the last-separator split ambiguous.
pub const BASE64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-=";

/// Encodes `data` as URL-safe base64 with trailing `=` padding stripped.
pub fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes URL-safe base64 that may be missing its trailing padding.
///
/// Re-pads `data` with `=` up to a multiple of 4 characters before decoding,
/// matching the framing this crate's own [`b64url_encode`] produces.
pub fn b64url_decode(data: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = data.to_vec();
    while padded.len() % 4 != 0 {
        padded.push(b'=');
    }
    URL_SAFE.decode(padded)
}

/// Encodes `n` as the minimal big-endian byte representation; `0` encodes
/// to an empty slice.
pub fn int_to_bytes(n: u64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let first_nonzero = bytes.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(idx) => bytes[idx..].to_vec(),
        None => Vec::new(),
    }
}

/// Inverse of [`int_to_bytes`]. Fails if more than 8 bytes are given, since
/// they could not have come from a `u64`.
pub fn bytes_to_int(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Some(u64::from_be_bytes(buf))
}

/// Normalizes text or raw bytes into an owned byte buffer.
pub fn want_bytes(value: impl AsRef<[u8]>) -> Vec<u8> {
    value.as_ref().to_vec()
}
