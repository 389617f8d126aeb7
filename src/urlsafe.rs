//! [`UrlSafe`]: a codec wrapper that base64-frames an inner codec's output
//! and transparently zlib-compresses it when doing so is worthwhile.
//!
//! This is modeled as a decorator over the payload-codec pipeline (per the
//! crate's design notes) rather than as a subclass of `Serializer`, so it
//! composes with both [`crate::Serializer`] and [`crate::TimedSerializer`]
//! by simply naming it as the inner codec type parameter.

use std::io::{Read, Write};
use std::marker::PhantomData;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::PayloadCodec;
use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{Error, PayloadError, Result};

const COMPRESS_FLAG: u8 = b'.';

/// Wraps `Inner` with base64 framing and opportunistic zlib compression.
#[derive(Debug, Clone, Copy)]
pub struct UrlSafe<Inner: PayloadCodec>(PhantomData<Inner>);

impl<Inner: PayloadCodec> PayloadCodec for UrlSafe<Inner> {
    const IS_TEXT: bool = true;

    fn dumps<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let raw = Inner::dumps(value)?;

        let compressed = zlib_compress(&raw)?;
        let (body, is_compressed) = if compressed.len() < raw.len().saturating_sub(1) {
            (compressed, true)
        } else {
            (raw, false)
        };

        let encoded = b64url_encode(&body);
        let mut out = Vec::with_capacity(encoded.len() + 1);
        if is_compressed {
            out.push(COMPRESS_FLAG);
        }
        out.extend_from_slice(encoded.as_bytes());
        Ok(out)
    }

    fn loads<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        if bytes.is_empty() {
            return Err(Error::bad_payload("empty payload", None));
        }

        let (encoded, is_compressed) = if bytes[0] == COMPRESS_FLAG {
            (&bytes[1..], true)
        } else {
            (bytes, false)
        };

        let raw = b64url_decode(encoded).map_err(|e| {
            Error::bad_payload("payload is not valid base64", Some(PayloadError::Base64(e)))
        })?;

        let decoded = if is_compressed { zlib_decompress(&raw)? } else { raw };

        Inner::loads(&decoded)
    }
}

fn zlib_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::bad_payload("zlib compression failed", Some(PayloadError::Zlib(e))))?;
    encoder
        .finish()
        .map_err(|e| Error::bad_payload("zlib compression failed", Some(PayloadError::Zlib(e))))
}

fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::bad_payload("zlib decompression failed", Some(PayloadError::Zlib(e))))?;
    Ok(out)
}
