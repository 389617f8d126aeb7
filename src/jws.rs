//! [`JwsSerializer`]: produces and verifies the JSON Web Signature compact
//! form, `b64url(header).b64url(payload).b64url(sig)`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::algorithm::{Algorithm, Digest};
use crate::codec::{CompactJson, PayloadCodec};
use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{Error, PayloadError, Result};
use crate::signer::{KeyDerivation, Signer};

const SEPARATOR: u8 = b'.';

/// Signs and verifies values in JWS compact form.
///
/// Unlike [`crate::Serializer`], the inner codec is fixed to
/// [`CompactJson`] and the separator to `.`, matching the JWS spec's wire
/// format exactly.
#[derive(Debug, Clone)]
pub struct JwsSerializer {
    keys: Vec<Vec<u8>>,
    algorithm: Algorithm,
}

impl JwsSerializer {
    /// Creates a serializer that signs with `algorithm` (`HS256`, `HS384`,
    /// `HS512`, or `None` for the `alg: "none"` profile).
    ///
    /// # Errors
    ///
    /// Fails if `algorithm` is `Hmac(Sha1)`: SHA-1 has no registered JWS
    /// `alg` name, so [`Algorithm::jws_name`] would have to invent one this
    /// profile's own [`Algorithm::from_jws_name`] could never parse back.
    pub fn new(secret_key: impl AsRef<[u8]>, algorithm: Algorithm) -> Result<Self> {
        if matches!(algorithm, Algorithm::Hmac(Digest::Sha1)) {
            return Err(Error::bad_signature(
                "JWS only supports HS256, HS384, HS512, and none; SHA-1 has no registered alg name",
                None,
            ));
        }
        Ok(Self {
            keys: vec![secret_key.as_ref().to_vec()],
            algorithm,
        })
    }

    #[must_use]
    pub fn with_fallback_keys<K: AsRef<[u8]>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        let mut older: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        older.extend(self.keys);
        self.keys = older;
        self
    }

    fn signer(&self, salt: Option<&[u8]>) -> Signer {
        let (newest, older) = self.keys.split_last().expect("key ring is never empty");
        let mut signer = Signer::new(newest)
            .with_fallback_keys(older.to_vec())
            .with_separator(SEPARATOR)
            .expect("'.' is not in the base64url alphabet")
            .with_algorithm(self.algorithm);
        signer = match salt {
            Some(salt) => signer.with_salt(salt),
            // The JWS profile bypasses key derivation entirely when no
            // salt is given, rather than deriving against an empty salt.
            None => signer.with_key_derivation(KeyDerivation::None),
        };
        signer
    }

    /// Builds the JWS header: `extra` merged with `alg` forced to this
    /// serializer's algorithm name (`extra`'s own `alg`, if any, is
    /// discarded).
    fn make_header(&self, extra: Option<Map<String, Value>>) -> Map<String, Value> {
        let mut header = extra.unwrap_or_default();
        header.insert("alg".to_string(), Value::String(self.algorithm.jws_name().to_string()));
        header
    }

    /// Serializes `value` and `header_fields` (merged with the mandatory
    /// `alg`) into a signed compact-form token.
    pub fn dumps<T: Serialize>(
        &self,
        value: &T,
        salt: Option<&[u8]>,
        header_fields: Option<Map<String, Value>>,
    ) -> Result<Vec<u8>> {
        let header = self.make_header(header_fields);
        let header_json = CompactJson::dumps(&Value::Object(header))?;
        let payload_json = CompactJson::dumps(value)?;

        let header_b64 = b64url_encode(&header_json);
        let payload_b64 = b64url_encode(&payload_json);

        let mut body = Vec::with_capacity(header_b64.len() + 1 + payload_b64.len());
        body.extend_from_slice(header_b64.as_bytes());
        body.push(SEPARATOR);
        body.extend_from_slice(payload_b64.as_bytes());

        Ok(self.signer(salt).sign(&body))
    }

    /// Verifies and deserializes a compact-form token, without returning
    /// the header. See [`Self::loads_with_header`] to recover it.
    pub fn loads<T: DeserializeOwned>(&self, data: &[u8], salt: Option<&[u8]>) -> Result<T> {
        Ok(self.loads_with_header(data, salt)?.0)
    }

    /// As [`Self::loads`], but also returns the parsed header object.
    pub fn loads_with_header<T: DeserializeOwned>(
        &self,
        data: &[u8],
        salt: Option<&[u8]>,
    ) -> Result<(T, Map<String, Value>)> {
        let body = self.signer(salt).unsign(data)?;

        let sep_pos = body.iter().position(|&b| b == SEPARATOR).ok_or_else(|| Error::BadHeader {
            message: "no header separator found".to_string(),
            payload: Some(body.clone()),
            header: None,
            source: None,
        })?;
        let (header_b64, rest) = body.split_at(sep_pos);
        let payload_b64 = &rest[1..];

        let header_bytes = b64url_decode(header_b64).map_err(|e| Error::BadHeader {
            message: "header is not valid base64".to_string(),
            payload: Some(body.clone()),
            header: None,
            source: Some(PayloadError::Base64(e)),
        })?;
        let header: Value = serde_json::from_slice(&header_bytes).map_err(|e| Error::BadHeader {
            message: format!("header is not valid JSON: {e}"),
            payload: Some(body.clone()),
            header: None,
            source: Some(PayloadError::Codec(e.to_string())),
        })?;
        let Value::Object(header) = header else {
            return Err(Error::BadHeader {
                message: "header is not a JSON object".to_string(),
                payload: Some(body.clone()),
                header: Some(header),
                source: None,
            });
        };

        let alg = header.get("alg").and_then(Value::as_str).ok_or_else(|| Error::BadHeader {
            message: "header is missing 'alg'".to_string(),
            payload: Some(body.clone()),
            header: Some(Value::Object(header.clone())),
            source: None,
        })?;
        if alg != self.algorithm.jws_name() {
            return Err(Error::BadHeader {
                message: format!("algorithm mismatch: header says {alg:?}"),
                payload: Some(body.clone()),
                header: Some(Value::Object(header.clone())),
                source: None,
            });
        }

        let payload_bytes = b64url_decode(payload_b64).map_err(|e| {
            Error::bad_payload("payload is not valid base64", Some(PayloadError::Base64(e)))
        })?;
        let value = CompactJson::loads(&payload_bytes)?;
        Ok((value, header))
    }
}
