//! Signing algorithms: the `None` no-op and HMAC over a selectable digest.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

/// A hash function usable both to derive a signing key and, via HMAC, to
/// produce a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Digest {
    /// Plain (non-keyed) hash, used by the `concat` and `django-concat` key
    /// derivation schemes.
    pub(crate) fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// `HMAC(key, data)` under this digest.
    pub(crate) fn hmac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha384 => {
                let mut mac = Hmac::<Sha384>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    /// The JWS `alg` name for this digest's HMAC (`HS256`, `HS384`, `HS512`).
    /// SHA-1 has no standard JWS name; the JWS serializer never offers it.
    pub(crate) const fn jws_name(self) -> Option<&'static str> {
        match self {
            Self::Sha1 => None,
            Self::Sha256 => Some("HS256"),
            Self::Sha384 => Some("HS384"),
            Self::Sha512 => Some("HS512"),
        }
    }
}

/// A signing algorithm: either no signing at all, or HMAC over a [`Digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Produces and accepts only the empty signature. Used internally by
    /// the JWS `none` algorithm; never appropriate for a `Signer` that
    /// protects real data.
    None,
    /// HMAC over the given digest.
    Hmac(Digest),
}

impl Algorithm {
    /// Computes the signature for `value` under `key`.
    pub fn sign(self, key: &[u8], value: &[u8]) -> Vec<u8> {
        match self {
            Self::None => Vec::new(),
            Self::Hmac(digest) => digest.hmac(key, value),
        }
    }

    /// Verifies `sig` against `value` under `key` in constant time.
    pub fn verify(self, key: &[u8], value: &[u8], sig: &[u8]) -> bool {
        match self {
            Self::None => sig.is_empty(),
            Self::Hmac(_) => {
                let expected = self.sign(key, value);
                constant_time_eq(&expected, sig)
            }
        }
    }

    /// The digest used for key derivation when deriving against this
    /// algorithm. `None` falls back to SHA-1, matching the fact that key
    /// derivation in the original library is independent of whether the
    /// final signature is actually produced.
    pub(crate) fn derivation_digest(self) -> Digest {
        match self {
            Self::None => Digest::Sha1,
            Self::Hmac(digest) => digest,
        }
    }

    /// The JWS `alg` header value naming this algorithm.
    pub(crate) fn jws_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hmac(digest) => digest.jws_name().unwrap_or("HS1"),
        }
    }

    /// Looks up the `Algorithm` for a JWS `alg` header value. Only the
    /// algorithms this profile supports (`HS256`, `HS384`, `HS512`, `none`).
    pub(crate) fn from_jws_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "HS256" => Some(Self::Hmac(Digest::Sha256)),
            "HS384" => Some(Self::Hmac(Digest::Sha384)),
            "HS512" => Some(Self::Hmac(Digest::Sha512)),
            _ => None,
        }
    }
}

/// Timing-safe byte comparison. Used by every signature verification in this
/// crate instead of a short-circuiting `==`.
///
/// The length check is not itself constant-time, but signature and digest
/// lengths are public (a function of the chosen algorithm), so leaking them
/// does not leak anything about the secret key or the compared value.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
