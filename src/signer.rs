//! [`Signer`]: signs and verifies byte strings with HMAC (or no-op)
//! signatures, salted key derivation, and key rotation.

use crate::algorithm::{constant_time_eq, Algorithm, Digest};
use crate::encoding::{b64url_decode, b64url_encode, BASE64_ALPHABET};
use crate::error::{Error, Result};

/// Default separator placed between the signed value and its signature.
pub const DEFAULT_SEPARATOR: u8 = b'.';

/// Default salt for a bare [`Signer`].
pub const DEFAULT_SIGNER_SALT: &[u8] = b"itsdangerous.Signer";

/// How the signing key is derived from `(salt, secret)`.
///
/// `DjangoConcat` is the default, matching the upstream library's history:
/// it predates `hmac` derivation and is kept as the default for
/// wire-compatibility with tokens signed by older deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyDerivation {
    /// `H(salt ++ secret)`.
    Concat,
    /// `H(salt ++ b"signer" ++ secret)`.
    #[default]
    DjangoConcat,
    /// `HMAC_H(secret, salt)`.
    Hmac,
    /// The secret key, unmodified.
    None,
}

impl KeyDerivation {
    fn derive(self, digest: Digest, salt: &[u8], secret: &[u8]) -> Vec<u8> {
        match self {
            Self::Concat => {
                let mut buf = Vec::with_capacity(salt.len() + secret.len());
                buf.extend_from_slice(salt);
                buf.extend_from_slice(secret);
                digest.hash(&buf)
            }
            Self::DjangoConcat => {
                let mut buf = Vec::with_capacity(salt.len() + 6 + secret.len());
                buf.extend_from_slice(salt);
                buf.extend_from_slice(b"signer");
                buf.extend_from_slice(secret);
                digest.hash(&buf)
            }
            Self::Hmac => digest.hmac(secret, salt),
            Self::None => secret.to_vec(),
        }
    }
}

/// Signs and verifies byte strings with a keyed signature.
///
/// Holds a non-empty, ordered list of secret keys (oldest to newest); the
/// newest (last) key is used for signing, and every key is tried when
/// verifying, so a rotation can drop old keys once no unverified tokens
/// depend on them.
#[derive(Debug, Clone)]
pub struct Signer {
    keys: Vec<Vec<u8>>,
    salt: Vec<u8>,
    sep: u8,
    key_derivation: KeyDerivation,
    algorithm: Algorithm,
}

impl Signer {
    /// Creates a signer with a single secret key and the library defaults:
    /// salt `itsdangerous.Signer`, separator `.`, `django-concat` key
    /// derivation, and HMAC-SHA1 signing.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        let key_derivation = KeyDerivation::default();
        let algorithm = Algorithm::Hmac(Digest::Sha1);
        tracing::debug!(?key_derivation, ?algorithm, "signer constructed");
        Self {
            keys: vec![secret_key.as_ref().to_vec()],
            salt: DEFAULT_SIGNER_SALT.to_vec(),
            sep: DEFAULT_SEPARATOR,
            key_derivation,
            algorithm,
        }
    }

    /// Adds older keys, oldest first, ahead of the key this signer was
    /// constructed with. Verification tries every key; only the signer's
    /// own (newest) key is ever used to produce a new signature.
    #[must_use]
    pub fn with_fallback_keys<K: AsRef<[u8]>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        let mut older: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        older.extend(self.keys);
        self.keys = older;
        self
    }

    /// Sets the salt used to namespace this signer's signatures.
    #[must_use]
    pub fn with_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = salt.as_ref().to_vec();
        self
    }

    /// Sets the key derivation scheme.
    #[must_use]
    pub fn with_key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        tracing::debug!(?key_derivation, "signer key derivation overridden");
        self.key_derivation = key_derivation;
        self
    }

    /// Sets the signing algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        tracing::debug!(?algorithm, "signer algorithm overridden");
        self.algorithm = algorithm;
        self
    }

    /// Changes the separator byte between value and signature.
    ///
    /// # Errors
    ///
    /// Fails if `sep` is in the base64url alphabet (`A-Za-z0-9_-=`), since
    /// it could then be confused with signature bytes when splitting a
    /// token on its last occurrence.
    pub fn with_separator(mut self, sep: u8) -> Result<Self> {
        if BASE64_ALPHABET.contains(&sep) {
            return Err(Error::bad_signature(
                format!(
                    "separator {:?} may appear inside the signature itself; \
                     ASCII letters, digits, and '-_=' must not be used",
                    sep as char
                ),
                None,
            ));
        }
        self.sep = sep;
        Ok(self)
    }

    pub(crate) fn sep(&self) -> u8 {
        self.sep
    }

    pub(crate) fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    fn derive_key(&self, secret_key: &[u8]) -> Vec<u8> {
        self.key_derivation
            .derive(self.algorithm.derivation_digest(), &self.salt, secret_key)
    }

    fn signature_for(&self, value: &[u8], secret_key: &[u8]) -> Vec<u8> {
        let key = self.derive_key(secret_key);
        self.algorithm.sign(&key, value)
    }

    /// Computes the base64url-encoded signature for `value` using the
    /// newest (signing) key.
    pub fn get_signature(&self, value: &[u8]) -> String {
        let key = self.keys.last().expect("Signer always has at least one key");
        b64url_encode(&self.signature_for(value, key))
    }

    /// Signs `value`, returning `value ++ sep ++ b64url(sig)`.
    pub fn sign(&self, value: &[u8]) -> Vec<u8> {
        let sig = self.get_signature(value);
        let mut out = Vec::with_capacity(value.len() + 1 + sig.len());
        out.extend_from_slice(value);
        out.push(self.sep);
        out.extend_from_slice(sig.as_bytes());
        out
    }

    /// Verifies `sig_b64` against `value`, trying every key newest-first.
    pub fn verify_signature(&self, value: &[u8], sig_b64: &[u8]) -> bool {
        let Ok(sig) = b64url_decode(sig_b64) else {
            return false;
        };
        self.keys.iter().rev().any(|key| {
            let expected = self.signature_for(value, key);
            constant_time_eq(&expected, &sig)
        })
    }

    /// Splits a signed token on its last separator and verifies the
    /// signature, returning the original value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadSignature`] if the separator is missing or no
    /// key in the ring verifies the signature.
    pub fn unsign(&self, signed_value: &[u8]) -> Result<Vec<u8>> {
        let sep_pos = signed_value
            .iter()
            .rposition(|&b| b == self.sep)
            .ok_or_else(|| Error::bad_signature(format!("no {:?} found in value", self.sep as char), None))?;
        let (value, rest) = signed_value.split_at(sep_pos);
        let sig = &rest[1..];

        if self.verify_signature(value, sig) {
            return Ok(value.to_vec());
        }

        tracing::warn!(sep = %(self.sep as char), "signature verification failed");
        Err(Error::bad_signature(
            "signature does not match",
            Some(value.to_vec()),
        ))
    }

    /// `true` if `signed_value` unsigns successfully.
    pub fn validate(&self, signed_value: &[u8]) -> bool {
        self.unsign(signed_value).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_unsign_roundtrip() {
        let signer = Signer::new(b"secret-key");
        let signed = signer.sign(b"my string");
        assert_eq!(signer.unsign(&signed).unwrap(), b"my string");
    }

    #[test]
    fn matches_the_documented_wire_format() {
        let signer = Signer::new(b"secret-key").with_salt(b"itsdangerous.Signer".as_slice());
        let signed = signer.sign(b"my string");
        let signed_str = String::from_utf8(signed).unwrap();
        let (value, sig) = signed_str.rsplit_once('.').unwrap();
        assert_eq!(value, "my string");
        assert_eq!(sig.len(), 27); // 20-byte SHA-1 HMAC, base64 no-pad
    }

    #[test]
    fn tampered_value_fails() {
        let signer = Signer::new(b"secret-key");
        let mut signed = signer.sign(b"hello");
        let last = signed.len() - 1;
        signed[0] = b'H';
        assert!(signer.unsign(&signed).is_err());
        signed[last] ^= 1;
        assert!(signer.unsign(&signed).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let signer1 = Signer::new(b"key1");
        let signer2 = Signer::new(b"key2");
        let signed = signer1.sign(b"hello");
        assert!(signer2.unsign(&signed).is_err());
    }

    #[test]
    fn no_separator_fails() {
        let signer = Signer::new(b"secret-key");
        assert!(signer.unsign(b"no-separator-here").is_err());
    }

    #[test]
    fn custom_separator_must_not_be_in_base64_alphabet() {
        assert!(Signer::new(b"k").with_separator(b'-').is_err());
        assert!(Signer::new(b"k").with_separator(b'|').is_ok());
    }

    #[test]
    fn custom_separator_roundtrips() {
        let signer = Signer::new(b"k").with_separator(b'|').unwrap();
        let signed = signer.sign(b"hello");
        assert!(signed.contains(&b'|'));
        assert_eq!(signer.unsign(&signed).unwrap(), b"hello");
    }

    #[test]
    fn different_salts_do_not_verify_each_other() {
        let signer1 = Signer::new(b"key").with_salt(b"A".as_slice());
        let signer2 = Signer::new(b"key").with_salt(b"B".as_slice());
        let signed = signer1.sign(b"hello");
        assert!(signer2.unsign(&signed).is_err());
    }

    #[test]
    fn fallback_keys_allow_rotation() {
        let old_signer = Signer::new(b"old-key");
        let signed = old_signer.sign(b"hello");

        let new_signer = Signer::new(b"new-key").with_fallback_keys([b"old-key".as_slice()]);
        assert_eq!(new_signer.unsign(&signed).unwrap(), b"hello");

        // And the new signer signs with its own (newest) key.
        let resigned = new_signer.sign(b"hello");
        assert!(old_signer.unsign(&resigned).is_err());
    }

    #[test]
    fn value_containing_the_separator_byte_roundtrips() {
        let signer = Signer::new(b"secret-key");
        let signed = signer.sign(b"a.b.c");
        assert_eq!(signer.unsign(&signed).unwrap(), b"a.b.c");
    }

    #[test]
    fn validate_swallows_the_error() {
        let signer = Signer::new(b"secret-key");
        assert!(!signer.validate(b"garbage"));
        assert!(signer.validate(&signer.sign(b"ok")));
    }

    #[test]
    fn key_derivation_schemes_produce_different_signatures() {
        let base = Signer::new(b"key");
        let concat = base.clone().with_key_derivation(KeyDerivation::Concat);
        let django = base.clone().with_key_derivation(KeyDerivation::DjangoConcat);
        let hmac = base.clone().with_key_derivation(KeyDerivation::Hmac);
        let none = base.clone().with_key_derivation(KeyDerivation::None);

        let sigs: Vec<_> = [concat, django, hmac, none]
            .iter()
            .map(|s| s.get_signature(b"value"))
            .collect();
        for i in 0..sigs.len() {
            for j in (i + 1)..sigs.len() {
                assert_ne!(sigs[i], sigs[j], "derivation schemes {i} and {j} collided");
            }
        }
    }

    #[test]
    fn none_algorithm_produces_a_bare_separator_token() {
        let signer = Signer::new(b"key").with_algorithm(Algorithm::None);
        let signed = signer.sign(b"hello");
        assert_eq!(signed, b"hello.".to_vec());
        assert_eq!(signer.unsign(&signed).unwrap(), b"hello");
    }
}
