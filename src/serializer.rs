//! [`Serializer`] and [`TimedSerializer`]: pair a [`Signer`] (or
//! [`TimestampSigner`]) with a [`PayloadCodec`] so callers deal in typed
//! values instead of raw signed bytes.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;
use crate::codec::{Json, PayloadCodec};
use crate::error::Result;
use crate::signer::{KeyDerivation, Signer};
use crate::timestamp::{TimestampSigner, Unsigned};

/// Default salt for a [`Serializer`], distinct from a bare [`Signer`]'s
/// default salt so the two namespaces never collide by accident.
pub const DEFAULT_SERIALIZER_SALT: &[u8] = b"itsdangerous";

/// Overrides carried by one entry of a [`Serializer`]'s fallback signer
/// list. Any field left `None` inherits the primary signer's setting.
#[derive(Debug, Clone, Default)]
pub struct FallbackSignerSpec {
    pub salt: Option<Vec<u8>>,
    pub separator: Option<u8>,
    pub key_derivation: Option<KeyDerivation>,
    pub algorithm: Option<crate::algorithm::Algorithm>,
}

impl FallbackSignerSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = Some(salt.as_ref().to_vec());
        self
    }

    #[must_use]
    pub fn with_separator(mut self, sep: u8) -> Self {
        self.separator = Some(sep);
        self
    }

    #[must_use]
    pub fn with_key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.key_derivation = Some(key_derivation);
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: crate::algorithm::Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// The configuration a [`Serializer`] needs to build a [`Signer`] for a
/// given salt: the secret key ring plus whatever overrides its primary and
/// fallback specs carry.
#[derive(Debug, Clone)]
struct SignerTemplate {
    keys: Vec<Vec<u8>>,
    salt: Vec<u8>,
    separator: Option<u8>,
    key_derivation: Option<KeyDerivation>,
    algorithm: Option<crate::algorithm::Algorithm>,
}

impl SignerTemplate {
    fn build(&self, salt_override: Option<&[u8]>) -> Result<Signer> {
        let (newest, older) = self.keys.split_last().expect("key ring is never empty");
        let mut signer = Signer::new(newest).with_fallback_keys(older.to_vec());
        signer = signer.with_salt(salt_override.unwrap_or(&self.salt));
        if let Some(kd) = self.key_derivation {
            signer = signer.with_key_derivation(kd);
        }
        if let Some(alg) = self.algorithm {
            signer = signer.with_algorithm(alg);
        }
        if let Some(sep) = self.separator {
            signer = signer.with_separator(sep)?;
        }
        Ok(signer)
    }
}

/// Signs and verifies arbitrary `Serialize + DeserializeOwned` values,
/// using `C` (JSON by default) to turn values into bytes.
#[derive(Debug, Clone)]
pub struct Serializer<C: PayloadCodec = Json> {
    template: SignerTemplate,
    fallbacks: Vec<FallbackSignerSpec>,
    _codec: std::marker::PhantomData<C>,
}

impl<C: PayloadCodec> Serializer<C> {
    /// Creates a serializer over a single secret key, using the codec's
    /// default settings and this crate's default serializer salt.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            template: SignerTemplate {
                keys: vec![secret_key.as_ref().to_vec()],
                salt: DEFAULT_SERIALIZER_SALT.to_vec(),
                separator: None,
                key_derivation: None,
                algorithm: None,
            },
            fallbacks: Vec::new(),
            _codec: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub fn with_fallback_keys<K: AsRef<[u8]>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        let mut older: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        older.extend(self.template.keys);
        self.template.keys = older;
        self
    }

    #[must_use]
    pub fn with_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.template.salt = salt.as_ref().to_vec();
        self
    }

    #[must_use]
    pub fn with_separator(mut self, sep: u8) -> Self {
        self.template.separator = Some(sep);
        self
    }

    #[must_use]
    pub fn with_key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.template.key_derivation = Some(key_derivation);
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: crate::algorithm::Algorithm) -> Self {
        self.template.algorithm = Some(algorithm);
        self
    }

    /// Adds a fallback signer spec, tried (against every key in the ring)
    /// after the primary signer fails to verify.
    #[must_use]
    pub fn with_fallback_signer(mut self, spec: FallbackSignerSpec) -> Self {
        self.fallbacks.push(spec);
        self
    }

    pub(crate) fn dump_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        C::dumps(value)
    }

    pub(crate) fn load_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        C::loads(bytes)
    }

    fn make_signer(&self, salt: Option<&[u8]>) -> Result<Signer> {
        self.template.build(salt)
    }

    fn iter_unsigners(&self, salt: Option<&[u8]>) -> Result<Vec<Signer>> {
        let mut signers = vec![self.make_signer(salt)?];
        for spec in &self.fallbacks {
            let template = SignerTemplate {
                keys: self.template.keys.clone(),
                salt: spec.salt.clone().unwrap_or_else(|| self.template.salt.clone()),
                separator: spec.separator.or(self.template.separator),
                key_derivation: spec.key_derivation.or(self.template.key_derivation),
                algorithm: spec.algorithm.or(self.template.algorithm),
            };
            signers.push(template.build(salt)?);
        }
        Ok(signers)
    }

    /// Serializes and signs `value`.
    pub fn dumps<T: Serialize>(&self, value: &T, salt: Option<&[u8]>) -> Result<Vec<u8>> {
        let payload = Self::dump_payload(value)?;
        let signer = self.make_signer(salt)?;
        Ok(signer.sign(&payload))
    }

    /// Verifies and deserializes `data`, trying the primary signer and then
    /// every fallback signer in order. If every signer fails, re-raises the
    /// last failure.
    pub fn loads<T: DeserializeOwned>(&self, data: &[u8], salt: Option<&[u8]>) -> Result<T> {
        let mut last_err = None;
        for signer in self.iter_unsigners(salt)? {
            match signer.unsign(data) {
                Ok(payload) => return Self::load_payload(&payload),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.expect("iter_unsigners always yields at least one signer"))
    }

    /// Best-effort `loads` that never returns `Err`: a failed signature or
    /// an undecodable payload both collapse to `(false, None)`.
    pub fn loads_unsafe<T: DeserializeOwned>(&self, data: &[u8], salt: Option<&[u8]>) -> (bool, Option<T>) {
        match self.loads(data, salt) {
            Ok(value) => (true, Some(value)),
            Err(err) => match err.payload() {
                Some(payload) => match Self::load_payload::<T>(payload) {
                    Ok(value) => (false, Some(value)),
                    Err(_) => (false, None),
                },
                None => (false, None),
            },
        }
    }
}

/// As [`Serializer`], but signs with a [`TimestampSigner`] so tokens carry
/// a checkable timestamp and can expire.
#[derive(Clone)]
pub struct TimedSerializer<C: PayloadCodec = Json> {
    inner: Serializer<C>,
    clock: Option<Arc<dyn Clock>>,
}

impl<C: PayloadCodec> std::fmt::Debug for TimedSerializer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedSerializer").field("inner", &self.inner).finish()
    }
}

impl<C: PayloadCodec> TimedSerializer<C> {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            inner: Serializer::new(secret_key),
            clock: None,
        }
    }

    #[must_use]
    pub fn with_fallback_keys<K: AsRef<[u8]>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.inner = self.inner.with_fallback_keys(keys);
        self
    }

    #[must_use]
    pub fn with_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.inner = self.inner.with_salt(salt);
        self
    }

    #[must_use]
    pub fn with_separator(mut self, sep: u8) -> Self {
        self.inner = self.inner.with_separator(sep);
        self
    }

    #[must_use]
    pub fn with_key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.inner = self.inner.with_key_derivation(key_derivation);
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: crate::algorithm::Algorithm) -> Self {
        self.inner = self.inner.with_algorithm(algorithm);
        self
    }

    /// Overrides the clock used to stamp and check tokens. Tests should use
    /// this with a [`crate::clock::FixedClock`] instead of racing the real
    /// clock; the default is the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn timestamp_signer(&self, salt: Option<&[u8]>) -> Result<TimestampSigner> {
        let signer = TimestampSigner::from_signer(self.inner.make_signer(salt)?);
        Ok(match &self.clock {
            Some(clock) => signer.with_clock(Arc::clone(clock)),
            None => signer,
        })
    }

    /// Serializes, timestamps, and signs `value`.
    pub fn dumps<T: Serialize>(&self, value: &T, salt: Option<&[u8]>) -> Result<Vec<u8>> {
        let payload = Serializer::<C>::dump_payload(value)?;
        Ok(self.timestamp_signer(salt)?.sign(&payload))
    }

    /// Verifies, checks freshness against `max_age` (if given), and
    /// deserializes `data`.
    pub fn loads<T: DeserializeOwned>(&self, data: &[u8], max_age: Option<u64>, salt: Option<&[u8]>) -> Result<T> {
        let payload = self.timestamp_signer(salt)?.unsign(data, max_age)?;
        Serializer::<C>::load_payload(&payload)
    }

    /// As [`Self::loads`], but also returns the recovered signing time.
    pub fn loads_with_timestamp<T: DeserializeOwned>(
        &self,
        data: &[u8],
        max_age: Option<u64>,
        salt: Option<&[u8]>,
    ) -> Result<(T, chrono::DateTime<chrono::Utc>)> {
        let Unsigned { value, date_signed } = self.timestamp_signer(salt)?.unsign_with_timestamp(data, max_age)?;
        let value = Serializer::<C>::load_payload(&value)?;
        Ok((value, date_signed))
    }

    /// Best-effort `loads` that never returns `Err`.
    pub fn loads_unsafe<T: DeserializeOwned>(
        &self,
        data: &[u8],
        max_age: Option<u64>,
        salt: Option<&[u8]>,
    ) -> (bool, Option<T>) {
        match self.loads::<T>(data, max_age, salt) {
            Ok(value) => (true, Some(value)),
            Err(err) => match err.payload() {
                Some(payload) => match Serializer::<C>::load_payload::<T>(payload) {
                    Ok(value) => (false, Some(value)),
                    Err(_) => (false, None),
                },
                None => (false, None),
            },
        }
    }
}
