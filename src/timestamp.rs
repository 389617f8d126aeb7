//! [`TimestampSigner`]: a [`Signer`] that binds a timestamp into the signed
//! value so tokens can be checked for freshness.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::clock::{default_clock, Clock};
use crate::encoding::{b64url_decode, b64url_encode, bytes_to_int, int_to_bytes};
use crate::error::{Error, Result};
use crate::signer::Signer;

/// Seconds between the Unix epoch and this library's epoch,
/// `2011-01-01T00:00:00Z`. Timestamps are encoded relative to this value so
/// they fit in fewer bytes than a raw Unix timestamp would.
pub const EPOCH: u64 = 1_293_840_000;

/// The result of a successful [`TimestampSigner::unsign`] call when the
/// timestamp was requested back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsigned {
    pub value: Vec<u8>,
    pub date_signed: DateTime<Utc>,
}

/// Signs and verifies byte strings with an embedded, checkable timestamp.
#[derive(Clone)]
pub struct TimestampSigner {
    signer: Signer,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TimestampSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampSigner").field("signer", &self.signer).finish()
    }
}

impl TimestampSigner {
    /// Wraps a [`Signer`] with timestamp binding, using the system clock.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            signer: Signer::new(secret_key),
            clock: default_clock(),
        }
    }

    /// Wraps an already-configured `Signer` (salt, separator, key
    /// derivation, algorithm, fallback keys) with timestamp binding.
    pub fn from_signer(signer: Signer) -> Self {
        Self {
            signer,
            clock: default_clock(),
        }
    }

    /// Overrides the clock used to stamp and check tokens. Tests should use
    /// this with a [`crate::clock::FixedClock`] instead of racing the real
    /// clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> u64 {
        self.clock.now().saturating_sub(EPOCH)
    }

    fn datetime_of(seconds_since_epoch: u64) -> DateTime<Utc> {
        Utc.timestamp_opt((EPOCH + seconds_since_epoch) as i64, 0)
            .single()
            .expect("EPOCH-relative timestamps fit in an i64")
    }

    /// Signs `value` with the current time appended as a second segment:
    /// `value sep b64url(timestamp) sep b64url(sig)`.
    pub fn sign(&self, value: &[u8]) -> Vec<u8> {
        let sep = self.signer.sep();
        let ts = b64url_encode(&int_to_bytes(self.now()));
        let mut with_ts = Vec::with_capacity(value.len() + 1 + ts.len());
        with_ts.extend_from_slice(value);
        with_ts.push(sep);
        with_ts.extend_from_slice(ts.as_bytes());
        self.signer.sign(&with_ts)
    }

    /// Verifies the outer signature and the embedded timestamp, optionally
    /// rejecting tokens older than `max_age` seconds.
    ///
    /// # Errors
    ///
    /// - [`Error::BadSignature`] if the outer signature itself is invalid.
    /// - [`Error::BadTimeSignature`] if the signature is valid but the
    ///   timestamp segment is missing or malformed.
    /// - [`Error::SignatureExpired`] if `max_age` is given and exceeded.
    pub fn unsign(&self, signed_value: &[u8], max_age: Option<u64>) -> Result<Vec<u8>> {
        Ok(self.unsign_with_timestamp(signed_value, max_age)?.value)
    }

    /// As [`Self::unsign`], but always returns the recovered timestamp
    /// alongside the value.
    pub fn unsign_with_timestamp(&self, signed_value: &[u8], max_age: Option<u64>) -> Result<Unsigned> {
        let sep = self.signer.sep();

        let value_with_ts = match self.signer.unsign(signed_value) {
            Ok(v) => v,
            Err(Error::BadSignature { payload: Some(payload), .. }) => {
                // Forensic best-effort: the outer MAC failed, but we can
                // still try to recover the value and timestamp for the
                // caller to see. `payload` here is the whole `value sep ts`
                // blob the outer signer saw, so split it the same way a
                // successful unsign would before attaching it.
                let (value, date_signed) = match payload.iter().rposition(|&b| b == sep) {
                    Some(pos) => {
                        let date_signed = b64url_decode(&payload[pos + 1..])
                            .ok()
                            .and_then(|bytes| bytes_to_int(&bytes))
                            .map(Self::datetime_of);
                        (payload[..pos].to_vec(), date_signed)
                    }
                    None => (payload, None),
                };
                return Err(Error::BadTimeSignature {
                    message: "signature does not match".to_string(),
                    payload: Some(value),
                    date_signed,
                });
            }
            Err(err) => return Err(err),
        };

        let sep_pos = value_with_ts.iter().rposition(|&b| b == sep).ok_or_else(|| {
            Error::BadTimeSignature {
                message: "timestamp missing".to_string(),
                payload: Some(value_with_ts.clone()),
                date_signed: None,
            }
        })?;
        let (value, ts_part) = value_with_ts.split_at(sep_pos);
        let ts_b64 = &ts_part[1..];

        let ts_bytes = b64url_decode(ts_b64).map_err(|_| Error::BadTimeSignature {
            message: "malformed timestamp".to_string(),
            payload: Some(value.to_vec()),
            date_signed: None,
        })?;
        let ts = bytes_to_int(&ts_bytes).ok_or_else(|| Error::BadTimeSignature {
            message: "malformed timestamp".to_string(),
            payload: Some(value.to_vec()),
            date_signed: None,
        })?;
        let date_signed = Self::datetime_of(ts);

        if let Some(max_age) = max_age {
            let age = self.now().saturating_sub(ts);
            if age > max_age {
                return Err(Error::SignatureExpired {
                    payload: Some(value.to_vec()),
                    date_signed: Some(date_signed),
                });
            }
        }

        Ok(Unsigned {
            value: value.to_vec(),
            date_signed,
        })
    }
}
