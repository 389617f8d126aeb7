//! # itsdangerous
//!
//! Signs values so they can be safely round-tripped through untrusted
//! channels (URLs, cookies, confirmation links) -- the signature proves the
//! value was not modified after it was signed, not that it is secret.
//!
//! ## Modules
//!
//! - [`encoding`] - URL-safe base64 and big-endian integer framing
//! - [`algorithm`] - signing algorithms (`None`, HMAC over a selectable digest)
//! - [`signer`] - keyed MAC signing with salted key derivation and key rotation
//! - [`timestamp`] - timestamp-bound signing on top of [`signer`]
//! - [`codec`] - payload serialization (`Json`, `CompactJson`)
//! - [`serializer`] - typed signing over a [`codec::PayloadCodec`]
//! - [`urlsafe`] - URL-safe payload framing with transparent compression
//! - [`jws`] - JSON Web Signature compact form
//! - [`error`] - the crate's error taxonomy
//! - [`clock`] - injectable wall clock, for testable expiry
//!
//! ## Example
//!
//! ```
//! use itsdangerous::Signer;
//!
//! let signer = Signer::new(b"secret-key");
//! let token = signer.sign(b"my string");
//! assert_eq!(signer.unsign(&token).unwrap(), b"my string");
//! ```

pub mod algorithm;
pub mod clock;
#[cfg(feature = "serde")]
pub mod codec;
pub mod encoding;
pub mod error;
#[cfg(feature = "serde")]
pub mod jws;
#[cfg(feature = "serde")]
pub mod serializer;
pub mod signer;
pub mod timestamp;
#[cfg(feature = "serde")]
pub mod urlsafe;

pub use algorithm::{Algorithm, Digest};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, PayloadError, Result};
pub use signer::{KeyDerivation, Signer};
pub use timestamp::{TimestampSigner, Unsigned, EPOCH};

#[cfg(feature = "serde")]
pub use codec::{CompactJson, Json, PayloadCodec};
#[cfg(feature = "serde")]
pub use jws::JwsSerializer;
#[cfg(feature = "serde")]
pub use serializer::{FallbackSignerSpec, Serializer, TimedSerializer};
#[cfg(feature = "serde")]
pub use urlsafe::UrlSafe;

#[cfg(feature = "serde")]
pub type UrlSafeSerializer = Serializer<urlsafe::UrlSafe<codec::CompactJson>>;
#[cfg(feature = "serde")]
pub type UrlSafeTimedSerializer = TimedSerializer<urlsafe::UrlSafe<codec::CompactJson>>;
