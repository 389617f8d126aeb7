//! Integration tests covering the signer, timestamp, serializer, URL-safe,
//! and JWS layers end to end.
//!
//! Tests cover: round-trip signing, tampering detection, salt namespacing,
//! key rotation, expiry, URL-safe alphabet containment, the compression
//! decision, and JWS algorithm binding.

use std::sync::Arc;

use chrono::TimeZone;
use itsdangerous::clock::FixedClock;
use itsdangerous::timestamp::EPOCH;
use itsdangerous::{Algorithm, Digest, JwsSerializer, Serializer, Signer, TimedSerializer, TimestampSigner};
use serde_json::json;

// ═════════════════════════════════════════════════════════════════════
// 1. Plain signer: documented wire format round-trips
// ═════════════════════════════════════════════════════════════════════

#[test]
fn signer_roundtrip_matches_documented_wire_format() {
    let signer = Signer::new(b"secret-key").with_salt(b"itsdangerous.Signer".as_slice());
    let signed = signer.sign(b"my string");
    let signed_str = String::from_utf8(signed.clone()).unwrap();
    let (value, sig) = signed_str.rsplit_once('.').unwrap();
    assert_eq!(value, "my string");
    assert_eq!(sig.len(), 27);

    assert_eq!(signer.unsign(&signed).unwrap(), b"my string");
}

// ═════════════════════════════════════════════════════════════════════
// 2. TimestampSigner: fresh, stale, and expired tokens
// ═════════════════════════════════════════════════════════════════════

#[test]
fn timestamp_signer_expiry_boundary() {
    let signed = TimestampSigner::new(b"secret")
        .with_clock(Arc::new(FixedClock(EPOCH)))
        .sign(b"v");

    let fresh = TimestampSigner::new(b"secret").with_clock(Arc::new(FixedClock(EPOCH + 5)));
    assert_eq!(fresh.unsign(&signed, Some(10)).unwrap(), b"v");

    let expired = TimestampSigner::new(b"secret").with_clock(Arc::new(FixedClock(EPOCH + 20)));
    let err = expired.unsign(&signed, Some(9)).unwrap_err();
    assert!(err.is_expired());
    assert_eq!(
        err.date_signed().unwrap(),
        chrono::Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap()
    );
}

// ═════════════════════════════════════════════════════════════════════
// 3. URL-safe serializer: alphabet containment and round-trip
// ═════════════════════════════════════════════════════════════════════

#[test]
fn url_safe_serializer_roundtrips_and_stays_in_alphabet() {
    let ser: itsdangerous::UrlSafeSerializer = Serializer::new(b"k");
    let value = json!({"a": "dictionary"});
    let signed = ser.dumps(&value, None).unwrap();

    assert!(signed
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')));

    let back: serde_json::Value = ser.loads(&signed, None).unwrap();
    assert_eq!(back, value);
}

// ═════════════════════════════════════════════════════════════════════
// 4. URL-safe serializer: long repetitive payloads compress
// ═════════════════════════════════════════════════════════════════════

#[test]
fn url_safe_serializer_compresses_when_beneficial() {
    let ser: itsdangerous::UrlSafeSerializer = Serializer::new(b"k");
    let value = json!("x".repeat(2000));
    let signed = ser.dumps(&value, None).unwrap();
    assert_eq!(signed[0], b'.');

    let back: serde_json::Value = ser.loads(&signed, None).unwrap();
    assert_eq!(back, value);
}

// ═════════════════════════════════════════════════════════════════════
// 5. JWS serializer: header carries caller fields and the forced alg
// ═════════════════════════════════════════════════════════════════════

#[test]
fn jws_serializer_header_roundtrip() {
    let jws = JwsSerializer::new(b"k", Algorithm::Hmac(Digest::Sha256)).unwrap();
    let mut extra = serde_json::Map::new();
    extra.insert("typ".to_string(), json!("dummy"));

    let signed = jws.dumps(&"hello", None, Some(extra)).unwrap();
    let (value, header): (String, _) = jws.loads_with_header(&signed, None).unwrap();

    assert_eq!(value, "hello");
    assert_eq!(header.get("alg").unwrap(), "HS256");
    assert_eq!(header.get("typ").unwrap(), "dummy");
}

// ═════════════════════════════════════════════════════════════════════
// 6. Separator validation: base64-alphabet bytes are rejected
// ═════════════════════════════════════════════════════════════════════

#[test]
fn separator_must_not_collide_with_the_base64_alphabet() {
    assert!(Signer::new(b"k").with_separator(b'-').is_err());
    assert!(Signer::new(b"k").with_separator(b'|').is_ok());
}

// ═════════════════════════════════════════════════════════════════════
// 7. Key rotation across a Serializer with a fallback signer
// ═════════════════════════════════════════════════════════════════════

#[test]
fn serializer_key_rotation_keeps_old_tokens_valid() {
    let old = Serializer::<itsdangerous::Json>::new(b"old-secret");
    let token = old.dumps(&json!("payload"), None).unwrap();

    let new = Serializer::<itsdangerous::Json>::new(b"new-secret").with_fallback_keys([b"old-secret".as_slice()]);
    let value: serde_json::Value = new.loads(&token, None).unwrap();
    assert_eq!(value, json!("payload"));

    // New tokens must sign with the newest key, not the oldest in the ring:
    // a bare signer holding only the current secret should verify them, and
    // the old secret alone should not.
    let fresh = new.dumps(&json!("payload"), None).unwrap();
    let current_only = Serializer::<itsdangerous::Json>::new(b"new-secret");
    assert_eq!(
        current_only.loads::<serde_json::Value>(&fresh, None).unwrap(),
        json!("payload")
    );
    let retired_only = Serializer::<itsdangerous::Json>::new(b"old-secret");
    assert!(retired_only.loads::<serde_json::Value>(&fresh, None).is_err());
}

// ═════════════════════════════════════════════════════════════════════
// 8. Salt namespacing: distinct salts never verify each other's tokens
// ═════════════════════════════════════════════════════════════════════

#[test]
fn timed_serializer_salts_are_isolated() {
    let a = TimedSerializer::<itsdangerous::Json>::new(b"secret").with_salt(b"a".as_slice());
    let b = TimedSerializer::<itsdangerous::Json>::new(b"secret").with_salt(b"b".as_slice());

    let token = a.dumps(&json!("x"), None).unwrap();
    assert!(b.loads::<serde_json::Value>(&token, None, None).is_err());
    assert!(a.loads::<serde_json::Value>(&token, None, None).is_ok());
}
