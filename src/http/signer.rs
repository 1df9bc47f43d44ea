//! Time-bucketed HMAC signing of request bodies.
//!
//! Every signed request carries an HMAC-SHA256 of its JSON body. The key is
//! the 56 byte shared secret followed by the little-endian 64-bit index of
//! the current 30 second window, so a signature is only accepted while the
//! server agrees on that window.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use super::error::{ConfigError, REST_API_SECRET_LENGTH, RequestError};

type HmacSha256 = Hmac<Sha256>;

/// Width of one authentication window, in seconds.
pub const TIME_BUCKET_SECONDS: i64 = 30;

/// A validated REST API secret.
///
/// Holding one of these is proof that the secret is exactly
/// [`REST_API_SECRET_LENGTH`] bytes long.
#[derive(Clone, PartialEq, Eq)]
pub struct RestApiSecret([u8; REST_API_SECRET_LENGTH]);

impl RestApiSecret {
    /// Accepts raw secret bytes.
    pub fn from_raw(raw: &[u8]) -> Result<Self, ConfigError> {
        let bytes: [u8; REST_API_SECRET_LENGTH] = raw
            .try_into()
            .map_err(|_| ConfigError::InvalidSecretLength { got: raw.len() })?;
        Ok(Self(bytes))
    }

    /// Accepts a base-64 (RFC 4648, padded) encoded secret.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidSecretEncoding(e.to_string()))?;
        Self::from_raw(&raw)
    }

    /// Accepts a secret either raw or base-64 encoded.
    pub fn parse(secret: &[u8], is_base64_encoded: bool) -> Result<Self, ConfigError> {
        if is_base64_encoded {
            let encoded = std::str::from_utf8(secret).map_err(|e| ConfigError::InvalidSecretEncoding(e.to_string()))?;
            Self::from_base64(encoded)
        } else {
            Self::from_raw(secret)
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RestApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RestApiSecret(<redacted>)")
    }
}

/// Output of [`sign`]: the exact JSON bytes that were hashed and the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub json: Vec<u8>,
    pub hash: [u8; 32],
}

/// Outer JSON structure posted to every signed route.
///
/// Field order is part of the wire format: `cid`, `data`, `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedEnvelope {
    pub cid: String,
    pub data: String,
    pub hash: String,
}

impl SignedEnvelope {
    pub fn new(customer_identifier: &str, signature: &Signature) -> Self {
        Self {
            cid: customer_identifier.to_string(),
            data: STANDARD.encode(&signature.json),
            hash: STANDARD.encode(signature.hash),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Index of the 30 second window containing `unix_time + clock_delta`.
///
/// Uses floor division so times before the epoch land in negative buckets.
pub fn time_bucket(unix_time: i64, clock_delta: i64) -> i64 {
    unix_time.saturating_add(clock_delta).div_euclid(TIME_BUCKET_SECONDS)
}

/// Serializes `message` and computes its time-bucketed HMAC-SHA256.
///
/// Map keys are emitted in insertion order; nothing is sorted.
pub fn sign<T: Serialize + ?Sized>(
    message: &T,
    secret: &RestApiSecret,
    clock_delta: i64,
    unix_time: i64,
) -> Result<Signature, RequestError> {
    let json = serde_json::to_vec(message).map_err(RequestError::Encode)?;
    let hash = hmac_digest(&json, secret, time_bucket(unix_time, clock_delta))?;
    Ok(Signature { json, hash })
}

fn hmac_digest(json: &[u8], secret: &RestApiSecret, bucket: i64) -> Result<[u8; 32], RequestError> {
    let mut key = Vec::with_capacity(REST_API_SECRET_LENGTH + 8);
    key.extend_from_slice(secret.as_bytes());
    key.extend_from_slice(&bucket.to_le_bytes());

    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(&key).map_err(|e| RequestError::Signing(e.to_string()))?;
    mac.update(json);
    Ok(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secret() -> RestApiSecret {
        RestApiSecret::from_raw(&[7u8; REST_API_SECRET_LENGTH]).unwrap()
    }

    #[test]
    fn test_secret_rejects_wrong_lengths() {
        assert!(RestApiSecret::from_raw(&[0u8; 55]).is_err());
        assert!(RestApiSecret::from_raw(&[0u8; 57]).is_err());
        assert!(RestApiSecret::from_raw(&[]).is_err());
        assert_eq!(
            RestApiSecret::from_raw(&[0u8; 10]),
            Err(ConfigError::InvalidSecretLength { got: 10 })
        );
    }

    #[test]
    fn test_secret_from_base64() {
        let raw = [0xA5u8; REST_API_SECRET_LENGTH];
        let encoded = STANDARD.encode(raw);

        let secret = RestApiSecret::from_base64(&encoded).unwrap();
        assert_eq!(secret.as_bytes(), &raw);

        let parsed = RestApiSecret::parse(encoded.as_bytes(), true).unwrap();
        assert_eq!(parsed, secret);

        let short = STANDARD.encode([1u8; 40]);
        assert_eq!(
            RestApiSecret::from_base64(&short),
            Err(ConfigError::InvalidSecretLength { got: 40 })
        );
        assert!(matches!(
            RestApiSecret::from_base64("not base64!"),
            Err(ConfigError::InvalidSecretEncoding(_))
        ));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let rendered = format!("{:?}", secret());
        assert!(!rendered.contains('7'));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_sign_reports_unserializable_message() {
        let mut message = std::collections::BTreeMap::new();
        message.insert((1, 2), "tuple keys are not JSON object keys");

        let err = sign(&message, &secret(), 0, 0).unwrap_err();

        assert!(matches!(err, RequestError::Encode(_)));
    }

    #[test]
    fn test_time_bucket_floors() {
        assert_eq!(time_bucket(0, 0), 0);
        assert_eq!(time_bucket(29, 0), 0);
        assert_eq!(time_bucket(30, 0), 1);
        assert_eq!(time_bucket(59, 1), 2);
        assert_eq!(time_bucket(10, -11), -1);
        assert_eq!(time_bucket(1_700_000_000, 0), 56_666_666);
    }

    #[test]
    fn test_sign_matches_manual_hmac() {
        let message = json!({"monitor_id": 12});
        let now = 1_700_000_015;
        let signature = sign(&message, &secret(), 0, now).unwrap();

        assert_eq!(signature.json, br#"{"monitor_id":12}"#);

        let mut key = vec![7u8; REST_API_SECRET_LENGTH];
        key.extend_from_slice(&(now / 30).to_le_bytes());
        let mut mac = HmacSha256::new_from_slice(&key).unwrap();
        mac.update(br#"{"monitor_id":12}"#);
        let expected: [u8; 32] = mac.finalize().into_bytes().into();

        assert_eq!(hex::encode(signature.hash), hex::encode(expected));
    }

    #[test]
    fn test_sign_is_deterministic_within_window() {
        let message = json!({"start_timestamp": 0});
        let window_start = 1_700_000_010;

        let first = sign(&message, &secret(), 0, window_start).unwrap();
        let second = sign(&message, &secret(), 0, window_start + 29).unwrap();
        assert_eq!(first, second);

        let next_window = sign(&message, &secret(), 0, window_start + 30).unwrap();
        assert_ne!(first.hash, next_window.hash);
    }

    #[test]
    fn test_sign_changes_with_any_input() {
        let now = 1_700_000_010;
        let base = sign(&json!({"a": 1}), &secret(), 0, now).unwrap();

        let other_message = sign(&json!({"a": 2}), &secret(), 0, now).unwrap();
        let other_secret = RestApiSecret::from_raw(&[8u8; REST_API_SECRET_LENGTH]).unwrap();
        let other_key = sign(&json!({"a": 1}), &other_secret, 0, now).unwrap();
        let other_delta = sign(&json!({"a": 1}), &secret(), 30, now).unwrap();

        assert_ne!(base.hash, other_message.hash);
        assert_ne!(base.hash, other_key.hash);
        assert_ne!(base.hash, other_delta.hash);
    }

    #[test]
    fn test_sign_keeps_key_insertion_order() {
        let mut request = serde_json::Map::new();
        request.insert("start_timestamp".into(), json!(100));
        request.insert("end_timestamp".into(), json!(200));
        request.insert("monitor_id".into(), json!(3));

        let signature = sign(&request, &secret(), 0, 0).unwrap();
        assert_eq!(
            signature.json,
            br#"{"start_timestamp":100,"end_timestamp":200,"monitor_id":3}"#
        );
    }

    #[test]
    fn test_envelope_layout() {
        let signature = sign(&json!([]), &secret(), 0, 0).unwrap();
        let envelope = SignedEnvelope::new("cust-1", &signature);

        let bytes = envelope.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(r#"{"cid":"cust-1","data":"W10=","hash":""#));
        assert_eq!(STANDARD.decode(&envelope.hash).unwrap(), signature.hash);
    }
}
