//! Payment webhook signature verification.
//!
//! The payment provider signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`, where each `v1` value is the
//! HMAC-SHA256 of `"<t>.<raw body>"` keyed by the endpoint secret. A
//! delivery is trusted when any `v1` matches and the timestamp is within
//! [`SIGNATURE_TOLERANCE_SECS`] of the current time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and clock skew) of a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    MissingSecret,

    #[error("signature header is malformed")]
    MalformedHeader,

    #[error("signature timestamp is outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("no signature matches the payload")]
    Mismatch,
}

/// Compute the hex-encoded `v1` signature for a payload.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mac = signed_mac(secret, timestamp, payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature header against the raw request body.
///
/// `now` is the current Unix time in seconds; it is a parameter so the
/// tolerance check is deterministic under test.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }

    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or(SignatureError::MalformedHeader)?;
        match key {
            "t" => {
                timestamp = Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?);
            }
            "v1" => {
                // Undecodable entries simply never match.
                if let Some(bytes) = hex::decode(value) {
                    candidates.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::Mismatch);
    }
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let mac = signed_mac(secret, timestamp, payload);
    let matched = candidates
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_700_000_000;

    fn header_for(timestamp: i64, body: &[u8]) -> String {
        format!("t={timestamp},v1={}", compute_signature(SECRET, timestamp, body))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let header = header_for(NOW, BODY);
        assert_eq!(verify_signature(SECRET, &header, BODY, NOW), Ok(()));
    }

    #[test]
    fn any_matching_v1_is_accepted() {
        let good = compute_signature(SECRET, NOW, BODY);
        let header = format!("t={NOW},v1={},v1={good}", "00".repeat(32));
        assert_eq!(verify_signature(SECRET, &header, BODY, NOW), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = header_for(NOW, BODY);
        assert_eq!(
            verify_signature(SECRET, &header, b"{}", NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = header_for(NOW, BODY);
        assert_eq!(
            verify_signature("other", &header, BODY, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = header_for(NOW - SIGNATURE_TOLERANCE_SECS - 1, BODY);
        assert_eq!(
            verify_signature(SECRET, &header, BODY, NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn extreme_timestamps_are_out_of_tolerance() {
        for timestamp in [i64::MIN, i64::MAX] {
            let header = format!("t={timestamp},v1=00");
            assert_eq!(
                verify_signature(SECRET, &header, BODY, NOW),
                Err(SignatureError::TimestampOutOfTolerance)
            );
        }
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let header = format!("v1={}", compute_signature(SECRET, NOW, BODY));
        assert_eq!(
            verify_signature(SECRET, &header, BODY, NOW),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn garbage_header_is_malformed() {
        assert_eq!(
            verify_signature(SECRET, "garbage", BODY, NOW),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn empty_secret_is_refused() {
        let header = header_for(NOW, BODY);
        assert_eq!(
            verify_signature("", &header, BODY, NOW),
            Err(SignatureError::MissingSecret)
        );
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(hex::decode(&hex::encode([0u8, 15, 255])), Some(vec![0, 15, 255]));
        assert_eq!(hex::decode("abc"), None);
        assert_eq!(hex::decode("zz"), None);
    }
}
