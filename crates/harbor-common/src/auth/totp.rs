//! Time-based one-time passwords (RFC 6238)
//!
//! HMAC-SHA1 over a 30-second counter, 6 digits, with one step of clock
//! skew accepted in either direction. Secrets are 20 random bytes stored
//! as unpadded URL-safe base64.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

/// Code length in digits
pub const TOTP_DIGITS: u32 = 6;

/// Counter step in seconds
pub const TOTP_STEP_SECS: u64 = 30;

const SECRET_BYTES: usize = 20;
const SKEW_STEPS: i64 = 1;

/// Generate a fresh TOTP secret (base64, stored as-is)
pub fn generate_totp_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The code for `secret` at `unix_secs`
///
/// Returns `None` if the secret is not valid base64.
pub fn totp_code_at(secret: &str, unix_secs: u64) -> Option<String> {
    let key = URL_SAFE_NO_PAD.decode(secret).ok()?;
    let counter = unix_secs / TOTP_STEP_SECS;
    Some(hotp(&key, counter))
}

/// Verify a presented code against `secret` at `unix_secs`
///
/// Accepts the current step and one step on each side. An undecodable
/// secret never verifies.
pub fn verify_totp(secret: &str, code: &str, unix_secs: u64) -> bool {
    let Ok(key) = URL_SAFE_NO_PAD.decode(secret) else {
        return false;
    };
    let current = (unix_secs / TOTP_STEP_SECS) as i64;

    (-SKEW_STEPS..=SKEW_STEPS).any(|offset| {
        let counter = current + offset;
        counter >= 0 && hotp(&key, counter as u64) == code
    })
}

fn hotp(key: &[u8], counter: u64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation per RFC 4226 §5.3
    let offset = (digest[19] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    format!("{:06}", binary % 10u32.pow(TOTP_DIGITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits_and_stable_within_step() {
        let secret = generate_totp_secret();
        // 999_990 starts a 30-second step, so both timestamps share it
        let code = totp_code_at(&secret, 999_990).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(code, totp_code_at(&secret, 1_000_019).unwrap());
    }

    #[test]
    fn test_verify_accepts_adjacent_steps() {
        let secret = generate_totp_secret();
        let now = 1_700_000_015;
        let previous = totp_code_at(&secret, now - 30).unwrap();
        let next = totp_code_at(&secret, now + 30).unwrap();

        assert!(verify_totp(&secret, &totp_code_at(&secret, now).unwrap(), now));
        assert!(verify_totp(&secret, &previous, now));
        assert!(verify_totp(&secret, &next, now));
    }

    #[test]
    fn test_verify_rejects_distant_steps_and_bad_secrets() {
        let secret = generate_totp_secret();
        let now = 1_700_000_015;
        let stale = totp_code_at(&secret, now - 120).unwrap();

        let accepted = [
            totp_code_at(&secret, now - 30).unwrap(),
            totp_code_at(&secret, now).unwrap(),
            totp_code_at(&secret, now + 30).unwrap(),
        ];
        // A code four steps old verifies only by 1-in-a-million collision
        if !accepted.contains(&stale) {
            assert!(!verify_totp(&secret, &stale, now));
        }
        assert!(!verify_totp("!!not base64!!", "123456", now));
    }

    #[test]
    fn test_rfc6238_sha1_vector() {
        // RFC 6238 Appendix B, SHA-1, T = 59 -> 94287082 (8 digits);
        // the 6-digit tail is 287082.
        let key = URL_SAFE_NO_PAD.encode(b"12345678901234567890");
        assert_eq!(totp_code_at(&key, 59).unwrap(), "287082");
    }
}
