//! Opaque session tokens and backup codes
//!
//! A session token is 32 random bytes, presented to clients as unpadded
//! URL-safe base64. Only the SHA-256 hex digest is ever stored; a leaked
//! session table cannot be replayed as bearer tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Number of backup codes issued when multi-factor auth is enabled
pub const BACKUP_CODE_COUNT: usize = 8;

const BACKUP_CODE_BYTES: usize = 5;

/// Generate a fresh session token (cleartext, shown to the client once)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a presented token, the form stored and looked up
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Generate backup codes and their stored hashes
///
/// Returns `(cleartext_codes, hashes)` in matching order. Codes are
/// 10 hex characters grouped as `xxxxx-xxxxx`.
pub fn generate_backup_codes() -> (Vec<String>, Vec<String>) {
    let mut codes = Vec::with_capacity(BACKUP_CODE_COUNT);
    let mut hashes = Vec::with_capacity(BACKUP_CODE_COUNT);

    for _ in 0..BACKUP_CODE_COUNT {
        let mut bytes = [0u8; BACKUP_CODE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let raw = hex_encode(&bytes);
        let code = format!("{}-{}", &raw[..5], &raw[5..]);
        hashes.push(hash_token(&code));
        codes.push(code);
    }

    (codes, hashes)
}

/// Whether `code` hashes to `hash`
pub fn verify_backup_code(code: &str, hash: &str) -> bool {
    hash_token(code) == hash
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
