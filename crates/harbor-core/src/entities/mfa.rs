//! MFA state - second-factor configuration for one user

use crate::value_objects::Snowflake;

/// Per-user multi-factor state
///
/// Backup codes are stored as SHA-256 hex digests; consuming a code
/// removes its digest permanently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MfaState {
    pub user_id: Snowflake,
    pub totp_secret: Option<String>,
    pub backup_code_hashes: Vec<String>,
    pub enabled: bool,
}

impl MfaState {
    /// Create a disabled MFA state for a user
    pub fn new(user_id: Snowflake) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Whether login must present a second factor
    #[inline]
    pub fn requires_second_factor(&self) -> bool {
        self.enabled
    }

    /// Consume the backup code matching `hash`, if present
    ///
    /// Returns true when a code was matched and removed. A matched code can
    /// never be matched again.
    pub fn consume_backup_code(&mut self, hash: &str) -> bool {
        if let Some(pos) = self.backup_code_hashes.iter().position(|h| h == hash) {
            self.backup_code_hashes.remove(pos);
            true
        } else {
            false
        }
    }
}
