//! Session entity - one issued bearer token for one user

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Session entity
///
/// Holds only the SHA-256 hex digest of the bearer token; the cleartext
/// token is returned to the caller exactly once at creation and never
/// persisted. `last_seen_at` is monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub token_hash: String,
    pub device: Option<String>,
    pub source_address: Option<String>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Session {
    /// Create a new Session
    pub fn new(
        id: Snowflake,
        user_id: Snowflake,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            token_hash,
            device: None,
            source_address: None,
            revoked: false,
            created_at: now,
            expires_at,
            last_seen_at: now,
        }
    }

    /// Attach a device label
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Attach the address the session was created from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_address = Some(source.into());
        self
    }

    /// Check if the session has passed its expiry
    #[inline]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Advance last-seen; never moves backwards
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_seen_at {
            self.last_seen_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> Session {
        Session::new(
            Snowflake::new(1),
            Snowflake::new(2),
            "abc".to_string(),
            Utc::now() + Duration::days(30),
        )
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut s = session();
        let later = s.last_seen_at + Duration::seconds(10);
        s.touch(later);
        assert_eq!(s.last_seen_at, later);

        // An earlier timestamp must not rewind the clock
        s.touch(later - Duration::seconds(30));
        assert_eq!(s.last_seen_at, later);
    }

    #[test]
    fn test_expiry() {
        let mut s = session();
        assert!(!s.is_expired());
        s.expires_at = Utc::now() - Duration::seconds(1);
        assert!(s.is_expired());
    }
}
