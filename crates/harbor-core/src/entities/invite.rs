//! Invite entity - a shareable join code for a guild

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Invite entity
///
/// `uses` only ever increases and never exceeds `max_uses` when one is
/// set; the store enforces that atomically at redemption time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub code: String,
    pub guild_id: Snowflake,
    pub inviter_id: Snowflake,
    pub uses: i32,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Create a new Invite with no bounds
    pub fn new(code: String, guild_id: Snowflake, inviter_id: Snowflake) -> Self {
        Self {
            code,
            guild_id,
            inviter_id,
            uses: 0,
            max_uses: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Bound the invite to a maximum number of redemptions
    pub fn with_max_uses(mut self, max_uses: i32) -> Self {
        if max_uses > 0 {
            self.max_uses = Some(max_uses);
        }
        self
    }

    /// Bound the invite to a lifetime in seconds
    pub fn with_max_age(mut self, max_age_seconds: i64) -> Self {
        if max_age_seconds > 0 {
            self.expires_at = Some(self.created_at + chrono::Duration::seconds(max_age_seconds));
        }
        self
    }

    /// Check if the invite is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Check if the invite has consumed all its uses
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.uses >= max)
    }

    /// Remaining uses (None if unlimited)
    pub fn remaining_uses(&self) -> Option<i32> {
        self.max_uses.map(|max| max - self.uses)
    }
}

/// Generate a random 8-character alphanumeric invite code
pub fn generate_invite_code() -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const CODE_LEN: usize = 8;

    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
