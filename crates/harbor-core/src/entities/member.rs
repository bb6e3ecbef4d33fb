//! Member entity - a user's membership in a guild

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild member entity (junction between User and Guild)
///
/// `role_ids` is the membership-role join; entries only make sense while
/// the membership itself exists, and the whole record cascades with guild
/// or user deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuildMember {
    /// Create a new GuildMember
    pub fn new(guild_id: Snowflake, user_id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            guild_id,
            user_id,
            nickname: None,
            role_ids: Vec::new(),
            joined_at: now,
            updated_at: now,
        }
    }

    /// Check if member holds a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Add a role to the member (no-op if already held)
    pub fn add_role(&mut self, role_id: Snowflake) {
        if !self.has_role(role_id) {
            self.role_ids.push(role_id);
            self.updated_at = Utc::now();
        }
    }

    /// Remove a role from the member (no-op if absent)
    pub fn remove_role(&mut self, role_id: Snowflake) {
        if let Some(pos) = self.role_ids.iter().position(|&id| id == role_id) {
            self.role_ids.remove(pos);
            self.updated_at = Utc::now();
        }
    }

    /// Display name: nickname if set, otherwise the given username
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(username)
    }
}
