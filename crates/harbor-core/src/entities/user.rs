//! User entity - a registered account

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// User entity
///
/// The (username, discriminator) pair is unique, as are email and phone
/// when present. The credential hash lives in the repository, never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub flags: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: Snowflake, username: String, discriminator: String, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            discriminator,
            display_name: None,
            email,
            phone: None,
            avatar: None,
            flags: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full tag: `username#discriminator`
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Name shown in clients: display name if set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// Update the username
    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.updated_at = Utc::now();
    }

    /// Update the avatar hash
    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar;
        self.updated_at = Utc::now();
    }
}
