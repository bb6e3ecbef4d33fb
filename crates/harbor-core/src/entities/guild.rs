//! Guild entity - a community container owning roles, channels, and members

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild (server) entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub owner_id: Snowflake,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    /// Create a new Guild
    pub fn new(id: Snowflake, name: String, owner_id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            icon: None,
            banner: None,
            description: None,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if a user is the guild owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// Update the guild name
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }
}
