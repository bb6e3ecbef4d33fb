//! Role entity - a named permission bundle within a guild

use chrono::{DateTime, Utc};

use crate::value_objects::{Permissions, Snowflake};

/// Role entity
///
/// `position` orders roles for display only; it never affects permission
/// resolution, which is a plain OR over every role a member holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub color: i32,
    pub position: i32,
    pub permissions: Permissions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a new Role
    pub fn new(id: Snowflake, guild_id: Snowflake, name: String, permissions: Permissions) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id,
            name,
            color: 0,
            position: 0,
            permissions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the default member role seeded at guild creation
    pub fn default_member(id: Snowflake, guild_id: Snowflake) -> Self {
        Self::new(id, guild_id, "member".to_string(), Permissions::DEFAULT)
    }

    /// Check if this role grants a specific permission
    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }

    /// Update role permissions
    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
        self.updated_at = Utc::now();
    }

    /// Update role display position
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
        self.updated_at = Utc::now();
    }
}
