//! Channel entity - a message stream, guild-scoped or direct

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Channel type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Guild text channel
    #[default]
    Text,
    /// Direct message between users
    Dm,
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub channel_type: ChannelType,
    pub topic: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Create a new guild text channel
    pub fn new_text(id: Snowflake, guild_id: Snowflake, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id: Some(guild_id),
            name: Some(name),
            channel_type: ChannelType::Text,
            topic: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a direct-message channel
    pub fn new_dm(id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id: None,
            name: None,
            channel_type: ChannelType::Dm,
            topic: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this is a guild channel
    #[inline]
    pub fn is_guild_channel(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Update name and topic
    pub fn set_info(&mut self, name: Option<String>, topic: Option<String>) {
        if name.is_some() {
            self.name = name;
        }
        if topic.is_some() {
            self.topic = topic;
        }
        self.updated_at = Utc::now();
    }
}
