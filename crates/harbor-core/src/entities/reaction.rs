//! Reaction entity - an emoji reaction on a message
//!
//! Reactions are a set keyed by (message, user, emoji), never a counter.

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Reaction entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new Reaction
    pub fn new(message_id: Snowflake, user_id: Snowflake, emoji: String) -> Self {
        Self {
            message_id,
            user_id,
            emoji,
            created_at: Utc::now(),
        }
    }

    /// The set key for this reaction
    pub fn key(&self) -> (Snowflake, Snowflake, &str) {
        (self.message_id, self.user_id, &self.emoji)
    }
}
