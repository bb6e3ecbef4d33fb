//! Push queue entry - one durable, at-least-once notification

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::value_objects::Snowflake;

/// Append-only per-user notification log entry
///
/// `delivered` transitions false→true exactly once and is never reverted.
/// `dead` permanently excludes the entry from further delivery selection
/// after a fatal transport rejection; the entry itself is never deleted by
/// the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushQueueEntry {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub payload: Value,
    pub delivered: bool,
    pub dead: bool,
    pub attempts: u32,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PushQueueEntry {
    /// Create a new undelivered entry
    pub fn new(id: Snowflake, user_id: Snowflake, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            payload,
            delivered: false,
            dead: false,
            attempts: 0,
            next_attempt_at: now,
            created_at: now,
        }
    }

    /// Whether the entry is eligible for a delivery attempt at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.delivered && !self.dead && self.next_attempt_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_due() {
        let entry = PushQueueEntry::new(Snowflake::new(1), Snowflake::new(2), Value::Null);
        assert!(entry.is_due(Utc::now()));
    }

    #[test]
    fn test_delivered_and_dead_are_not_due() {
        let mut entry = PushQueueEntry::new(Snowflake::new(1), Snowflake::new(2), Value::Null);
        entry.delivered = true;
        assert!(!entry.is_due(Utc::now()));

        entry.delivered = false;
        entry.dead = true;
        assert!(!entry.is_due(Utc::now()));
    }
}
