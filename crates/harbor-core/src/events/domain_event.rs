//! Domain events - emitted once a mutation has committed
//!
//! Events are fanned out by the gateway to every connected, authorized
//! subscriber and may additionally be enqueued for offline delivery.
//! Events committed against a single channel are published in commit
//! order; the publisher holds the channel's sequence point while doing so.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Where an event is addressed: used by the fan-out dispatcher to pick
/// the subscriber set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRoute {
    /// Every connection subscribed to the channel
    Channel(Snowflake),
    /// Every connection subscribed to the guild
    Guild(Snowflake),
    /// Every connection of one user
    User(Snowflake),
}

/// All domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    MessageCreated {
        message_id: Snowflake,
        channel_id: Snowflake,
        author_id: Snowflake,
        content: Option<String>,
        reply_to: Option<Snowflake>,
        timestamp: DateTime<Utc>,
    },
    MessageUpdated {
        message_id: Snowflake,
        channel_id: Snowflake,
        content: Option<String>,
        timestamp: DateTime<Utc>,
    },
    MessageDeleted {
        message_id: Snowflake,
        channel_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    ReactionAdded {
        message_id: Snowflake,
        channel_id: Snowflake,
        user_id: Snowflake,
        emoji: String,
        timestamp: DateTime<Utc>,
    },
    ReactionRemoved {
        message_id: Snowflake,
        channel_id: Snowflake,
        user_id: Snowflake,
        emoji: String,
        timestamp: DateTime<Utc>,
    },
    ChannelCreated {
        channel_id: Snowflake,
        guild_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    ChannelUpdated {
        channel_id: Snowflake,
        guild_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    ChannelDeleted {
        channel_id: Snowflake,
        guild_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    MemberJoined {
        guild_id: Snowflake,
        user_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    MemberLeft {
        guild_id: Snowflake,
        user_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
    RoleChanged {
        guild_id: Snowflake,
        role_id: Snowflake,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// The event type name sent on the wire
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageCreated { .. } => "MESSAGE_CREATED",
            Self::MessageUpdated { .. } => "MESSAGE_UPDATED",
            Self::MessageDeleted { .. } => "MESSAGE_DELETED",
            Self::ReactionAdded { .. } => "REACTION_ADDED",
            Self::ReactionRemoved { .. } => "REACTION_REMOVED",
            Self::ChannelCreated { .. } => "CHANNEL_CREATED",
            Self::ChannelUpdated { .. } => "CHANNEL_UPDATED",
            Self::ChannelDeleted { .. } => "CHANNEL_DELETED",
            Self::MemberJoined { .. } => "MEMBER_JOINED",
            Self::MemberLeft { .. } => "MEMBER_LEFT",
            Self::RoleChanged { .. } => "ROLE_CHANGED",
        }
    }

    /// The subscriber set this event is addressed to
    pub fn route(&self) -> EventRoute {
        match self {
            Self::MessageCreated { channel_id, .. }
            | Self::MessageUpdated { channel_id, .. }
            | Self::MessageDeleted { channel_id, .. }
            | Self::ReactionAdded { channel_id, .. }
            | Self::ReactionRemoved { channel_id, .. } => EventRoute::Channel(*channel_id),
            Self::ChannelCreated { guild_id, .. }
            | Self::ChannelUpdated { guild_id, .. }
            | Self::ChannelDeleted { guild_id, .. }
            | Self::MemberJoined { guild_id, .. }
            | Self::MemberLeft { guild_id, .. }
            | Self::RoleChanged { guild_id, .. } => EventRoute::Guild(*guild_id),
        }
    }

    /// When the underlying mutation committed
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessageCreated { timestamp, .. }
            | Self::MessageUpdated { timestamp, .. }
            | Self::MessageDeleted { timestamp, .. }
            | Self::ReactionAdded { timestamp, .. }
            | Self::ReactionRemoved { timestamp, .. }
            | Self::ChannelCreated { timestamp, .. }
            | Self::ChannelUpdated { timestamp, .. }
            | Self::ChannelDeleted { timestamp, .. }
            | Self::MemberJoined { timestamp, .. }
            | Self::MemberLeft { timestamp, .. }
            | Self::RoleChanged { timestamp, .. } => *timestamp,
        }
    }
}
