//! Payload definitions for non-dispatch frames

use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Create a Hello payload with the given interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

/// Payload for op 2 (Identify)
///
/// Sent by the client to authenticate the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Session bearer token
    pub token: String,

    /// Optional client properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IdentifyProperties>,
}

/// Client connection properties
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Browser or client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    /// Device type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Payload of the READY dispatch sent after a successful Identify
///
/// Lists the subscriptions registered for the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    /// Authenticated user id
    pub user_id: String,
    /// Guilds the connection is subscribed to
    pub guild_ids: Vec<String>,
    /// Channels the connection is subscribed to (DMs included)
    pub channel_ids: Vec<String>,
}
