//! Path parameter extractors
//!
//! Type-safe extraction of Snowflake IDs from path parameters. IDs travel
//! as strings on the wire and are parsed on access.

use harbor_core::Snowflake;

use crate::response::ApiError;

fn parse_id(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// Path parameters with guild_id
#[derive(Debug, serde::Deserialize)]
pub struct GuildIdPath {
    pub guild_id: String,
}

impl GuildIdPath {
    pub fn guild_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.guild_id, "guild_id")
    }
}

/// Path parameters with channel_id
#[derive(Debug, serde::Deserialize)]
pub struct ChannelIdPath {
    pub channel_id: String,
}

impl ChannelIdPath {
    pub fn channel_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.channel_id, "channel_id")
    }
}

/// Path parameters with channel_id and message_id
#[derive(Debug, serde::Deserialize)]
pub struct MessageIdPath {
    pub channel_id: String,
    pub message_id: String,
}

impl MessageIdPath {
    pub fn channel_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.channel_id, "channel_id")
    }

    pub fn message_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.message_id, "message_id")
    }
}

/// Path parameters with guild_id and user_id
#[derive(Debug, serde::Deserialize)]
pub struct GuildUserPath {
    pub guild_id: String,
    pub user_id: String,
}

impl GuildUserPath {
    pub fn guild_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.guild_id, "guild_id")
    }

    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.user_id, "user_id")
    }
}

/// Path parameters with guild_id and role_id
#[derive(Debug, serde::Deserialize)]
pub struct GuildRolePath {
    pub guild_id: String,
    pub role_id: String,
}

impl GuildRolePath {
    pub fn guild_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.guild_id, "guild_id")
    }

    pub fn role_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.role_id, "role_id")
    }
}

/// Path parameters with guild_id, user_id, and role_id
#[derive(Debug, serde::Deserialize)]
pub struct GuildUserRolePath {
    pub guild_id: String,
    pub user_id: String,
    pub role_id: String,
}

impl GuildUserRolePath {
    pub fn guild_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.guild_id, "guild_id")
    }

    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.user_id, "user_id")
    }

    pub fn role_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.role_id, "role_id")
    }
}

/// Path parameters for invite code
#[derive(Debug, serde::Deserialize)]
pub struct InviteCodePath {
    pub invite_code: String,
}

impl InviteCodePath {
    pub fn code(&self) -> &str {
        &self.invite_code
    }
}

/// Path parameters for reactions
#[derive(Debug, serde::Deserialize)]
pub struct ReactionPath {
    pub channel_id: String,
    pub message_id: String,
    pub emoji: String,
}

impl ReactionPath {
    pub fn channel_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.channel_id, "channel_id")
    }

    pub fn message_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.message_id, "message_id")
    }

    /// The emoji (URL-decoded by the router)
    pub fn emoji(&self) -> &str {
        &self.emoji
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let path = GuildIdPath {
            guild_id: "123456789".to_string(),
        };
        assert!(path.guild_id().is_ok());
    }

    #[test]
    fn test_parse_invalid_id() {
        let path = GuildIdPath {
            guild_id: "not-a-number".to_string(),
        };
        assert!(path.guild_id().is_err());
    }
}
