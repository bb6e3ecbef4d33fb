//! Response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use harbor_core::{
    Channel, ChannelType, Guild, GuildMember, Invite, Message, Reaction, Role, Session, Snowflake,
    User,
};

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            discriminator: user.discriminator,
            display_name: user.display_name,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

/// A session as listed to its owner (never includes the token)
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Snowflake,
    pub device: Option<String>,
    pub source_address: Option<String>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            device: session.device,
            source_address: session.source_address,
            revoked: session.revoked,
            created_at: session.created_at,
            expires_at: session.expires_at,
            last_seen_at: session.last_seen_at,
        }
    }
}

/// Successful login: the cleartext token is surfaced exactly here
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: SessionResponse,
    pub user: UserResponse,
}

/// Multi-factor enrollment result; secret and codes are shown once
#[derive(Debug, Clone, Serialize)]
pub struct MfaEnabledResponse {
    pub secret: String,
    pub backup_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuildResponse {
    pub id: Snowflake,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Snowflake,
    pub created_at: DateTime<Utc>,
}

impl From<Guild> for GuildResponse {
    fn from(guild: Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name,
            description: guild.description,
            owner_id: guild.owner_id,
            created_at: guild.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelResponse {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub topic: Option<String>,
    pub position: i32,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            guild_id: channel.guild_id,
            name: channel.name,
            channel_type: channel.channel_type,
            topic: channel.topic,
            position: channel.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub content: Option<String>,
    pub reply_to: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author_id,
            content: message.content,
            reply_to: message.reply_to,
            created_at: message.created_at,
            edited_at: message.edited_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    /// Permission bits as a decimal string
    pub permissions: String,
    pub position: i32,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            guild_id: role.guild_id,
            name: role.name,
            permissions: role.permissions.bits().to_string(),
            position: role.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: DateTime<Utc>,
}

impl From<GuildMember> for MemberResponse {
    fn from(member: GuildMember) -> Self {
        Self {
            guild_id: member.guild_id,
            user_id: member.user_id,
            nickname: member.nickname,
            role_ids: member.role_ids,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub code: String,
    pub guild_id: Snowflake,
    pub inviter_id: Snowflake,
    pub uses: i32,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Invite> for InviteResponse {
    fn from(invite: Invite) -> Self {
        Self {
            code: invite.code,
            guild_id: invite.guild_id,
            inviter_id: invite.inviter_id,
            uses: invite.uses,
            max_uses: invite.max_uses,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionResponse {
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self {
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            emoji: reaction.emoji,
            created_at: reaction.created_at,
        }
    }
}
