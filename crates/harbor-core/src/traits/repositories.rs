//! Repository traits - persistence ports implemented by the storage layer
//!
//! Services depend on these traits only; they never see a concrete store.
//! Operations that must be indivisible (invite redemption, delivery
//! acknowledgement) are expressed as single repository calls so the store
//! owns the atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Channel, Guild, GuildMember, Invite, Message, MfaState, PushQueueEntry, Reaction, Role,
    Session, User,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// =============================================================================
// Users
// =============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn find_by_tag(&self, username: &str, discriminator: &str) -> RepoResult<Option<User>>;

    async fn update(&self, user: &User) -> RepoResult<()>;

    /// Stored password hash for the user, if a password is set
    async fn password_hash(&self, user_id: Snowflake) -> RepoResult<Option<String>>;

    async fn set_password_hash(&self, user_id: Snowflake, hash: &str) -> RepoResult<()>;
}

// =============================================================================
// Sessions
// =============================================================================

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> RepoResult<()>;

    /// Lookup by the SHA-256 hex digest of the presented token
    async fn find_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<Session>>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Session>>;

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Session>>;

    /// Advance `last_seen_at`; the stored value never moves backwards
    async fn touch(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<()>;

    async fn revoke(&self, id: Snowflake) -> RepoResult<()>;

    async fn revoke_all_for_user(&self, user_id: Snowflake) -> RepoResult<u64>;
}

// =============================================================================
// Multi-factor state
// =============================================================================

#[async_trait]
pub trait MfaRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<MfaState>>;

    async fn upsert(&self, state: &MfaState) -> RepoResult<()>;

    /// Remove one backup code hash if present
    ///
    /// Returns `true` when the hash existed and was consumed. Concurrent
    /// calls for the same hash see at most one `true`.
    async fn consume_backup_code(&self, user_id: Snowflake, hash: &str) -> RepoResult<bool>;

    async fn disable(&self, user_id: Snowflake) -> RepoResult<()>;
}

// =============================================================================
// Guilds
// =============================================================================

#[async_trait]
pub trait GuildRepository: Send + Sync {
    async fn create(&self, guild: &Guild) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>>;

    async fn update(&self, guild: &Guild) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Guild>>;
}

// =============================================================================
// Roles
// =============================================================================

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, role: &Role) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Role>>;

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Role>>;

    /// Roles by id, preserving only those that still exist
    async fn find_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<Role>>;

    async fn update(&self, role: &Role) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// =============================================================================
// Members
// =============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, member: &GuildMember) -> RepoResult<()>;

    async fn find(&self, guild_id: Snowflake, user_id: Snowflake)
        -> RepoResult<Option<GuildMember>>;

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<GuildMember>>;

    async fn update(&self, member: &GuildMember) -> RepoResult<()>;

    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<()>;

    /// Drop a role id from every member of the guild that carries it
    async fn remove_role_from_all(&self, guild_id: Snowflake, role_id: Snowflake)
        -> RepoResult<u64>;
}

// =============================================================================
// Channels
// =============================================================================

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn create(&self, channel: &Channel) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Channel>>;

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Channel>>;

    async fn update(&self, channel: &Channel) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Participants of a direct-message channel
    async fn dm_participants(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Existing DM channel between exactly these two users, if any
    async fn find_dm(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<Channel>>;

    /// All DM channels the user participates in
    async fn list_dms_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Channel>>;

    async fn add_dm_participants(
        &self,
        channel_id: Snowflake,
        users: &[Snowflake],
    ) -> RepoResult<()>;
}

// =============================================================================
// Messages
// =============================================================================

/// Cursor pagination over a channel's history, newest first
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageQuery {
    /// Only messages with an id strictly less than this
    pub before: Option<Snowflake>,
    /// Only messages with an id strictly greater than this
    pub after: Option<Snowflake>,
    /// Page size; implementations clamp to their maximum
    pub limit: Option<u16>,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    async fn list_for_channel(
        &self,
        channel_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>>;

    async fn update(&self, message: &Message) -> RepoResult<()>;

    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// =============================================================================
// Reactions
// =============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Insert if absent; returns `false` when the same (message, user, emoji)
    /// reaction already exists
    async fn add(&self, reaction: &Reaction) -> RepoResult<bool>;

    /// Remove if present; returns `false` when there was nothing to remove
    async fn remove(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<bool>;

    async fn list_for_message(&self, message_id: Snowflake) -> RepoResult<Vec<Reaction>>;

    async fn delete_for_message(&self, message_id: Snowflake) -> RepoResult<()>;
}

// =============================================================================
// Invites
// =============================================================================

/// Result of an atomic redemption attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Use count was incremented and the membership was created
    Redeemed(Invite),
    /// The user was already a member; nothing was incremented
    AlreadyMember(GuildMember),
    /// Code exists but its use limit was already reached
    Exhausted,
    /// Code exists but its expiry has passed
    Expired,
}

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &Invite) -> RepoResult<()>;

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Invite>>;

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Invite>>;

    /// Atomically claim one use of the invite and create the membership
    ///
    /// The validity check (`expires_at`, `max_uses`), the `uses` increment,
    /// and the insertion of `member` commit or fail together: under
    /// concurrent redemption the use count never exceeds `max_uses`, and a
    /// user who is already a member gets `AlreadyMember` without consuming
    /// a use. Returns `InviteNotFound` for unknown codes.
    async fn redeem(
        &self,
        code: &str,
        member: &GuildMember,
        now: DateTime<Utc>,
    ) -> RepoResult<RedeemOutcome>;

    async fn delete(&self, code: &str) -> RepoResult<()>;
}

// =============================================================================
// Push queue
// =============================================================================

#[async_trait]
pub trait PushRepository: Send + Sync {
    /// Append an entry; the queue is append-only from the dispatcher's view
    async fn enqueue(&self, entry: &PushQueueEntry) -> RepoResult<()>;

    /// Undelivered, non-dead entries due at `now`, oldest first
    async fn select_due(&self, now: DateTime<Utc>, limit: usize)
        -> RepoResult<Vec<PushQueueEntry>>;

    /// Mark delivered if not already
    ///
    /// Returns `true` on the transition; a second call for the same entry
    /// returns `false`. The flag is never reverted.
    async fn mark_delivered(&self, id: Snowflake) -> RepoResult<bool>;

    /// Record a failed attempt and schedule the next one
    async fn record_attempt(&self, id: Snowflake, next_attempt_at: DateTime<Utc>)
        -> RepoResult<()>;

    /// Permanently exclude the entry from delivery after a fatal rejection
    async fn mark_dead(&self, id: Snowflake) -> RepoResult<()>;

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<PushQueueEntry>>;
}
