//! Shared table set behind every repository handle

use std::sync::Arc;

use dashmap::DashMap;

use harbor_core::{
    Channel, Guild, GuildMember, Invite, Message, MfaState, PushQueueEntry, Reaction, Role,
    Session, Snowflake, User,
};

use crate::repositories::{
    MemChannelRepository, MemGuildRepository, MemInviteRepository, MemMemberRepository,
    MemMessageRepository, MemMfaRepository, MemPushRepository, MemReactionRepository,
    MemRoleRepository, MemSessionRepository, MemUserRepository,
};

/// All tables of one store instance
///
/// Keys follow the entity identities; secondary indexes are maintained by
/// the owning repository. Cross-table operations that must be indivisible
/// (invite redemption) pin the invite's map entry for their whole duration,
/// which serializes redemption per code.
#[derive(Default)]
pub(crate) struct Tables {
    pub users: DashMap<Snowflake, User>,
    pub password_hashes: DashMap<Snowflake, String>,
    pub sessions: DashMap<Snowflake, Session>,
    /// token hash -> session id
    pub session_tokens: DashMap<String, Snowflake>,
    pub mfa: DashMap<Snowflake, MfaState>,
    pub guilds: DashMap<Snowflake, Guild>,
    pub roles: DashMap<Snowflake, Role>,
    /// (guild id, user id) -> membership
    pub members: DashMap<(Snowflake, Snowflake), GuildMember>,
    pub channels: DashMap<Snowflake, Channel>,
    /// DM channel id -> participant user ids
    pub dm_participants: DashMap<Snowflake, Vec<Snowflake>>,
    pub messages: DashMap<Snowflake, Message>,
    /// (message id, user id, emoji) -> reaction
    pub reactions: DashMap<(Snowflake, Snowflake, String), Reaction>,
    pub invites: DashMap<String, Invite>,
    pub push_entries: DashMap<Snowflake, PushQueueEntry>,
}

/// In-process store; cheap to clone, all clones share the tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn users(&self) -> MemUserRepository {
        MemUserRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn sessions(&self) -> MemSessionRepository {
        MemSessionRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn mfa(&self) -> MemMfaRepository {
        MemMfaRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn guilds(&self) -> MemGuildRepository {
        MemGuildRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn roles(&self) -> MemRoleRepository {
        MemRoleRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn members(&self) -> MemMemberRepository {
        MemMemberRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn channels(&self) -> MemChannelRepository {
        MemChannelRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn messages(&self) -> MemMessageRepository {
        MemMessageRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn reactions(&self) -> MemReactionRepository {
        MemReactionRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn invites(&self) -> MemInviteRepository {
        MemInviteRepository::new(Arc::clone(&self.tables))
    }

    #[must_use]
    pub fn push(&self) -> MemPushRepository {
        MemPushRepository::new(Arc::clone(&self.tables))
    }
}
