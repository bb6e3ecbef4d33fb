//! Service context - dependency container for services
//!
//! Holds the repository handles, the gateway-facing event sink, the ID
//! generator, and the per-channel publish locks that keep committed events
//! flowing out in commit order.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::Mutex;

use harbor_core::{
    ChannelRepository, EventSink, GuildRepository, InviteRepository, MemberRepository,
    MessageRepository, MfaRepository, NullEventSink, PushRepository, ReactionRepository,
    RoleRepository, SessionRepository, Snowflake, SnowflakeGenerator, UserRepository,
};

/// Service context containing all dependencies
///
/// Cheap to clone; every clone shares the same repositories, sink, and
/// channel locks.
#[derive(Clone)]
pub struct ServiceContext {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    mfa_repo: Arc<dyn MfaRepository>,
    guild_repo: Arc<dyn GuildRepository>,
    role_repo: Arc<dyn RoleRepository>,
    member_repo: Arc<dyn MemberRepository>,
    channel_repo: Arc<dyn ChannelRepository>,
    message_repo: Arc<dyn MessageRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,
    invite_repo: Arc<dyn InviteRepository>,
    push_repo: Arc<dyn PushRepository>,

    event_sink: Arc<dyn EventSink>,
    snowflake: Arc<SnowflakeGenerator>,
    session_ttl: Duration,

    /// One async mutex per channel, held across commit + publish so events
    /// for a channel leave in commit order
    channel_locks: Arc<DashMap<Snowflake, Arc<Mutex<()>>>>,
}

impl ServiceContext {
    /// Start building a context
    #[must_use]
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::default()
    }

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn session_repo(&self) -> &dyn SessionRepository {
        self.session_repo.as_ref()
    }

    pub fn mfa_repo(&self) -> &dyn MfaRepository {
        self.mfa_repo.as_ref()
    }

    pub fn guild_repo(&self) -> &dyn GuildRepository {
        self.guild_repo.as_ref()
    }

    pub fn role_repo(&self) -> &dyn RoleRepository {
        self.role_repo.as_ref()
    }

    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    pub fn channel_repo(&self) -> &dyn ChannelRepository {
        self.channel_repo.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    pub fn invite_repo(&self) -> &dyn InviteRepository {
        self.invite_repo.as_ref()
    }

    pub fn push_repo(&self) -> &dyn PushRepository {
        self.push_repo.as_ref()
    }

    pub fn event_sink(&self) -> &dyn EventSink {
        self.event_sink.as_ref()
    }

    /// Mint a new Snowflake ID
    pub fn next_id(&self) -> Snowflake {
        self.snowflake.generate()
    }

    /// Configured session token lifetime
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// The publish lock for a channel
    ///
    /// Everything that commits a channel-routed mutation takes this lock
    /// for the commit and the publish together.
    pub fn channel_lock(&self, channel_id: Snowflake) -> Arc<Mutex<()>> {
        self.channel_locks
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the publish lock of a deleted channel
    pub(crate) fn release_channel_lock(&self, channel_id: Snowflake) {
        self.channel_locks.remove(&channel_id);
    }
}

/// Builder for [`ServiceContext`]
///
/// The event sink defaults to [`NullEventSink`], the worker id to 0, and
/// the session lifetime to 30 days.
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    session_repo: Option<Arc<dyn SessionRepository>>,
    mfa_repo: Option<Arc<dyn MfaRepository>>,
    guild_repo: Option<Arc<dyn GuildRepository>>,
    role_repo: Option<Arc<dyn RoleRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    channel_repo: Option<Arc<dyn ChannelRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    invite_repo: Option<Arc<dyn InviteRepository>>,
    push_repo: Option<Arc<dyn PushRepository>>,
    event_sink: Option<Arc<dyn EventSink>>,
    worker_id: u16,
    session_ttl: Option<Duration>,
}

impl ServiceContextBuilder {
    #[must_use]
    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn session_repo(mut self, repo: Arc<dyn SessionRepository>) -> Self {
        self.session_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn mfa_repo(mut self, repo: Arc<dyn MfaRepository>) -> Self {
        self.mfa_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn guild_repo(mut self, repo: Arc<dyn GuildRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn role_repo(mut self, repo: Arc<dyn RoleRepository>) -> Self {
        self.role_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn channel_repo(mut self, repo: Arc<dyn ChannelRepository>) -> Self {
        self.channel_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn invite_repo(mut self, repo: Arc<dyn InviteRepository>) -> Self {
        self.invite_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn push_repo(mut self, repo: Arc<dyn PushRepository>) -> Self {
        self.push_repo = Some(repo);
        self
    }

    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    #[must_use]
    pub fn worker_id(mut self, worker_id: u16) -> Self {
        self.worker_id = worker_id;
        self
    }

    #[must_use]
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Finish the build
    ///
    /// # Panics
    /// Panics if any repository was not provided; the context is assembled
    /// once at startup and a missing repository is a wiring bug.
    #[must_use]
    pub fn build(self) -> ServiceContext {
        ServiceContext {
            user_repo: self.user_repo.expect("user repository not set"),
            session_repo: self.session_repo.expect("session repository not set"),
            mfa_repo: self.mfa_repo.expect("mfa repository not set"),
            guild_repo: self.guild_repo.expect("guild repository not set"),
            role_repo: self.role_repo.expect("role repository not set"),
            member_repo: self.member_repo.expect("member repository not set"),
            channel_repo: self.channel_repo.expect("channel repository not set"),
            message_repo: self.message_repo.expect("message repository not set"),
            reaction_repo: self.reaction_repo.expect("reaction repository not set"),
            invite_repo: self.invite_repo.expect("invite repository not set"),
            push_repo: self.push_repo.expect("push repository not set"),
            event_sink: self.event_sink.unwrap_or_else(|| Arc::new(NullEventSink)),
            snowflake: Arc::new(SnowflakeGenerator::new(self.worker_id)),
            session_ttl: self.session_ttl.unwrap_or_else(|| Duration::days(30)),
            channel_locks: Arc::new(DashMap::new()),
        }
    }
}
