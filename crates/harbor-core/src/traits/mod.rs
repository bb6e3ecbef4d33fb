//! Ports - abstractions implemented by the storage and gateway layers

mod event_sink;
mod repositories;

pub use event_sink::{EventSink, NullEventSink};
pub use repositories::{
    ChannelRepository, GuildRepository, InviteRepository, MemberRepository, MessageQuery,
    MessageRepository, MfaRepository, PushRepository, ReactionRepository, RedeemOutcome,
    RepoResult, RoleRepository, SessionRepository, UserRepository,
};
