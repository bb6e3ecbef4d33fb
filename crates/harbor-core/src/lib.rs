//! # harbor-core
//!
//! Domain layer containing entities, value objects, domain events, and the
//! ports (repository and event-sink traits) the rest of the system plugs
//! into. This crate has zero dependencies on infrastructure.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    generate_invite_code, Attachment, Channel, ChannelType, Guild, GuildMember, Invite, Message,
    MfaState, PushQueueEntry, Reaction, Role, Session, User,
};
pub use error::DomainError;
pub use events::{DomainEvent, EventRoute};
pub use traits::{
    ChannelRepository, EventSink, GuildRepository, InviteRepository, MemberRepository,
    MessageQuery, MessageRepository, MfaRepository, NullEventSink, PushRepository,
    ReactionRepository, RedeemOutcome, RepoResult, RoleRepository, SessionRepository,
    UserRepository,
};
pub use value_objects::{Permissions, Snowflake, SnowflakeGenerator, SnowflakeParseError};
