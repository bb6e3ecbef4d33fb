//! Repository implementations
//!
//! In-process implementations of the repository traits defined in
//! harbor-core. Each repository owns the operations for one entity family.

mod channel;
mod guild;
mod invite;
mod member;
mod message;
mod mfa;
mod push;
mod reaction;
mod role;
mod session;
mod user;

pub use channel::MemChannelRepository;
pub use guild::MemGuildRepository;
pub use invite::MemInviteRepository;
pub use member::MemMemberRepository;
pub use message::MemMessageRepository;
pub use mfa::MemMfaRepository;
pub use push::MemPushRepository;
pub use reaction::MemReactionRepository;
pub use role::MemRoleRepository;
pub use session::MemSessionRepository;
pub use user::MemUserRepository;
