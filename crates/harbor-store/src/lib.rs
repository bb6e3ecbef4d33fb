//! # harbor-store
//!
//! Storage layer implementing the repository traits in process, backed by
//! concurrent maps. Atomicity requirements (invite redemption, delivery
//! acknowledgement, monotonic session touch) are owned here, behind the
//! same trait surface a database-backed store would present.

pub mod repositories;
mod store;

pub use repositories::{
    MemChannelRepository, MemGuildRepository, MemInviteRepository, MemMemberRepository,
    MemMessageRepository, MemMfaRepository, MemPushRepository, MemReactionRepository,
    MemRoleRepository, MemSessionRepository, MemUserRepository,
};
pub use store::MemoryStore;
