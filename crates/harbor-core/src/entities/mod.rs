//! Domain entities - core business objects

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

pub use channel::{Channel, ChannelType};
pub use guild::Guild;
pub use invite::{generate_invite_code, Invite};
pub use member::GuildMember;
pub use message::{Attachment, Message};
pub use mfa::MfaState;
pub use push::PushQueueEntry;
pub use reaction::Reaction;
pub use role::Role;
pub use session::Session;
pub use user::User;
