//! Business logic services
//!
//! Each service borrows the shared [`ServiceContext`] and orchestrates one
//! area of domain operations: validation, permission checks, persistence,
//! and event publication.

pub mod auth;
pub mod channel;
pub mod context;
pub mod error;
pub mod guild;
pub mod invite;
pub mod member;
pub mod message;
pub mod notification;
pub mod permission;
pub mod reaction;
pub mod role;

// Re-export all services for convenience
pub use auth::{AuthService, AuthenticatedSession};
pub use channel::ChannelService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use guild::GuildService;
pub use invite::InviteService;
pub use member::MemberService;
pub use message::MessageService;
pub use notification::NotificationService;
pub use permission::PermissionService;
pub use reaction::ReactionService;
pub use role::RoleService;
