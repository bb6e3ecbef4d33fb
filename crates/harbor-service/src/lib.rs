//! # harbor-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dispatch;
pub mod dto;
pub mod services;

pub use dispatch::{DispatchError, PushDispatcher, PushTransport};
pub use services::{
    AuthService, ChannelService, GuildService, InviteService, MemberService, MessageService,
    NotificationService, PermissionService, ReactionService, RoleService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
