//! Data transfer objects
//!
//! Request DTOs carry `Deserialize` + `Validate`; response DTOs carry
//! `Serialize` and are mapped from entities.

mod requests;
mod responses;

pub use requests::{
    CreateChannelRequest, CreateGuildRequest, CreateInviteRequest,
    CreateMessageRequest, CreateRoleRequest, EditMessageRequest, EnableMfaRequest, LoginRequest,
    OpenDmRequest, RegisterRequest, SecondFactor, UpdateChannelRequest, UpdateRoleRequest,
};
pub use responses::{
    ChannelResponse, GuildResponse, InviteResponse, LoginResponse, MemberResponse,
    MessageResponse, MfaEnabledResponse, ReactionResponse, RoleResponse, SessionResponse,
    UserResponse,
};
