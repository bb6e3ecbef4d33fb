//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    #[error("Invite not found: {0}")]
    InviteNotFound(String),

    #[error("Session not found")]
    SessionNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Reply must reference an earlier message in the same channel")]
    InvalidReplyReference,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Not message author")]
    NotMessageAuthor,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Username and discriminator already taken")]
    TagAlreadyExists,

    #[error("User is already a member of this guild")]
    AlreadyMember,

    #[error("Invite code already exists")]
    InviteCodeExists,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Invite has expired")]
    InviteExpired,

    #[error("Invite has reached maximum uses")]
    InviteExhausted,

    #[error("Cannot kick guild owner")]
    CannotKickOwner,

    #[error("Cannot leave owned guild (transfer ownership first)")]
    CannotLeaveOwnedGuild,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound => "UNKNOWN_MEMBER",
            Self::InviteNotFound(_) => "UNKNOWN_INVITE",
            Self::SessionNotFound => "UNKNOWN_SESSION",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidReplyReference => "INVALID_REPLY_REFERENCE",
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::NotMessageAuthor => "NOT_MESSAGE_AUTHOR",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::TagAlreadyExists => "TAG_ALREADY_EXISTS",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::InviteCodeExists => "INVITE_CODE_EXISTS",
            Self::InviteExpired => "INVITE_EXPIRED",
            Self::InviteExhausted => "INVITE_EXHAUSTED",
            Self::CannotKickOwner => "CANNOT_KICK_OWNER",
            Self::CannotLeaveOwnedGuild => "CANNOT_LEAVE_OWNED_GUILD",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::GuildNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::MessageNotFound(_)
                | Self::RoleNotFound(_)
                | Self::MemberNotFound
                | Self::InviteNotFound(_)
                | Self::SessionNotFound
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::MissingPermission(_) | Self::NotMessageAuthor)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::ContentTooLong { .. } | Self::InvalidReplyReference
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists
                | Self::TagAlreadyExists
                | Self::AlreadyMember
                | Self::InviteCodeExists
        )
    }
}
