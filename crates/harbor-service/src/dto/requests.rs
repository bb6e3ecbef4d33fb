//! Request DTOs
//!
//! All mutating request DTOs implement `Deserialize` and `Validate`.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// User registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
}

/// Second authentication factor presented during login
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum SecondFactor {
    Totp(String),
    BackupCode(String),
}

/// User login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    /// Required when the account has multi-factor auth enabled
    pub second_factor: Option<SecondFactor>,

    pub device: Option<String>,
}

/// Multi-factor enrollment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnableMfaRequest {
    /// Current password, re-verified before enrollment
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================================================
// Guild Requests
// ============================================================================

/// Create guild request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGuildRequest {
    #[validate(length(min = 1, max = 100, message = "Guild name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

// ============================================================================
// Channel Requests
// ============================================================================

/// Create channel request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 100, message = "Channel name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1024, message = "Topic must be at most 1024 characters"))]
    pub topic: Option<String>,
}

/// Update channel request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateChannelRequest {
    #[validate(length(min = 1, max = 100, message = "Channel name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1024, message = "Topic must be at most 1024 characters"))]
    pub topic: Option<String>,
}

/// Open (or reuse) a direct-message channel with another user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpenDmRequest {
    /// Snowflake ID as string
    #[validate(length(min = 1, message = "Recipient is required"))]
    pub recipient_id: String,
}

// ============================================================================
// Message Requests
// ============================================================================

/// Create message request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,

    /// ID of an earlier message in the same channel this replies to
    pub reply_to: Option<String>,
}

/// Edit message request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

// ============================================================================
// Role Requests
// ============================================================================

/// Create role request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Role name must be 1-100 characters"))]
    pub name: String,

    /// Permission bits as a decimal string
    pub permissions: Option<String>,
}

/// Update role request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Role name must be 1-100 characters"))]
    pub name: Option<String>,

    /// Permission bits as a decimal string
    pub permissions: Option<String>,

    pub position: Option<i32>,
}

// ============================================================================
// Invite Requests
// ============================================================================

/// Create invite request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInviteRequest {
    /// Maximum redemptions; unlimited when absent
    #[validate(range(min = 1, max = 10000, message = "max_uses must be 1-10000"))]
    pub max_uses: Option<i32>,

    /// Lifetime in seconds; never expires when absent
    #[validate(range(min = 60, max = 31_536_000, message = "max_age must be 60s-1y"))]
    pub max_age: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let valid = RegisterRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "SecurePass1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_name = RegisterRequest {
            username: "a".to_string(),
            ..valid
        };
        assert!(short_name.validate().is_err());
    }

    #[test]
    fn test_second_factor_wire_shape() {
        let factor: SecondFactor =
            serde_json::from_str(r#"{"kind":"totp","code":"123456"}"#).unwrap();
        assert!(matches!(factor, SecondFactor::Totp(code) if code == "123456"));

        let factor: SecondFactor =
            serde_json::from_str(r#"{"kind":"backup_code","code":"abcde-fghij"}"#).unwrap();
        assert!(matches!(factor, SecondFactor::BackupCode(_)));
    }

    #[test]
    fn test_open_dm_requires_recipient() {
        let missing = OpenDmRequest { recipient_id: String::new() };
        assert!(missing.validate().is_err());

        let present = OpenDmRequest { recipient_id: "42".to_string() };
        assert!(present.validate().is_ok());
    }

    #[test]
    fn test_message_content_bounds() {
        let empty = CreateMessageRequest { content: String::new(), reply_to: None };
        assert!(empty.validate().is_err());

        let long = CreateMessageRequest { content: "x".repeat(2001), reply_to: None };
        assert!(long.validate().is_err());
    }
}
