//! # harbor-common
//!
//! Shared utilities including configuration, error handling, authentication
//! primitives, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    generate_backup_codes, generate_session_token, generate_totp_secret, hash_password,
    hash_token, totp_code_at, validate_password_strength, verify_backup_code, verify_password,
    verify_totp, BACKUP_CODE_COUNT, TOTP_DIGITS, TOTP_STEP_SECS,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, Environment, GatewayConfig, PushConfig, ServerConfig,
    SessionConfig, SnowflakeConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
