//! Authentication primitives

mod password;
mod token;
mod totp;

pub use password::{hash_password, validate_password_strength, verify_password};
pub use token::{
    generate_backup_codes, generate_session_token, hash_token, verify_backup_code,
    BACKUP_CODE_COUNT,
};
pub use totp::{generate_totp_secret, totp_code_at, verify_totp, TOTP_DIGITS, TOTP_STEP_SECS};
