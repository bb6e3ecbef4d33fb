//! Test data fixtures

use std::sync::atomic::{AtomicU64, Ordering};

use harbor_service::dto::{LoginRequest, RegisterRequest, SecondFactor};

/// Password satisfying the strength rules
pub const PASSWORD: &str = "Sturdy-Passw0rd";

static USER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A fresh (username, email) pair
pub fn unique_user() -> (String, String) {
    let n = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    (format!("tester{n}"), format!("tester{n}@example.com"))
}

/// Registration request for a fresh user
pub fn register_request() -> RegisterRequest {
    let (username, email) = unique_user();
    RegisterRequest {
        username,
        email,
        password: PASSWORD.to_string(),
    }
}

/// Login request for the given email
pub fn login_request(email: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        second_factor: None,
        device: None,
    }
}

/// Login request carrying a TOTP code
pub fn login_with_totp(email: &str, code: String) -> LoginRequest {
    LoginRequest {
        second_factor: Some(SecondFactor::Totp(code)),
        ..login_request(email)
    }
}

/// Login request carrying a backup code
pub fn login_with_backup_code(email: &str, code: String) -> LoginRequest {
    LoginRequest {
        second_factor: Some(SecondFactor::BackupCode(code)),
        ..login_request(email)
    }
}
