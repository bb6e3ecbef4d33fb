//! Session authority flows
//!
//! Registration, login, token validation, revocation, expiry, and
//! multi-factor gating, exercised through the service stack.

use chrono::{Duration, Utc};
use harbor_common::totp_code_at;
use harbor_service::{AuthService, ServiceError};
use integration_tests::{
    login_request, login_with_backup_code, login_with_totp, register_and_login, register_request,
    service_env, service_env_with_ttl, PASSWORD,
};

fn error_code(err: &ServiceError) -> String {
    err.error_code().to_string()
}

#[tokio::test]
async fn test_login_token_authenticates() {
    let (ctx, _store) = service_env();
    let login = register_and_login(&ctx).await;

    let auth = AuthService::new(&ctx);
    let authenticated = auth.authenticate(&login.token).await.unwrap();
    assert_eq!(authenticated.user.id, login.user.id);
    assert_eq!(authenticated.session.id, login.session.id);
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let err = auth.authenticate("not-a-real-token").await.unwrap_err();
    assert_eq!(error_code(&err), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (ctx, _store) = service_env();
    let login = register_and_login(&ctx).await;

    let auth = AuthService::new(&ctx);
    auth.logout(login.session.id).await.unwrap();

    let err = auth.authenticate(&login.token).await.unwrap_err();
    assert_eq!(error_code(&err), "SESSION_REVOKED");

    // Revocation is idempotent
    auth.logout(login.session.id).await.unwrap();
}

#[tokio::test]
async fn test_logout_all_revokes_every_session() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let request = register_request();
    let email = request.email.clone();
    auth.register(request).await.unwrap();

    let first = auth.login(login_request(&email)).await.unwrap();
    let second = auth.login(login_request(&email)).await.unwrap();
    assert_ne!(first.token, second.token);

    let revoked = auth.logout_all(first.user.id).await.unwrap();
    assert_eq!(revoked, 2);

    assert!(auth.authenticate(&first.token).await.is_err());
    assert!(auth.authenticate(&second.token).await.is_err());
}

#[tokio::test]
async fn test_expired_session_rejected() {
    let (ctx, _store) = service_env_with_ttl(Duration::seconds(-5));
    let login = register_and_login(&ctx).await;

    let auth = AuthService::new(&ctx);
    let err = auth.authenticate(&login.token).await.unwrap_err();
    assert_eq!(error_code(&err), "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_sessions_listed_without_tokens() {
    let (ctx, _store) = service_env();
    let login = register_and_login(&ctx).await;

    let auth = AuthService::new(&ctx);
    let sessions = auth.list_sessions(login.user.id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, login.session.id);
}

#[tokio::test]
async fn test_mfa_gates_login() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let request = register_request();
    let email = request.email.clone();
    let user = auth.register(request).await.unwrap();
    auth.enable_mfa(user.id, PASSWORD).await.unwrap();

    // Password alone no longer mints a session
    let err = auth.login(login_request(&email)).await.unwrap_err();
    assert_eq!(error_code(&err), "MFA_REQUIRED");

    let err = auth
        .login(login_with_totp(&email, "000000".to_string()))
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), "MFA_INVALID");
}

#[tokio::test]
async fn test_totp_second_factor_accepted() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let request = register_request();
    let email = request.email.clone();
    let user = auth.register(request).await.unwrap();
    let enrollment = auth.enable_mfa(user.id, PASSWORD).await.unwrap();

    let now = u64::try_from(Utc::now().timestamp()).unwrap();
    let code = totp_code_at(&enrollment.secret, now).unwrap();

    let login = auth.login(login_with_totp(&email, code)).await.unwrap();
    assert!(auth.authenticate(&login.token).await.is_ok());
}

#[tokio::test]
async fn test_backup_code_is_single_use() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let request = register_request();
    let email = request.email.clone();
    let user = auth.register(request).await.unwrap();
    let enrollment = auth.enable_mfa(user.id, PASSWORD).await.unwrap();
    let code = enrollment.backup_codes[0].clone();

    auth.login(login_with_backup_code(&email, code.clone()))
        .await
        .expect("first use of a backup code should pass");

    let err = auth
        .login(login_with_backup_code(&email, code))
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), "MFA_INVALID");
}

#[tokio::test]
async fn test_disable_mfa_restores_password_login() {
    let (ctx, _store) = service_env();
    let auth = AuthService::new(&ctx);

    let request = register_request();
    let email = request.email.clone();
    let user = auth.register(request).await.unwrap();
    auth.enable_mfa(user.id, PASSWORD).await.unwrap();
    auth.disable_mfa(user.id).await.unwrap();

    assert!(auth.login(login_request(&email)).await.is_ok());
}
