//! Authentication handlers
//!
//! Endpoints for registration, login, session management, and
//! multi-factor enrollment.

use axum::{extract::State, Json};
use harbor_service::dto::{
    EnableMfaRequest, LoginRequest, LoginResponse, MfaEnabledResponse, RegisterRequest,
    SessionResponse, UserResponse,
};
use harbor_service::AuthService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Register a new user
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<UserResponse>>> {
    let service = AuthService::new(state.services());
    let response = service.register(request).await?;
    Ok(Created(Json(response)))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let service = AuthService::new(state.services());
    let response = service.login(request).await?;
    Ok(Json(response))
}

/// Logout the current session
///
/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<NoContent> {
    let service = AuthService::new(state.services());
    service.logout(auth.session_id).await?;
    Ok(NoContent)
}

/// Revoke every session of the current user
///
/// POST /auth/logout/all
pub async fn logout_all(State(state): State<AppState>, auth: AuthUser) -> ApiResult<NoContent> {
    let service = AuthService::new(state.services());
    service.logout_all(auth.user_id).await?;
    Ok(NoContent)
}

/// List sessions of the current user
///
/// GET /auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let service = AuthService::new(state.services());
    let sessions = service.list_sessions(auth.user_id).await?;
    Ok(Json(sessions))
}

/// Enable multi-factor authentication
///
/// POST /auth/mfa
pub async fn enable_mfa(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<EnableMfaRequest>,
) -> ApiResult<Created<Json<MfaEnabledResponse>>> {
    let service = AuthService::new(state.services());
    let response = service.enable_mfa(auth.user_id, &request.password).await?;
    Ok(Created(Json(response)))
}

/// Disable multi-factor authentication
///
/// DELETE /auth/mfa
pub async fn disable_mfa(State(state): State<AppState>, auth: AuthUser) -> ApiResult<NoContent> {
    let service = AuthService::new(state.services());
    service.disable_mfa(auth.user_id).await?;
    Ok(NoContent)
}
