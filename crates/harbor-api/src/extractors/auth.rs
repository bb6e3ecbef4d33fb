//! Authentication extractor
//!
//! Extracts the bearer token from the Authorization header and resolves it
//! to a live session. Token validation is a store lookup, so every request
//! observes revocation immediately.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use harbor_core::Snowflake;
use harbor_service::AuthService;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated user resolved from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User the session belongs to
    pub user_id: Snowflake,
    /// Session the token resolved to
    pub session_id: Snowflake,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        let authenticated = AuthService::new(app_state.services())
            .authenticate(bearer.token())
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                ApiError::Service(e)
            })?;

        Ok(AuthUser {
            user_id: authenticated.user.id,
            session_id: authenticated.session.id,
        })
    }
}
