//! Guild handlers

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::{CreateGuildRequest, GuildResponse};
use harbor_service::GuildService;

use crate::extractors::{AuthUser, GuildIdPath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Create a new guild
///
/// POST /guilds
pub async fn create_guild(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateGuildRequest>,
) -> ApiResult<Created<Json<GuildResponse>>> {
    let service = GuildService::new(state.services());
    let response = service.create_guild(auth.user_id, request).await?;
    Ok(Created(Json(response)))
}

/// Get guild by ID
///
/// GET /guilds/{guild_id}
pub async fn get_guild(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<Json<GuildResponse>> {
    let service = GuildService::new(state.services());
    let response = service.get_guild(path.guild_id()?, auth.user_id).await?;
    Ok(Json(response))
}

/// List guilds of the current user
///
/// GET /users/@me/guilds
pub async fn list_my_guilds(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<GuildResponse>>> {
    let service = GuildService::new(state.services());
    let guilds = service.list_for_user(auth.user_id).await?;
    Ok(Json(guilds))
}
