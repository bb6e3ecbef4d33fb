//! Guild member handlers

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::MemberResponse;
use harbor_service::MemberService;

use crate::extractors::{AuthUser, GuildIdPath, GuildUserPath, GuildUserRolePath};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

/// List members of a guild
///
/// GET /guilds/{guild_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let service = MemberService::new(state.services());
    let members = service.list_members(path.guild_id()?, auth.user_id).await?;
    Ok(Json(members))
}

/// Kick a member from a guild
///
/// DELETE /guilds/{guild_id}/members/{user_id}
pub async fn kick_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildUserPath>,
) -> ApiResult<NoContent> {
    let service = MemberService::new(state.services());
    service
        .kick_member(path.guild_id()?, auth.user_id, path.user_id()?)
        .await?;
    Ok(NoContent)
}

/// Leave a guild
///
/// DELETE /guilds/{guild_id}/members/@me
pub async fn leave_guild(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<NoContent> {
    let service = MemberService::new(state.services());
    service.leave_guild(path.guild_id()?, auth.user_id).await?;
    Ok(NoContent)
}

/// Assign a role to a member
///
/// PUT /guilds/{guild_id}/members/{user_id}/roles/{role_id}
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildUserRolePath>,
) -> ApiResult<Json<MemberResponse>> {
    let service = MemberService::new(state.services());
    let response = service
        .assign_role(path.guild_id()?, auth.user_id, path.user_id()?, path.role_id()?)
        .await?;
    Ok(Json(response))
}

/// Remove a role from a member
///
/// DELETE /guilds/{guild_id}/members/{user_id}/roles/{role_id}
pub async fn remove_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildUserRolePath>,
) -> ApiResult<Json<MemberResponse>> {
    let service = MemberService::new(state.services());
    let response = service
        .remove_role(path.guild_id()?, auth.user_id, path.user_id()?, path.role_id()?)
        .await?;
    Ok(Json(response))
}
