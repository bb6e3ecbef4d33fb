//! Role handlers

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use harbor_service::RoleService;

use crate::extractors::{AuthUser, GuildIdPath, GuildRolePath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Create a role in a guild
///
/// POST /guilds/{guild_id}/roles
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
    ValidatedJson(request): ValidatedJson<CreateRoleRequest>,
) -> ApiResult<Created<Json<RoleResponse>>> {
    let service = RoleService::new(state.services());
    let response = service
        .create_role(path.guild_id()?, auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// List roles of a guild
///
/// GET /guilds/{guild_id}/roles
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let service = RoleService::new(state.services());
    let roles = service.list_roles(path.guild_id()?, auth.user_id).await?;
    Ok(Json(roles))
}

/// Update a role
///
/// PATCH /guilds/{guild_id}/roles/{role_id}
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildRolePath>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let service = RoleService::new(state.services());
    let response = service
        .update_role(path.guild_id()?, path.role_id()?, auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// Delete a role
///
/// DELETE /guilds/{guild_id}/roles/{role_id}
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildRolePath>,
) -> ApiResult<NoContent> {
    let service = RoleService::new(state.services());
    service
        .delete_role(path.guild_id()?, path.role_id()?, auth.user_id)
        .await?;
    Ok(NoContent)
}
