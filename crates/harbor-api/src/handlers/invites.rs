//! Invite handlers
//!
//! Invite creation, lookup, redemption, and revocation. Redemption is a
//! single atomic operation in the store; concurrent redeemers of a nearly
//! exhausted invite race on that operation, never in this layer.

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::{CreateInviteRequest, InviteResponse, MemberResponse};
use harbor_service::InviteService;

use crate::extractors::{AuthUser, GuildIdPath, InviteCodePath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Create an invite for a guild
///
/// POST /guilds/{guild_id}/invites
pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
    ValidatedJson(request): ValidatedJson<CreateInviteRequest>,
) -> ApiResult<Created<Json<InviteResponse>>> {
    let service = InviteService::new(state.services());
    let response = service
        .create_invite(path.guild_id()?, auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// List invites of a guild
///
/// GET /guilds/{guild_id}/invites
pub async fn list_guild_invites(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<Json<Vec<InviteResponse>>> {
    let service = InviteService::new(state.services());
    let invites = service.list_for_guild(path.guild_id()?, auth.user_id).await?;
    Ok(Json(invites))
}

/// Look up an invite by code
///
/// GET /invites/{invite_code}
pub async fn get_invite(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(path): Path<InviteCodePath>,
) -> ApiResult<Json<InviteResponse>> {
    let service = InviteService::new(state.services());
    let response = service.get_invite(path.code()).await?;
    Ok(Json(response))
}

/// Redeem an invite, joining its guild
///
/// POST /invites/{invite_code}
pub async fn redeem_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<InviteCodePath>,
) -> ApiResult<Json<MemberResponse>> {
    let service = InviteService::new(state.services());
    let response = service.redeem_invite(path.code(), auth.user_id).await?;
    Ok(Json(response))
}

/// Delete an invite
///
/// DELETE /invites/{invite_code}
pub async fn delete_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<InviteCodePath>,
) -> ApiResult<NoContent> {
    let service = InviteService::new(state.services());
    service.delete_invite(path.code(), auth.user_id).await?;
    Ok(NoContent)
}
