//! Channel handlers
//!
//! Guild channel CRUD and direct-message channels.

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::{
    ChannelResponse, CreateChannelRequest, OpenDmRequest, UpdateChannelRequest,
};
use harbor_service::ChannelService;

use crate::extractors::{AuthUser, ChannelIdPath, GuildIdPath, ValidatedJson};
use crate::response::{ApiError, ApiResult, Created, NoContent};
use crate::state::AppState;

/// Create a channel in a guild
///
/// POST /guilds/{guild_id}/channels
pub async fn create_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
    ValidatedJson(request): ValidatedJson<CreateChannelRequest>,
) -> ApiResult<Created<Json<ChannelResponse>>> {
    let service = ChannelService::new(state.services());
    let response = service
        .create_channel(path.guild_id()?, auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// List channels of a guild
///
/// GET /guilds/{guild_id}/channels
pub async fn list_guild_channels(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<GuildIdPath>,
) -> ApiResult<Json<Vec<ChannelResponse>>> {
    let service = ChannelService::new(state.services());
    let channels = service.list_for_guild(path.guild_id()?, auth.user_id).await?;
    Ok(Json(channels))
}

/// Get channel by ID
///
/// GET /channels/{channel_id}
pub async fn get_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ChannelIdPath>,
) -> ApiResult<Json<ChannelResponse>> {
    let service = ChannelService::new(state.services());
    let response = service.get_channel(path.channel_id()?, auth.user_id).await?;
    Ok(Json(response))
}

/// Update channel settings
///
/// PATCH /channels/{channel_id}
pub async fn update_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ChannelIdPath>,
    ValidatedJson(request): ValidatedJson<UpdateChannelRequest>,
) -> ApiResult<Json<ChannelResponse>> {
    let service = ChannelService::new(state.services());
    let response = service
        .update_channel(path.channel_id()?, auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// Delete a channel
///
/// DELETE /channels/{channel_id}
pub async fn delete_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ChannelIdPath>,
) -> ApiResult<NoContent> {
    let service = ChannelService::new(state.services());
    service.delete_channel(path.channel_id()?, auth.user_id).await?;
    Ok(NoContent)
}

/// Open (or return) a direct-message channel with another user
///
/// POST /users/@me/channels
pub async fn open_dm(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<OpenDmRequest>,
) -> ApiResult<Created<Json<ChannelResponse>>> {
    let recipient_id = request
        .recipient_id
        .parse()
        .map_err(|_| ApiError::invalid_query("Invalid recipient_id format"))?;

    let service = ChannelService::new(state.services());
    let response = service.open_dm(auth.user_id, recipient_id).await?;
    Ok(Created(Json(response)))
}
