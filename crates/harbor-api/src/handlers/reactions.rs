//! Reaction handlers

use axum::{
    extract::{Path, State},
    Json,
};
use harbor_service::dto::ReactionResponse;
use harbor_service::ReactionService;

use crate::extractors::{AuthUser, MessageIdPath, ReactionPath};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

/// Add the current user's reaction
///
/// PUT /channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me
pub async fn add_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ReactionPath>,
) -> ApiResult<NoContent> {
    let service = ReactionService::new(state.services());
    service
        .add_reaction(path.message_id()?, auth.user_id, path.emoji())
        .await?;
    Ok(NoContent)
}

/// Remove the current user's reaction
///
/// DELETE /channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me
pub async fn remove_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ReactionPath>,
) -> ApiResult<NoContent> {
    let service = ReactionService::new(state.services());
    service
        .remove_reaction(path.message_id()?, auth.user_id, path.emoji())
        .await?;
    Ok(NoContent)
}

/// List reactions on a message
///
/// GET /channels/{channel_id}/messages/{message_id}/reactions
pub async fn list_reactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessageIdPath>,
) -> ApiResult<Json<Vec<ReactionResponse>>> {
    let service = ReactionService::new(state.services());
    let reactions = service
        .list_reactions(path.message_id()?, auth.user_id)
        .await?;
    Ok(Json(reactions))
}
