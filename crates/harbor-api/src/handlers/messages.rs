//! Message handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use harbor_core::{MessageQuery, Snowflake};
use harbor_service::dto::{CreateMessageRequest, EditMessageRequest, MessageResponse};
use harbor_service::MessageService;

use crate::extractors::{AuthUser, ChannelIdPath, MessageIdPath, ValidatedJson};
use crate::response::{ApiError, ApiResult, Created, NoContent};
use crate::state::AppState;

/// Query parameters for message listing
#[derive(Debug, Default, serde::Deserialize)]
pub struct MessageListParams {
    pub before: Option<String>,
    pub after: Option<String>,
    pub limit: Option<u16>,
}

impl MessageListParams {
    fn into_query(self) -> Result<MessageQuery, ApiError> {
        let parse = |raw: Option<String>, name: &str| -> Result<Option<Snowflake>, ApiError> {
            raw.map(|s| {
                s.parse()
                    .map_err(|_| ApiError::invalid_query(format!("Invalid {name} format")))
            })
            .transpose()
        };
        Ok(MessageQuery {
            before: parse(self.before, "before")?,
            after: parse(self.after, "after")?,
            limit: self.limit,
        })
    }
}

/// List messages in a channel, newest first
///
/// GET /channels/{channel_id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ChannelIdPath>,
    Query(params): Query<MessageListParams>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let service = MessageService::new(state.services());
    let messages = service
        .list_messages(path.channel_id()?, auth.user_id, params.into_query()?)
        .await?;
    Ok(Json(messages))
}

/// Send a message to a channel
///
/// POST /channels/{channel_id}/messages
pub async fn create_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ChannelIdPath>,
    ValidatedJson(request): ValidatedJson<CreateMessageRequest>,
) -> ApiResult<Created<Json<MessageResponse>>> {
    let service = MessageService::new(state.services());
    let response = service
        .send_message(path.channel_id()?, auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// Edit a message
///
/// PATCH /channels/{channel_id}/messages/{message_id}
pub async fn update_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessageIdPath>,
    ValidatedJson(request): ValidatedJson<EditMessageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = MessageService::new(state.services());
    let response = service
        .edit_message(path.message_id()?, auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// Delete a message
///
/// DELETE /channels/{channel_id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessageIdPath>,
) -> ApiResult<NoContent> {
    let service = MessageService::new(state.services());
    service.delete_message(path.message_id()?, auth.user_id).await?;
    Ok(NoContent)
}
