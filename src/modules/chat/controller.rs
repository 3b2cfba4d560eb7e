use axum::extract::{Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::chat::{ConversationParams, MarkMessagesReadDto, Message, SendMessageDto};
use infralearn_models::users::BulkResult;

use super::service::ChatService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Messages received by the caller, newest first
#[utoipa::path(
    get,
    path = "/api/chat/inbox",
    responses(
        (status = 200, description = "Received messages", body = Vec<Message>),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
#[instrument(skip_all)]
pub async fn get_inbox(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let messages = ChatService::inbox(state.store.as_ref(), auth_user.user_id()).await?;
    Ok(ApiResponse::ok(messages))
}

/// Conversation with another user, oldest first
#[utoipa::path(
    get,
    path = "/api/chat/messages",
    params(ConversationParams),
    responses(
        (status = 200, description = "Messages in both directions", body = Vec<Message>),
        (status = 400, description = "with is required", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
#[instrument(skip_all)]
pub async fn get_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ConversationParams>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let messages =
        ChatService::conversation(state.store.as_ref(), auth_user.user_id(), params.with).await?;
    Ok(ApiResponse::ok(messages))
}

#[utoipa::path(
    post,
    path = "/api/chat/messages",
    request_body = SendMessageDto,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 400, description = "Empty message or sent to self", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Recipient not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
#[instrument(skip_all)]
pub async fn send_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SendMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let message = ChatService::send(state.store.as_ref(), &auth_user, dto).await?;
    Ok(ApiResponse::created(message))
}

/// Mark one or many received messages as read
#[utoipa::path(
    patch,
    path = "/api/chat/messages/read",
    request_body = MarkMessagesReadDto,
    responses(
        (status = 200, description = "Number of messages marked", body = BulkResult),
        (status = 400, description = "Message IDs are required", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
#[instrument(skip_all)]
pub async fn mark_messages_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<MarkMessagesReadDto>,
) -> Result<Json<ApiResponse<BulkResult>>, AppError> {
    let result =
        ChatService::mark_read(state.store.as_ref(), auth_user.user_id(), dto.message_ids).await?;
    Ok(ApiResponse::ok(result))
}
