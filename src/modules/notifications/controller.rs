use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::auth::MessageResponse;
use infralearn_models::notifications::{
    MarkNotificationsReadDto, Notification, NotificationFilterParams, SendNotificationDto,
};
use infralearn_models::users::BulkResult;

use super::service::NotificationService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all)]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filter): Query<NotificationFilterParams>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, AppError> {
    let notifications = NotificationService::list(
        state.store.as_ref(),
        auth_user.user_id(),
        filter.unread_only.unwrap_or(false),
    )
    .await?;
    Ok(ApiResponse::ok(notifications))
}

/// Notify one or many users
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = SendNotificationDto,
    responses(
        (status = 201, description = "Created notifications", body = Vec<Notification>),
        (status = 400, description = "User IDs are required or a recipient does not exist", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Students cannot send notifications", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all)]
pub async fn send_notification(
    State(state): State<AppState>,
    RequireStaff(_auth_user): RequireStaff,
    ValidatedJson(dto): ValidatedJson<SendNotificationDto>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Notification>>>), AppError> {
    let created =
        NotificationService::send(state.store.as_ref(), dto.user_ids, dto.title, dto.body).await?;
    Ok(ApiResponse::created(created))
}

/// Mark one or many of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read",
    request_body = MarkNotificationsReadDto,
    responses(
        (status = 200, description = "Number of notifications marked", body = BulkResult),
        (status = 400, description = "Notification IDs are required", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all)]
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<MarkNotificationsReadDto>,
) -> Result<Json<ApiResponse<BulkResult>>, AppError> {
    let result = NotificationService::mark_read(
        state.store.as_ref(),
        auth_user.user_id(),
        dto.notification_ids,
    )
    .await?;
    Ok(ApiResponse::ok(result))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 404, description = "Notification not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all, fields(%id))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    NotificationService::delete(state.store.as_ref(), auth_user.user_id(), id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Notification deleted".to_string(),
    }))
}
