use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::Identity;
use infralearn_models::auth::MessageResponse;
use infralearn_models::users::{
    BulkDeleteUsersDto, BulkResult, BulkUpdateUsersDto, CreateUserDto, UserFilterParams,
};

use super::service::UserService;
use crate::middleware::role::RequireSuperAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create an account with any role
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = Identity),
        (status = 400, description = "Validation failed or username/email taken", body = infralearn_core::ErrorResponse),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Not a super administrator", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<Identity>>), AppError> {
    let identity =
        UserService::create_user(state.store.as_ref(), &state.account_policy, dto).await?;
    Ok(ApiResponse::created(identity))
}

/// List accounts
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Accounts", body = Vec<Identity>),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Not a super administrator", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn get_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilterParams>,
) -> Result<Json<ApiResponse<Vec<Identity>>>, AppError> {
    let users = UserService::list_users(state.store.as_ref(), filter.role).await?;
    Ok(ApiResponse::ok(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account", body = Identity),
        (status = 404, description = "User not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(%id))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Identity>>, AppError> {
    let user = UserService::get_user(state.store.as_ref(), id).await?;
    Ok(ApiResponse::ok(user))
}

/// Delete an account and everything it owns
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Attempt to delete own account", body = infralearn_core::ErrorResponse),
        (status = 404, description = "User not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(%id))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireSuperAdmin(auth_user): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(state.store.as_ref(), auth_user.user_id(), id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

/// Apply the same name/role change to one or many accounts
#[utoipa::path(
    patch,
    path = "/api/users/bulk",
    request_body = BulkUpdateUsersDto,
    responses(
        (status = 200, description = "Number of accounts changed", body = BulkResult),
        (status = 400, description = "User IDs are required / Updates are required", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn bulk_update_users(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<BulkUpdateUsersDto>,
) -> Result<Json<ApiResponse<BulkResult>>, AppError> {
    let result = UserService::bulk_update(state.store.as_ref(), dto).await?;
    Ok(ApiResponse::ok(result))
}

/// Delete one or many accounts
#[utoipa::path(
    delete,
    path = "/api/users/bulk",
    request_body = BulkDeleteUsersDto,
    responses(
        (status = 200, description = "Number of accounts deleted", body = BulkResult),
        (status = 400, description = "User IDs are required", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn bulk_delete_users(
    State(state): State<AppState>,
    RequireSuperAdmin(auth_user): RequireSuperAdmin,
    ValidatedJson(dto): ValidatedJson<BulkDeleteUsersDto>,
) -> Result<Json<ApiResponse<BulkResult>>, AppError> {
    let result =
        UserService::bulk_delete(state.store.as_ref(), auth_user.user_id(), dto).await?;
    Ok(ApiResponse::ok(result))
}
