use axum::{Json, extract::State};
use tracing::instrument;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::Identity;
use infralearn_models::users::UpdateProfileDto;

use super::service::ProfileService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = Identity),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Identity>>, AppError> {
    let identity = ProfileService::get(state.store.as_ref(), auth_user.user_id()).await?;
    Ok(ApiResponse::ok(identity))
}

/// Update username, name or email of the caller
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = Identity),
        (status = 400, description = "Invalid or empty update", body = infralearn_core::ErrorResponse),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<Identity>>, AppError> {
    let identity = ProfileService::update(
        state.store.as_ref(),
        &state.account_policy,
        auth_user.user_id(),
        dto,
    )
    .await?;
    Ok(ApiResponse::ok(identity))
}
