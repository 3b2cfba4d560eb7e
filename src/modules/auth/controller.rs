use axum::extract::{Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::Identity;
use infralearn_models::auth::{
    LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RefreshResponse, SignUpRequest,
    UsernameAvailability, UsernameQuery,
};

use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Sign in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = infralearn_core::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = infralearn_core::ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(
        state.store.as_ref(),
        &state.tokens,
        &state.account_policy,
        dto,
    )
    .await?;
    Ok(Json(response))
}

/// Register a professor or student account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = Identity),
        (status = 400, description = "Validation failed, reserved role, non-institutional student email, or username taken", body = infralearn_core::ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Identity>>), AppError> {
    let identity =
        AuthService::register(state.store.as_ref(), &state.account_policy, dto).await?;
    Ok(ApiResponse::created(identity))
}

/// Check whether a username is still free
#[utoipa::path(
    get,
    path = "/api/auth/check-username",
    params(UsernameQuery),
    responses(
        (status = 200, description = "Availability", body = UsernameAvailability),
        (status = 400, description = "username missing", body = infralearn_core::ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<ApiResponse<UsernameAvailability>>, AppError> {
    let username = query.username.unwrap_or_default();
    let available = AuthService::username_available(state.store.as_ref(), &username).await?;
    Ok(ApiResponse::ok(UsernameAvailability { available }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = infralearn_core::ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let response = AuthService::refresh(state.store.as_ref(), &state.tokens, dto).await?;
    Ok(Json(response))
}

/// Sign out, revoking all refresh tokens
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip_all, fields(user_id = %auth_user.user_id()))]
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(state.store.as_ref(), auth_user.user_id()).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

/// The identity behind the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = Identity),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Account no longer exists", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Identity>>, AppError> {
    let identity =
        AuthService::current_identity(state.store.as_ref(), auth_user.user_id()).await?;
    Ok(ApiResponse::ok(identity))
}
