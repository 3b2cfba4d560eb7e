use axum::extract::{Path, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::enrollments::{DecideEnrollmentDto, Enrollment};

use super::service::EnrollmentService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStudent;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Ask to join a course
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Pending enrollment", body = Enrollment),
        (status = 400, description = "Already requested", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Only students can enroll", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip_all, fields(course_id = %id))]
pub async fn request_enrollment(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Enrollment>>), AppError> {
    let enrollment = EnrollmentService::request(state.store.as_ref(), &auth_user, id).await?;
    Ok(ApiResponse::created(enrollment))
}

/// Enrollment requests of a course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrollments", body = Vec<Enrollment>),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip_all, fields(course_id = %id))]
pub async fn get_course_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Enrollment>>>, AppError> {
    let enrollments =
        EnrollmentService::list_for_course(state.store.as_ref(), &auth_user, id).await?;
    Ok(ApiResponse::ok(enrollments))
}

/// The calling student's enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments/mine",
    responses(
        (status = 200, description = "Enrollments", body = Vec<Enrollment>),
        (status = 403, description = "Not a student", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip_all)]
pub async fn get_my_enrollments(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
) -> Result<Json<ApiResponse<Vec<Enrollment>>>, AppError> {
    let enrollments =
        EnrollmentService::list_mine(state.store.as_ref(), auth_user.user_id()).await?;
    Ok(ApiResponse::ok(enrollments))
}

/// Approve or reject a request
#[utoipa::path(
    patch,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    request_body = DecideEnrollmentDto,
    responses(
        (status = 200, description = "Decided enrollment", body = Enrollment),
        (status = 400, description = "Status must be approved or rejected", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Enrollment not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip_all, fields(%id))]
pub async fn decide_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<DecideEnrollmentDto>,
) -> Result<Json<ApiResponse<Enrollment>>, AppError> {
    let enrollment =
        EnrollmentService::decide(state.store.as_ref(), &auth_user, id, dto.status).await?;
    Ok(ApiResponse::ok(enrollment))
}
