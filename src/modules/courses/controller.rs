use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::auth::MessageResponse;
use infralearn_models::courses::{Course, CourseFilterParams, CreateCourseDto, UpdateCourseDto};

use super::service::CourseService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a course
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Validation failed or code taken", body = infralearn_core::ErrorResponse),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Students cannot create courses", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip_all)]
pub async fn create_course(
    State(state): State<AppState>,
    RequireStaff(auth_user): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<ApiResponse<Course>>), AppError> {
    let course = CourseService::create(state.store.as_ref(), &auth_user, dto).await?;
    Ok(ApiResponse::created(course))
}

/// List courses
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Courses", body = Vec<Course>),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip_all)]
pub async fn get_courses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filter): Query<CourseFilterParams>,
) -> Result<Json<ApiResponse<Vec<Course>>>, AppError> {
    let courses = CourseService::list(state.store.as_ref(), filter.professor_id).await?;
    Ok(ApiResponse::ok(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip_all, fields(%id))]
pub async fn get_course(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::find(state.store.as_ref(), id).await?;
    Ok(ApiResponse::ok(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Updated course", body = Course),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip_all, fields(%id))]
pub async fn update_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = CourseService::update(state.store.as_ref(), &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(course))
}

/// Delete a course with its enrollments, events and assignments
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip_all, fields(%id))]
pub async fn delete_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete(state.store.as_ref(), &auth_user, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Course deleted successfully".to_string(),
    }))
}
