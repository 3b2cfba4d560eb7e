use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use infralearn_core::{ApiResponse, AppError};
use infralearn_models::auth::MessageResponse;
use infralearn_models::calendar::{
    AgendaItem, Assignment, AssignmentFilterParams, CalendarEvent, CreateAssignmentDto,
    CreateEventDto, EventFilterParams, UpcomingParams,
};

use super::service::CalendarService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Calendar events visible to the caller
#[utoipa::path(
    get,
    path = "/api/calendar/events",
    params(EventFilterParams),
    responses(
        (status = 200, description = "Events, earliest first", body = Vec<CalendarEvent>),
        (status = 401, description = "Not authenticated", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all)]
pub async fn get_events(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filter): Query<EventFilterParams>,
) -> Result<Json<ApiResponse<Vec<CalendarEvent>>>, AppError> {
    let events = CalendarService::list_events(state.store.as_ref(), &auth_user, filter).await?;
    Ok(ApiResponse::ok(events))
}

#[utoipa::path(
    post,
    path = "/api/calendar/events",
    request_body = CreateEventDto,
    responses(
        (status = 201, description = "Event created", body = CalendarEvent),
        (status = 400, description = "Invalid time range", body = infralearn_core::ErrorResponse),
        (status = 403, description = "Not allowed to add events to this course", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all)]
pub async fn create_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateEventDto>,
) -> Result<(StatusCode, Json<ApiResponse<CalendarEvent>>), AppError> {
    let event = CalendarService::create_event(state.store.as_ref(), &auth_user, dto).await?;
    Ok(ApiResponse::created(event))
}

#[utoipa::path(
    delete,
    path = "/api/calendar/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Event not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all, fields(%id))]
pub async fn delete_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    CalendarService::delete_event(state.store.as_ref(), &auth_user, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Event deleted successfully".to_string(),
    }))
}

/// Assignments of the courses visible to the caller
#[utoipa::path(
    get,
    path = "/api/calendar/assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "Assignments, earliest due first", body = Vec<Assignment>)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all)]
pub async fn get_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filter): Query<AssignmentFilterParams>,
) -> Result<Json<ApiResponse<Vec<Assignment>>>, AppError> {
    let assignments =
        CalendarService::list_assignments(state.store.as_ref(), &auth_user, filter.course_id)
            .await?;
    Ok(ApiResponse::ok(assignments))
}

/// Post an assignment and notify enrolled students
#[utoipa::path(
    post,
    path = "/api/calendar/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Course not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all)]
pub async fn create_assignment(
    State(state): State<AppState>,
    RequireStaff(auth_user): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<ApiResponse<Assignment>>), AppError> {
    let assignment =
        CalendarService::create_assignment(state.store.as_ref(), &auth_user, dto).await?;
    Ok(ApiResponse::created(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/calendar/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment deleted", body = MessageResponse),
        (status = 403, description = "Not the course professor", body = infralearn_core::ErrorResponse),
        (status = 404, description = "Assignment not found", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all, fields(%id))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    CalendarService::delete_assignment(state.store.as_ref(), &auth_user, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Assignment deleted successfully".to_string(),
    }))
}

/// Merged agenda of upcoming events and due dates
#[utoipa::path(
    get,
    path = "/api/calendar/upcoming",
    params(UpcomingParams),
    responses(
        (status = 200, description = "Agenda in chronological order", body = Vec<AgendaItem>),
        (status = 400, description = "days out of range", body = infralearn_core::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Calendar"
)]
#[instrument(skip_all)]
pub async fn get_upcoming(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<ApiResponse<Vec<AgendaItem>>>, AppError> {
    let agenda = CalendarService::upcoming(state.store.as_ref(), &auth_user, params.days).await?;
    Ok(ApiResponse::ok(agenda))
}
