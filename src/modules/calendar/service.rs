use chrono::{Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_core::AppError;
use infralearn_db::Store;
use infralearn_models::calendar::{
    AgendaItem, Assignment, CalendarEvent, CreateAssignmentDto, CreateEventDto, EventFilterParams,
    EventScope, NewAssignment, NewEvent,
};
use infralearn_models::enrollments::EnrollmentStatus;
use infralearn_models::notifications::{NewNotification, NotificationKind};

use crate::modules::courses::service::CourseService;
use crate::middleware::auth::AuthUser;
use crate::modules::notifications::service::notify_many;

pub const DEFAULT_UPCOMING_DAYS: i64 = 7;
const MAX_UPCOMING_DAYS: i64 = 365;

pub struct CalendarService;

impl CalendarService {
    /// Courses whose calendar the caller may read. `None` means all of them.
    ///
    /// Professors see the courses they teach, students the courses they
    /// were approved into.
    pub async fn visible_course_ids(
        store: &dyn Store,
        auth_user: &AuthUser,
    ) -> Result<Option<Vec<Uuid>>, AppError> {
        let ids = match auth_user.role() {
            Role::SuperAdmin => return Ok(None),
            Role::Professor => store
                .list_courses(Some(auth_user.user_id()))
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect(),
            Role::Student => store
                .list_student_enrollments(auth_user.user_id())
                .await?
                .into_iter()
                .filter(|e| e.status == EnrollmentStatus::Approved)
                .map(|e| e.course_id)
                .collect(),
        };
        Ok(Some(ids))
    }

    async fn event_scope(store: &dyn Store, auth_user: &AuthUser) -> Result<EventScope, AppError> {
        Ok(match Self::visible_course_ids(store, auth_user).await? {
            None => EventScope::All,
            Some(course_ids) => EventScope::Visible {
                user_id: auth_user.user_id(),
                course_ids,
            },
        })
    }

    pub async fn list_events(
        store: &dyn Store,
        auth_user: &AuthUser,
        filter: EventFilterParams,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && to < from
        {
            return Err(AppError::bad_request("to must not be before from"));
        }

        let scope = Self::event_scope(store, auth_user).await?;
        Ok(store.list_events(&scope, filter.from, filter.to).await?)
    }

    /// Anyone may keep personal events; events attached to a course need
    /// the course professor or an administrator.
    #[instrument(skip(store, auth_user, dto), fields(course_id = ?dto.course_id))]
    pub async fn create_event(
        store: &dyn Store,
        auth_user: &AuthUser,
        dto: CreateEventDto,
    ) -> Result<CalendarEvent, AppError> {
        if let Some(ends_at) = dto.ends_at
            && ends_at < dto.starts_at
        {
            return Err(AppError::bad_request("endsAt must not be before startsAt"));
        }

        if let Some(course_id) = dto.course_id {
            CourseService::find_managed(store, auth_user, course_id).await?;
        }

        let event = store
            .create_event(NewEvent {
                owner_id: auth_user.user_id(),
                course_id: dto.course_id,
                title: dto.title.trim().to_string(),
                description: dto.description,
                starts_at: dto.starts_at,
                ends_at: dto.ends_at,
            })
            .await?;

        info!(event_id = %event.id, "Calendar event created");
        Ok(event)
    }

    pub async fn delete_event(
        store: &dyn Store,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<(), AppError> {
        let event = store
            .find_event(id)
            .await?
            .ok_or_else(|| AppError::not_found("Event not found"))?;

        if !auth_user.owns_or_admin(event.owner_id) {
            let teaches_course = match event.course_id {
                Some(course_id) => store
                    .find_course(course_id)
                    .await?
                    .is_some_and(|c| c.professor_id == auth_user.user_id()),
                None => false,
            };
            if !teaches_course {
                return Err(AppError::forbidden(
                    "Access denied. You can only delete your own events",
                ));
            }
        }

        store.delete_event(id).await?;
        info!(event_id = %id, "Calendar event deleted");
        Ok(())
    }

    /// A `course_id` filter outside the caller's visible courses yields an
    /// empty list rather than an error.
    pub async fn list_assignments(
        store: &dyn Store,
        auth_user: &AuthUser,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Assignment>, AppError> {
        let visible = Self::visible_course_ids(store, auth_user).await?;

        let course_ids = match (visible, course_id) {
            (None, None) => None,
            (None, Some(id)) => Some(vec![id]),
            (Some(ids), None) => Some(ids),
            (Some(ids), Some(id)) => Some(ids.into_iter().filter(|c| *c == id).collect()),
        };

        Ok(store.list_assignments(course_ids.as_deref()).await?)
    }

    /// Creates the assignment and notifies every approved student.
    #[instrument(skip(store, auth_user, dto), fields(course_id = %dto.course_id))]
    pub async fn create_assignment(
        store: &dyn Store,
        auth_user: &AuthUser,
        dto: CreateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let course = CourseService::find_managed(store, auth_user, dto.course_id).await?;

        let assignment = store
            .create_assignment(NewAssignment {
                course_id: course.id,
                title: dto.title.trim().to_string(),
                description: dto.description,
                due_at: dto.due_at,
            })
            .await?;

        let students: Vec<Uuid> = store
            .list_course_enrollments(course.id)
            .await?
            .into_iter()
            .filter(|e| e.status == EnrollmentStatus::Approved)
            .map(|e| e.student_id)
            .collect();

        notify_many(
            store,
            &students,
            NewNotification {
                title: format!("New assignment in {}", course.code),
                body: format!(
                    "{} is due {}",
                    assignment.title,
                    assignment.due_at.format("%Y-%m-%d %H:%M UTC")
                ),
                kind: NotificationKind::Assignment,
            },
        )
        .await;

        info!(assignment_id = %assignment.id, notified = students.len(), "Assignment created");
        Ok(assignment)
    }

    pub async fn delete_assignment(
        store: &dyn Store,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<(), AppError> {
        let assignment = store
            .find_assignment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment not found"))?;

        CourseService::find_managed(store, auth_user, assignment.course_id).await?;

        store.delete_assignment(id).await?;
        info!(assignment_id = %id, "Assignment deleted");
        Ok(())
    }

    /// Events starting and assignments falling due within the next `days`
    /// days, merged in chronological order.
    pub async fn upcoming(
        store: &dyn Store,
        auth_user: &AuthUser,
        days: Option<i64>,
    ) -> Result<Vec<AgendaItem>, AppError> {
        let days = days.unwrap_or(DEFAULT_UPCOMING_DAYS);
        if !(1..=MAX_UPCOMING_DAYS).contains(&days) {
            return Err(AppError::bad_request(format!(
                "days must be between 1 and {MAX_UPCOMING_DAYS}"
            )));
        }

        let now = Utc::now();
        let until = now + Duration::days(days);

        let visible = Self::visible_course_ids(store, auth_user).await?;
        let scope = match &visible {
            None => EventScope::All,
            Some(course_ids) => EventScope::Visible {
                user_id: auth_user.user_id(),
                course_ids: course_ids.clone(),
            },
        };

        let events = store.list_events(&scope, Some(now), Some(until)).await?;
        let assignments = store.list_assignments(visible.as_deref()).await?;

        let mut agenda: Vec<AgendaItem> = events
            .iter()
            .map(AgendaItem::from)
            .chain(
                assignments
                    .iter()
                    .filter(|a| a.due_at >= now && a.due_at <= until)
                    .map(AgendaItem::from),
            )
            .collect();
        agenda.sort_by_key(|item| item.at);
        Ok(agenda)
    }
}
