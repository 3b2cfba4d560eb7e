use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_core::AppError;
use infralearn_db::Store;
use infralearn_models::enrollments::{Enrollment, EnrollmentStatus};
use infralearn_models::notifications::{NewNotification, NotificationKind};

use crate::metrics::track_enrollment_decision;
use crate::middleware::auth::AuthUser;
use crate::modules::courses::service::CourseService;
use crate::modules::notifications::service::notify;

pub struct EnrollmentService;

impl EnrollmentService {
    /// Files a pending request and tells the professor about it.
    #[instrument(skip(store, auth_user))]
    pub async fn request(
        store: &dyn Store,
        auth_user: &AuthUser,
        course_id: Uuid,
    ) -> Result<Enrollment, AppError> {
        let course = CourseService::find(store, course_id).await?;
        let enrollment = store
            .request_enrollment(course.id, auth_user.user_id())
            .await?;

        notify(
            store,
            course.professor_id,
            NewNotification {
                title: "New enrollment request".to_string(),
                body: format!("{} asked to join {}", auth_user.username(), course.code),
                kind: NotificationKind::Enrollment,
            },
        )
        .await;

        info!(enrollment_id = %enrollment.id, %course_id, "Enrollment requested");
        Ok(enrollment)
    }

    pub async fn list_for_course(
        store: &dyn Store,
        auth_user: &AuthUser,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>, AppError> {
        CourseService::find_managed(store, auth_user, course_id).await?;
        Ok(store.list_course_enrollments(course_id).await?)
    }

    pub async fn list_mine(store: &dyn Store, student_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        Ok(store.list_student_enrollments(student_id).await?)
    }

    /// Approves or rejects a request and notifies the student.
    #[instrument(skip(store, auth_user))]
    pub async fn decide(
        store: &dyn Store,
        auth_user: &AuthUser,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, AppError> {
        if status == EnrollmentStatus::Pending {
            return Err(AppError::bad_request("Status must be approved or rejected"));
        }

        let enrollment = store
            .find_enrollment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Enrollment not found"))?;
        let course = CourseService::find_managed(store, auth_user, enrollment.course_id).await?;

        let decided = store
            .decide_enrollment(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Enrollment not found"))?;

        notify(
            store,
            decided.student_id,
            NewNotification {
                title: format!("Enrollment {}", status),
                body: format!("Your enrollment in {} was {}", course.code, status),
                kind: NotificationKind::Enrollment,
            },
        )
        .await;

        track_enrollment_decision(status.as_str());
        info!(enrollment_id = %id, %status, "Enrollment decided");
        Ok(decided)
    }
}
