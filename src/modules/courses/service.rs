use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_core::AppError;
use infralearn_db::Store;
use infralearn_models::courses::{Course, CreateCourseDto, NewCourse, UpdateCourseDto};

use crate::middleware::auth::AuthUser;

pub struct CourseService;

impl CourseService {
    pub async fn find(store: &dyn Store, id: Uuid) -> Result<Course, AppError> {
        store
            .find_course(id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))
    }

    /// Loads the course and requires the caller to teach it or be an
    /// administrator.
    pub async fn find_managed(
        store: &dyn Store,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<Course, AppError> {
        let course = Self::find(store, id).await?;
        if !auth_user.owns_or_admin(course.professor_id) {
            return Err(AppError::forbidden(
                "Access denied. Only the course professor or an administrator can manage this course",
            ));
        }
        Ok(course)
    }

    /// Professors always create courses for themselves; administrators name
    /// the professor explicitly.
    #[instrument(skip(store, auth_user, dto), fields(code = %dto.code))]
    pub async fn create(
        store: &dyn Store,
        auth_user: &AuthUser,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let professor_id = if auth_user.is_admin() {
            let professor_id = dto
                .professor_id
                .ok_or_else(|| AppError::bad_request("professorId is required"))?;

            let professor = store
                .find_identity(professor_id)
                .await?
                .ok_or_else(|| AppError::bad_request("Professor does not exist"))?;
            if professor.role != Role::Professor {
                return Err(AppError::bad_request("professorId must refer to a professor"));
            }
            professor_id
        } else {
            auth_user.user_id()
        };

        let course = store
            .create_course(NewCourse {
                code: dto.code.trim().to_string(),
                title: dto.title,
                description: dto.description,
                professor_id,
            })
            .await?;

        info!(course_id = %course.id, %professor_id, "Course created");
        Ok(course)
    }

    pub async fn list(
        store: &dyn Store,
        professor_id: Option<Uuid>,
    ) -> Result<Vec<Course>, AppError> {
        Ok(store.list_courses(professor_id).await?)
    }

    #[instrument(skip(store, auth_user, dto))]
    pub async fn update(
        store: &dyn Store,
        auth_user: &AuthUser,
        id: Uuid,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        if dto.code.is_none() && dto.title.is_none() && dto.description.is_none() {
            return Err(AppError::bad_request("No changes provided"));
        }

        Self::find_managed(store, auth_user, id).await?;

        store
            .update_course(id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))
    }

    #[instrument(skip(store, auth_user))]
    pub async fn delete(store: &dyn Store, auth_user: &AuthUser, id: Uuid) -> Result<(), AppError> {
        Self::find_managed(store, auth_user, id).await?;

        if !store.delete_course(id).await? {
            return Err(AppError::not_found("Course not found"));
        }
        info!(course_id = %id, "Course deleted");
        Ok(())
    }
}
