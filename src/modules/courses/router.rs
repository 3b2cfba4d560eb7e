use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{create_course, delete_course, get_course, get_courses, update_course};
use crate::modules::enrollments::controller::{get_course_enrollments, request_enrollment};
use crate::state::AppState;

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/enroll", post(request_enrollment))
        .route("/{id}/enrollments", get(get_course_enrollments))
}
