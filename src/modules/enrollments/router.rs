use axum::{
    Router,
    routing::{get, patch},
};

use super::controller::{decide_enrollment, get_my_enrollments};
use crate::state::AppState;

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(get_my_enrollments))
        .route("/{id}", patch(decide_enrollment))
}
