use axum::{
    Router,
    routing::{delete, get},
};

use super::controller::{
    create_assignment, create_event, delete_assignment, delete_event, get_assignments, get_events,
    get_upcoming,
};
use crate::state::AppState;

pub fn init_calendar_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(get_events).post(create_event))
        .route("/events/{id}", delete(delete_event))
        .route("/assignments", get(get_assignments).post(create_assignment))
        .route("/assignments/{id}", delete(delete_assignment))
        .route("/upcoming", get(get_upcoming))
}
