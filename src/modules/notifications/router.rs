use axum::{
    Router,
    routing::{delete, get, patch},
};

use super::controller::{
    delete_notification, get_notifications, mark_notifications_read, send_notification,
};
use crate::state::AppState;

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications).post(send_notification))
        .route("/read", patch(mark_notifications_read))
        .route("/{id}", delete(delete_notification))
}
