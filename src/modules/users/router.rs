use axum::{
    Router,
    routing::{get, patch},
};

use super::controller::{
    bulk_delete_users, bulk_update_users, create_user, delete_user, get_user, get_users,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/bulk", patch(bulk_update_users).delete(bulk_delete_users))
        .route("/{id}", get(get_user).delete(delete_user))
}
