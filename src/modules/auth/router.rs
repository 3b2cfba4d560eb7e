use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{check_username, login, logout, me, refresh, register};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/check-username", get(check_username))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
