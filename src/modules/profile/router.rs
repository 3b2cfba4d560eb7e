use axum::{Router, routing::get};

use super::controller::{get_profile, update_profile};
use crate::state::AppState;

pub fn init_profile_router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}
