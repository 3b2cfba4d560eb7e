use axum::{
    Router,
    routing::{get, patch},
};

use super::controller::{get_conversation, get_inbox, mark_messages_read, send_message};
use crate::state::AppState;

pub fn init_chat_router() -> Router<AppState> {
    Router::new()
        .route("/inbox", get(get_inbox))
        .route("/messages", get(get_conversation).post(send_message))
        .route("/messages/read", patch(mark_messages_read))
}
