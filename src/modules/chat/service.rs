use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_core::{AppError, OneOrMany};
use infralearn_db::Store;
use infralearn_models::chat::{Message, NewMessage, SendMessageDto};
use infralearn_models::notifications::{NewNotification, NotificationKind};
use infralearn_models::users::BulkResult;

use crate::metrics::track_message_sent;
use crate::middleware::auth::AuthUser;
use crate::modules::notifications::service::notify;

/// Characters of a message quoted in its notification.
const PREVIEW_LEN: usize = 80;

pub struct ChatService;

impl ChatService {
    pub async fn inbox(store: &dyn Store, user_id: Uuid) -> Result<Vec<Message>, AppError> {
        Ok(store.inbox(user_id).await?)
    }

    pub async fn conversation(
        store: &dyn Store,
        user_id: Uuid,
        with: Option<Uuid>,
    ) -> Result<Vec<Message>, AppError> {
        let with = with.ok_or_else(|| AppError::bad_request("with is required"))?;
        Ok(store.conversation(user_id, with).await?)
    }

    #[instrument(skip(store, auth_user, dto), fields(recipient_id = %dto.recipient_id))]
    pub async fn send(
        store: &dyn Store,
        auth_user: &AuthUser,
        dto: SendMessageDto,
    ) -> Result<Message, AppError> {
        if dto.recipient_id == auth_user.user_id() {
            return Err(AppError::bad_request("Cannot send a message to yourself"));
        }

        if store.find_identity(dto.recipient_id).await?.is_none() {
            return Err(AppError::not_found("Recipient not found"));
        }

        let content = dto.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::bad_request("Message cannot be empty"));
        }

        let message = store
            .send_message(NewMessage {
                sender_id: auth_user.user_id(),
                recipient_id: dto.recipient_id,
                content,
            })
            .await?;

        notify(
            store,
            message.recipient_id,
            NewNotification {
                title: format!("New message from {}", auth_user.username()),
                body: preview(&message.content),
                kind: NotificationKind::Message,
            },
        )
        .await;

        track_message_sent();
        info!(message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// Only messages addressed to the caller are affected.
    pub async fn mark_read(
        store: &dyn Store,
        user_id: Uuid,
        ids: Option<OneOrMany<Uuid>>,
    ) -> Result<BulkResult, AppError> {
        let ids = ids.map(OneOrMany::into_vec).unwrap_or_default();
        if ids.is_empty() {
            return Err(AppError::bad_request("Message IDs are required"));
        }

        let affected = store.mark_messages_read(user_id, &ids).await?;
        Ok(BulkResult { affected })
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_LEN {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(PREVIEW_LEN).collect();
    preview.push('…');
    preview
}
