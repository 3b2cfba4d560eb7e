use tracing::{info, instrument, warn};
use uuid::Uuid;

use infralearn_core::{AppError, OneOrMany};
use infralearn_db::Store;
use infralearn_models::notifications::{NewNotification, Notification, NotificationKind};
use infralearn_models::users::BulkResult;

use crate::metrics::track_notifications_created;

pub struct NotificationService;

impl NotificationService {
    pub async fn list(
        store: &dyn Store,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        Ok(store.list_notifications(user_id, unread_only).await?)
    }

    /// Sends the same general notification to every listed user. Unknown
    /// recipients reject the whole batch.
    #[instrument(skip(store, title, body))]
    pub async fn send(
        store: &dyn Store,
        user_ids: Option<OneOrMany<Uuid>>,
        title: String,
        body: String,
    ) -> Result<Vec<Notification>, AppError> {
        let mut user_ids = user_ids.map(OneOrMany::into_vec).unwrap_or_default();
        user_ids.sort();
        user_ids.dedup();
        if user_ids.is_empty() {
            return Err(AppError::bad_request("User IDs are required"));
        }

        let created = store
            .create_notifications(
                &user_ids,
                NewNotification {
                    title,
                    body,
                    kind: NotificationKind::General,
                },
            )
            .await?;

        track_notifications_created(NotificationKind::General.as_str(), created.len());
        info!(recipients = created.len(), "Notifications sent");
        Ok(created)
    }

    pub async fn mark_read(
        store: &dyn Store,
        user_id: Uuid,
        ids: Option<OneOrMany<Uuid>>,
    ) -> Result<BulkResult, AppError> {
        let ids = ids.map(OneOrMany::into_vec).unwrap_or_default();
        if ids.is_empty() {
            return Err(AppError::bad_request("Notification IDs are required"));
        }

        let affected = store.mark_notifications_read(user_id, &ids).await?;
        Ok(BulkResult { affected })
    }

    /// Only the recipient can delete a notification; anyone else gets 404.
    pub async fn delete(store: &dyn Store, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !store.delete_notification(user_id, id).await? {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }
}

/// Notifications raised as a side effect of another action never fail that
/// action; errors are logged.
pub(crate) async fn notify(store: &dyn Store, user_id: Uuid, notification: NewNotification) {
    notify_many(store, &[user_id], notification).await;
}

pub(crate) async fn notify_many(
    store: &dyn Store,
    user_ids: &[Uuid],
    notification: NewNotification,
) {
    if user_ids.is_empty() {
        return;
    }

    let kind = notification.kind;
    match store.create_notifications(user_ids, notification).await {
        Ok(created) => track_notifications_created(kind.as_str(), created.len()),
        Err(e) => warn!(error = %e, kind = kind.as_str(), "Failed to create notification"),
    }
}
