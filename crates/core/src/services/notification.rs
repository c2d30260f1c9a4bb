//! Notification service.

use std::sync::Arc;

use followgraph_common::{AppError, AppResult, IdGenerator, MAX_EXTERNAL_ID_LEN};
use followgraph_db::{
    SocialStore,
    entities::notification::{self, NotificationType},
    repositories::NotificationQuery,
};
use sea_orm::Set;
use tracing::debug;

use crate::services::user_directory::{UserDirectory, UserSummary};

/// Build a new, unseen notification row.
pub(crate) fn new_event(
    id_gen: &IdGenerator,
    recipient_id: &str,
    sender_id: &str,
    notification_type: NotificationType,
    post_id: Option<&str>,
) -> notification::ActiveModel {
    let (id, created_at) = id_gen.generate_stamped();
    notification::ActiveModel {
        id: Set(id),
        recipient_id: Set(recipient_id.to_string()),
        sender_id: Set(sender_id.to_string()),
        notification_type: Set(notification_type),
        post_id: Set(post_id.map(str::to_string)),
        dedupe_key: Set(notification_type.dedupe_key(recipient_id, sender_id)),
        seen: Set(false),
        created_at: Set(created_at.into()),
    }
}

/// Filters for [`NotificationService::feed`].
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    /// Only these types; empty means all.
    pub types: Vec<NotificationType>,
    pub unseen_only: bool,
    pub until_id: Option<String>,
    pub limit: u64,
}

/// A notification with its sender's display attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub notification: notification::Model,
    /// `None` when the sender is no longer in the directory.
    pub sender: Option<UserSummary>,
}

/// Notification service for the read side of the workflow.
#[derive(Clone)]
pub struct NotificationService {
    store: SocialStore,
    directory: Arc<dyn UserDirectory>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(store: SocialStore, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            directory,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a recipient's notifications, newest first, with sender attributes.
    pub async fn feed(&self, recipient_id: &str, query: &FeedQuery) -> AppResult<Vec<FeedEntry>> {
        let notifications = self
            .store
            .notifications()
            .find_by_recipient(
                recipient_id,
                &NotificationQuery {
                    types: &query.types,
                    unseen_only: query.unseen_only,
                    until_id: query.until_id.as_deref(),
                    limit: query.limit,
                },
            )
            .await?;

        let mut sender_ids: Vec<String> =
            notifications.iter().map(|n| n.sender_id.clone()).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();

        let senders = self.directory.summaries(&sender_ids).await?;

        Ok(notifications
            .into_iter()
            .map(|notification| FeedEntry {
                sender: senders.get(&notification.sender_id).cloned(),
                notification,
            })
            .collect())
    }

    /// Mark a notification as seen.
    ///
    /// Returns `false` if the id does not belong to the recipient.
    pub async fn mark_seen(&self, recipient_id: &str, notification_id: &str) -> AppResult<bool> {
        self.store
            .notifications()
            .mark_seen(recipient_id, notification_id)
            .await
    }

    /// Mark all notifications as seen for a recipient.
    pub async fn mark_all_seen(&self, recipient_id: &str) -> AppResult<u64> {
        self.store.notifications().mark_all_seen(recipient_id).await
    }

    /// Count unseen notifications for a recipient.
    pub async fn count_unseen(&self, recipient_id: &str) -> AppResult<u64> {
        self.store.notifications().count_unseen(recipient_id).await
    }

    /// Delete a notification.
    ///
    /// Returns `false` if the id does not belong to the recipient.
    pub async fn delete(&self, recipient_id: &str, notification_id: &str) -> AppResult<bool> {
        self.store
            .notifications()
            .delete(recipient_id, notification_id)
            .await
    }

    /// Record a like, comment or mention on a post.
    ///
    /// Self-notifications are skipped; returns whether an event was written.
    pub async fn notify_post_event(
        &self,
        recipient_id: &str,
        sender_id: &str,
        kind: NotificationType,
        post_id: &str,
    ) -> AppResult<bool> {
        if !kind.is_post_event() {
            return Err(AppError::Validation(format!(
                "{} is not a post event",
                kind.as_str()
            )));
        }

        for (field, value) in [
            ("recipient id", recipient_id),
            ("sender id", sender_id),
            ("post id", post_id),
        ] {
            if value.trim().is_empty() || value.len() > MAX_EXTERNAL_ID_LEN {
                return Err(AppError::Validation(format!(
                    "{field} must be 1 to {MAX_EXTERNAL_ID_LEN} characters"
                )));
            }
        }

        // Don't notify yourself
        if recipient_id == sender_id {
            debug!(user_id = %sender_id, kind = kind.as_str(), "Skipped self notification");
            return Ok(false);
        }

        self.store
            .notifications()
            .insert_deduplicated(new_event(
                &self.id_gen,
                recipient_id,
                sender_id,
                kind,
                Some(post_id),
            ))
            .await
    }
}
