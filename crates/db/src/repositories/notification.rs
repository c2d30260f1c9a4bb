//! Notification repository.

use crate::entities::{
    Notification,
    notification::{self, NotificationType},
};
use crate::map_db_err;
use followgraph_common::AppResult;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};

/// Filters for reading a recipient's notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery<'a> {
    /// Only these types; empty means every type.
    pub types: &'a [NotificationType],
    /// Only events not yet seen.
    pub unseen_only: bool,
    /// Cursor: only events with an id below this one.
    pub until_id: Option<&'a str>,
    /// Page size.
    pub limit: u64,
}

/// Notification repository for database operations.
pub struct NotificationRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> NotificationRepository<'c, C> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> NotificationRepository<'_, C> {
    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a notification, skipping it if a live duplicate already exists.
    ///
    /// Only rows carrying a `dedupe_key` can collide; returns whether a row was
    /// written.
    pub async fn insert_deduplicated(&self, model: notification::ActiveModel) -> AppResult<bool> {
        let inserted = Notification::insert(model)
            .on_conflict(
                OnConflict::column(notification::Column::DedupeKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(inserted > 0)
    }

    /// Delete the events of one type sent by `sender_id` to `recipient_id`.
    pub async fn delete_matching(
        &self,
        recipient_id: &str,
        sender_id: &str,
        notification_type: NotificationType,
    ) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::SenderId.eq(sender_id))
            .filter(notification::Column::NotificationType.eq(notification_type))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Count the events of one type sent by `sender_id` to `recipient_id`.
    pub async fn count_matching(
        &self,
        recipient_id: &str,
        sender_id: &str,
        notification_type: NotificationType,
    ) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::SenderId.eq(sender_id))
            .filter(notification::Column::NotificationType.eq(notification_type))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Get notifications for a recipient, newest first.
    ///
    /// Ordered by id alone so the sort key matches the `until_id` cursor; ULIDs
    /// carry their creation time, so this is also creation order.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
        query: &NotificationQuery<'_>,
    ) -> AppResult<Vec<notification::Model>> {
        let mut select = Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notification::Column::Id);

        if !query.types.is_empty() {
            select = select.filter(
                notification::Column::NotificationType.is_in(query.types.iter().copied()),
            );
        }

        if query.unseen_only {
            select = select.filter(notification::Column::Seen.eq(false));
        }

        if let Some(id) = query.until_id {
            select = select.filter(notification::Column::Id.lt(id));
        }

        select
            .limit(query.limit)
            .all(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Mark a notification as seen.
    ///
    /// Scoped to the recipient; returns whether a row was updated.
    pub async fn mark_seen(&self, recipient_id: &str, id: &str) -> AppResult<bool> {
        let result = Notification::update_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .col_expr(notification::Column::Seen, true.into())
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    /// Mark all notifications as seen for a recipient.
    pub async fn mark_all_seen(&self, recipient_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::Seen.eq(false))
            .col_expr(notification::Column::Seen, true.into())
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Count unseen notifications for a recipient.
    pub async fn count_unseen(&self, recipient_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::Seen.eq(false))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Delete a notification owned by a recipient.
    pub async fn delete(&self, recipient_id: &str, id: &str) -> AppResult<bool> {
        let result = Notification::delete_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}
