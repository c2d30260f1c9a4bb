//! Friendship repository.

use crate::entities::{Friendship, friendship};
use crate::map_db_err;
use followgraph_common::AppResult;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::OnConflict,
};

/// Friendship repository for database operations.
pub struct FriendshipRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> FriendshipRepository<'c, C> {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> FriendshipRepository<'_, C> {
    /// Find the edge `user_id -> friend_id`.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .filter(friendship::Column::FriendId.eq(friend_id))
            .one(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Check if `user_id` follows `friend_id`.
    pub async fn is_following(&self, user_id: &str, friend_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, friend_id).await?.is_some())
    }

    /// Check if either user follows the other.
    pub async fn exists_between(&self, a: &str, b: &str) -> AppResult<bool> {
        if self.is_following(a, b).await? {
            return Ok(true);
        }
        self.is_following(b, a).await
    }

    /// Insert an edge unless it already exists.
    ///
    /// Returns `false` when the edge was already present, which lets retries and
    /// racing callers skip side effects the first writer already produced.
    pub async fn insert_if_absent(&self, model: friendship::ActiveModel) -> AppResult<bool> {
        let inserted = Friendship::insert(model)
            .on_conflict(
                OnConflict::columns([friendship::Column::UserId, friendship::Column::FriendId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(inserted > 0)
    }

    /// Delete the edge `user_id -> friend_id`.
    pub async fn delete_by_pair(&self, user_id: &str, friend_id: &str) -> AppResult<u64> {
        let result = Friendship::delete_many()
            .filter(friendship::Column::UserId.eq(user_id))
            .filter(friendship::Column::FriendId.eq(friend_id))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Delete the edges between `a` and `b`, in either direction.
    pub async fn delete_between(&self, a: &str, b: &str) -> AppResult<u64> {
        let result = Friendship::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(friendship::Column::UserId.eq(a))
                            .add(friendship::Column::FriendId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(friendship::Column::UserId.eq(b))
                            .add(friendship::Column::FriendId.eq(a)),
                    ),
            )
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Get users that a user is following (paginated).
    pub async fn find_following(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<friendship::Model>> {
        let mut query = Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .order_by_desc(friendship::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(friendship::Column::Id.lt(id));
        }

        query.limit(limit).all(self.conn).await.map_err(map_db_err)
    }

    /// Get users that are following a user (paginated).
    pub async fn find_followers(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<friendship::Model>> {
        let mut query = Friendship::find()
            .filter(friendship::Column::FriendId.eq(user_id))
            .order_by_desc(friendship::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(friendship::Column::Id.lt(id));
        }

        query.limit(limit).all(self.conn).await.map_err(map_db_err)
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::FriendId.eq(user_id))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Count following of a user.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }
}
