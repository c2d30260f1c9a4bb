//! Follow request repository.

use crate::entities::{
    FollowRequest,
    follow_request::{self, FollowRequestStatus, ResolvedFollowRequest},
};
use crate::map_db_err;
use followgraph_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Follow request repository for database operations.
pub struct FollowRequestRepository<'c, C> {
    conn: &'c C,
}

/// Rows between `a` and `b`, in either direction.
fn between(a: &str, b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(follow_request::Column::RequesterId.eq(a))
                .add(follow_request::Column::TargetId.eq(b)),
        )
        .add(
            Condition::all()
                .add(follow_request::Column::RequesterId.eq(b))
                .add(follow_request::Column::TargetId.eq(a)),
        )
}

impl<'c, C> FollowRequestRepository<'c, C> {
    /// Create a new follow request repository.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> FollowRequestRepository<'_, C> {
    /// Find a follow request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow_request::Model>> {
        FollowRequest::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Find the pending request from `requester_id` to `target_id`.
    pub async fn find_pending(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<Option<follow_request::Model>> {
        FollowRequest::find()
            .filter(follow_request::Column::RequesterId.eq(requester_id))
            .filter(follow_request::Column::TargetId.eq(target_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .one(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Find a pending request between two users, in either direction.
    pub async fn find_pending_between(
        &self,
        a: &str,
        b: &str,
    ) -> AppResult<Option<follow_request::Model>> {
        FollowRequest::find()
            .filter(between(a, b))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .one(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Check if a pending request exists between two users, in either direction.
    pub async fn exists_pending_between(&self, a: &str, b: &str) -> AppResult<bool> {
        Ok(self.find_pending_between(a, b).await?.is_some())
    }

    /// Create a new follow request.
    ///
    /// A concurrent request for the same pair surfaces as `AppError::Conflict`.
    pub async fn create(
        &self,
        model: follow_request::ActiveModel,
    ) -> AppResult<follow_request::Model> {
        model.insert(self.conn).await.map_err(map_db_err)
    }

    /// Persist a terminal transition and remove the row.
    ///
    /// The status is stamped only while the row is still pending, so of two callers
    /// racing to resolve the same request exactly one gets `true`.
    pub async fn resolve(&self, request: &ResolvedFollowRequest) -> AppResult<bool> {
        let stamped = FollowRequest::update_many()
            .col_expr(
                follow_request::Column::Status,
                Expr::value(request.resolution().status()),
            )
            .filter(follow_request::Column::Id.eq(request.id()))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        if stamped.rows_affected == 0 {
            return Ok(false);
        }

        FollowRequest::delete_many()
            .filter(follow_request::Column::Id.eq(request.id()))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(true)
    }

    /// Delete every request between two users, in either direction.
    ///
    /// Returns the removed rows so callers can clean up what referenced them.
    pub async fn delete_between(&self, a: &str, b: &str) -> AppResult<Vec<follow_request::Model>> {
        let requests = FollowRequest::find()
            .filter(between(a, b))
            .all(self.conn)
            .await
            .map_err(map_db_err)?;

        if requests.is_empty() {
            return Ok(requests);
        }

        FollowRequest::delete_many()
            .filter(follow_request::Column::Id.is_in(requests.iter().map(|r| r.id.as_str())))
            .exec(self.conn)
            .await
            .map_err(map_db_err)?;

        Ok(requests)
    }

    /// Get pending follow requests received by a user (paginated).
    pub async fn find_received(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_request::Model>> {
        let mut query = FollowRequest::find()
            .filter(follow_request::Column::TargetId.eq(user_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .order_by_desc(follow_request::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow_request::Column::Id.lt(id));
        }

        query.limit(limit).all(self.conn).await.map_err(map_db_err)
    }

    /// Get pending follow requests sent by a user (paginated).
    pub async fn find_sent(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_request::Model>> {
        let mut query = FollowRequest::find()
            .filter(follow_request::Column::RequesterId.eq(user_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .order_by_desc(follow_request::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow_request::Column::Id.lt(id));
        }

        query.limit(limit).all(self.conn).await.map_err(map_db_err)
    }

    /// Count pending requests between two users, in either direction.
    pub async fn count_between(&self, a: &str, b: &str) -> AppResult<u64> {
        FollowRequest::find()
            .filter(between(a, b))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }

    /// Count pending follow requests received by a user.
    pub async fn count_received(&self, user_id: &str) -> AppResult<u64> {
        FollowRequest::find()
            .filter(follow_request::Column::TargetId.eq(user_id))
            .filter(follow_request::Column::Status.eq(FollowRequestStatus::Pending))
            .count(self.conn)
            .await
            .map_err(map_db_err)
    }
}
