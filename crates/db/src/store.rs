//! Store handles: the shared pool and the transactional unit of work.

use std::sync::Arc;

use followgraph_common::AppResult;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::map_db_err;
use crate::repositories::{
    FollowRequestRepository, FriendshipRepository, NotificationRepository, UserRepository,
};

/// Pool-backed access to every collection.
#[derive(Clone)]
pub struct SocialStore {
    db: Arc<DatabaseConnection>,
}

impl SocialStore {
    /// Create a new store over a shared connection pool.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// User directory table.
    #[must_use]
    pub fn users(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(self.db.as_ref())
    }

    /// Follow requests.
    #[must_use]
    pub fn follow_requests(&self) -> FollowRequestRepository<'_, DatabaseConnection> {
        FollowRequestRepository::new(self.db.as_ref())
    }

    /// Friendship edges.
    #[must_use]
    pub fn friendships(&self) -> FriendshipRepository<'_, DatabaseConnection> {
        FriendshipRepository::new(self.db.as_ref())
    }

    /// Notification events.
    #[must_use]
    pub fn notifications(&self) -> NotificationRepository<'_, DatabaseConnection> {
        NotificationRepository::new(self.db.as_ref())
    }

    /// Start a unit of work spanning all collections.
    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        Ok(UnitOfWork { txn })
    }
}

/// A single transaction over requests, edges and notifications.
///
/// Dropping it without [`UnitOfWork::commit`] rolls every write back.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// User directory table, inside this transaction.
    #[must_use]
    pub const fn users(&self) -> UserRepository<'_, DatabaseTransaction> {
        UserRepository::new(&self.txn)
    }

    /// Follow requests, inside this transaction.
    #[must_use]
    pub const fn follow_requests(&self) -> FollowRequestRepository<'_, DatabaseTransaction> {
        FollowRequestRepository::new(&self.txn)
    }

    /// Friendship edges, inside this transaction.
    #[must_use]
    pub const fn friendships(&self) -> FriendshipRepository<'_, DatabaseTransaction> {
        FriendshipRepository::new(&self.txn)
    }

    /// Notification events, inside this transaction.
    #[must_use]
    pub const fn notifications(&self) -> NotificationRepository<'_, DatabaseTransaction> {
        NotificationRepository::new(&self.txn)
    }

    /// Commit every write made through this unit of work.
    pub async fn commit(self) -> AppResult<()> {
        self.txn.commit().await.map_err(map_db_err)
    }

    /// Discard every write made through this unit of work.
    pub async fn rollback(self) -> AppResult<()> {
        self.txn.rollback().await.map_err(map_db_err)
    }
}
