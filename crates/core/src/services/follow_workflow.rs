//! Follow workflow service.
//!
//! Coordinates the three collections behind a follow: pending requests,
//! directed friendship edges and notification events. Every multi-step
//! mutation runs inside one [`UnitOfWork`], and the store's unique indexes
//! close the races between the read-side checks and the inserts.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use followgraph_common::{AppError, AppResult, IdGenerator, MAX_EXTERNAL_ID_LEN, pair_key};
use followgraph_db::{
    SocialStore, UnitOfWork,
    entities::{
        follow_request::{self, FollowRequestStatus, PendingFollowRequest},
        friendship,
        notification::NotificationType,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::services::notification::new_event;
use crate::services::user_directory::UserDirectory;

const ALREADY_FOLLOWING: &str = "already following";
const REQUEST_ALREADY_PENDING: &str = "request already pending";
const REQUEST_NOT_FOUND: &str = "follow request not found";
const CANNOT_FOLLOW_YOURSELF: &str = "cannot follow yourself";
const USER_ID_REQUIRED: &str = "user id is required";
const USER_ID_TOO_LONG: &str = "user id is too long";

/// Structured result of a public workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationResult {
    /// Successful result without a message.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Failed result carrying an advisory message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Which side of a relationship [`FollowWorkflowService::remove`] deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoveScope {
    /// Pending follow requests between the pair.
    Requested,
    /// The requester's friendship edge.
    Following,
}

/// Returned for a scope string other than `requested` or `following`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown remove scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for RemoveScope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "following" => Ok(Self::Following),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// What an accepted request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptOutcome {
    /// Whether a `follow_back` suggestion was sent to the accepting user.
    pub follow_back_suggested: bool,
}

/// Result of a follow back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowBackOutcome {
    /// The edge was created by this call.
    Followed,
    /// The edge already existed; nothing was written.
    AlreadyFollowing,
}

/// Rows deleted by a remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub requests_removed: u64,
    pub edges_removed: u64,
}

/// Relationship between a viewer and another user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// The viewer follows the other user.
    pub following: bool,
    /// The other user follows the viewer.
    pub followed_by: bool,
    /// The viewer has a pending request to the other user.
    pub request_sent: bool,
    /// The other user has a pending request to the viewer.
    pub request_received: bool,
}

/// Follow workflow service for business logic.
#[derive(Clone)]
pub struct FollowWorkflowService {
    store: SocialStore,
    directory: Arc<dyn UserDirectory>,
    id_gen: IdGenerator,
}

impl FollowWorkflowService {
    /// Create a new follow workflow service.
    #[must_use]
    pub fn new(store: SocialStore, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            directory,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Workflow ====================

    /// Send a follow request from `requester_id` to `target_id`.
    ///
    /// Fails with `Conflict` if either user already follows the other or a
    /// request is pending in either direction.
    pub async fn send_request(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<follow_request::Model> {
        validate_pair(requester_id, target_id)?;
        self.ensure_exists(requester_id).await?;
        self.ensure_exists(target_id).await?;

        if self
            .store
            .friendships()
            .exists_between(requester_id, target_id)
            .await?
        {
            return Err(AppError::Conflict(ALREADY_FOLLOWING.to_string()));
        }

        if self
            .store
            .follow_requests()
            .exists_pending_between(requester_id, target_id)
            .await?
        {
            return Err(AppError::Conflict(REQUEST_ALREADY_PENDING.to_string()));
        }

        let model = follow_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            requester_id: Set(requester_id.to_string()),
            target_id: Set(target_id.to_string()),
            pair_key: Set(pair_key(requester_id, target_id)),
            status: Set(FollowRequestStatus::Pending),
            created_at: Set(Utc::now().into()),
        };

        let uow = self.store.begin().await?;

        // A concurrent request for the pair won the unique index
        let created = uow.follow_requests().create(model).await;
        let request = match created {
            Ok(request) => request,
            Err(AppError::Conflict(_)) => {
                uow.rollback().await?;
                return Err(AppError::Conflict(REQUEST_ALREADY_PENDING.to_string()));
            }
            Err(e) => return Err(e),
        };

        uow.notifications()
            .insert_deduplicated(new_event(
                &self.id_gen,
                target_id,
                requester_id,
                NotificationType::FollowRequest,
                None,
            ))
            .await?;

        uow.commit().await?;

        info!(
            request_id = %request.id,
            requester_id = %requester_id,
            target_id = %target_id,
            "Follow request sent"
        );

        Ok(request)
    }

    /// Accept the pending request from `requester_id` to `target_id`.
    ///
    /// Creates the edge `requester -> target`, replaces the `follow_request`
    /// event with a `friend_accepted` event for the requester, and suggests a
    /// follow back to the target unless they already follow the requester.
    pub async fn accept_request(
        &self,
        target_id: &str,
        requester_id: &str,
    ) -> AppResult<AcceptOutcome> {
        validate_pair(target_id, requester_id)?;

        let uow = self.store.begin().await?;
        let pending = load_pending(&uow, requester_id, target_id).await?;

        if !uow.follow_requests().resolve(&pending.accept()).await? {
            return Err(AppError::NotFound(REQUEST_NOT_FOUND.to_string()));
        }

        uow.friendships()
            .insert_if_absent(self.new_edge(requester_id, target_id))
            .await?;

        let followed_back = uow
            .friendships()
            .is_following(target_id, requester_id)
            .await?;

        uow.notifications()
            .delete_matching(target_id, requester_id, NotificationType::FollowRequest)
            .await?;

        uow.notifications()
            .insert_deduplicated(new_event(
                &self.id_gen,
                requester_id,
                target_id,
                NotificationType::FriendAccepted,
                None,
            ))
            .await?;

        if !followed_back {
            uow.notifications()
                .insert_deduplicated(new_event(
                    &self.id_gen,
                    target_id,
                    requester_id,
                    NotificationType::FollowBack,
                    None,
                ))
                .await?;
        }

        uow.commit().await?;

        info!(
            requester_id = %requester_id,
            target_id = %target_id,
            follow_back_suggested = !followed_back,
            "Follow request accepted"
        );

        Ok(AcceptOutcome {
            follow_back_suggested: !followed_back,
        })
    }

    /// Reject the pending request from `requester_id` to `target_id`.
    ///
    /// No friendship edge is touched.
    pub async fn reject_request(&self, target_id: &str, requester_id: &str) -> AppResult<()> {
        validate_pair(target_id, requester_id)?;

        let uow = self.store.begin().await?;
        let pending = load_pending(&uow, requester_id, target_id).await?;

        if !uow.follow_requests().resolve(&pending.reject()).await? {
            return Err(AppError::NotFound(REQUEST_NOT_FOUND.to_string()));
        }

        uow.notifications()
            .delete_matching(target_id, requester_id, NotificationType::FollowRequest)
            .await?;

        uow.commit().await?;

        info!(
            requester_id = %requester_id,
            target_id = %target_id,
            "Follow request rejected"
        );

        Ok(())
    }

    /// Make `user_id` follow `follower_id` back.
    ///
    /// Idempotent: when the edge already exists nothing is written. A request
    /// still pending from `user_id` to `follower_id` is settled by the new edge
    /// and removed together with its event.
    pub async fn follow_back(
        &self,
        user_id: &str,
        follower_id: &str,
    ) -> AppResult<FollowBackOutcome> {
        validate_pair(user_id, follower_id)?;
        self.ensure_exists(user_id).await?;
        self.ensure_exists(follower_id).await?;

        let uow = self.store.begin().await?;

        if uow.friendships().is_following(user_id, follower_id).await? {
            debug!(user_id = %user_id, follower_id = %follower_id, "Already following back");
            return Ok(FollowBackOutcome::AlreadyFollowing);
        }

        // Zero rows means a concurrent follow back got there first and owns the events
        if !uow
            .friendships()
            .insert_if_absent(self.new_edge(user_id, follower_id))
            .await?
        {
            debug!(user_id = %user_id, follower_id = %follower_id, "Lost follow back race");
            return Ok(FollowBackOutcome::AlreadyFollowing);
        }

        uow.notifications()
            .delete_matching(user_id, follower_id, NotificationType::FollowBack)
            .await?;

        if let Some(stale) = uow
            .follow_requests()
            .find_pending(user_id, follower_id)
            .await?
        {
            let stale = PendingFollowRequest::try_from(stale)?;
            uow.follow_requests().resolve(&stale.accept()).await?;
            uow.notifications()
                .delete_matching(follower_id, user_id, NotificationType::FollowRequest)
                .await?;
            debug!(user_id = %user_id, follower_id = %follower_id, "Settled stale follow request");
        }

        uow.notifications()
            .insert_deduplicated(new_event(
                &self.id_gen,
                follower_id,
                user_id,
                NotificationType::FollowedYouBack,
                None,
            ))
            .await?;

        uow.commit().await?;

        info!(user_id = %user_id, follower_id = %follower_id, "Followed back");

        Ok(FollowBackOutcome::Followed)
    }

    /// Remove requests and/or follow edges between two users.
    ///
    /// Both scopes match the pair in either direction. `Requested` deletes
    /// pending requests along with their `follow_request` events, `Following`
    /// deletes the edges, and `None` does both. No notifications are emitted.
    pub async fn remove(
        &self,
        requester_id: &str,
        target_id: &str,
        scope: Option<RemoveScope>,
    ) -> AppResult<RemoveOutcome> {
        validate_pair(requester_id, target_id)?;

        let uow = self.store.begin().await?;
        let mut outcome = RemoveOutcome::default();

        if scope != Some(RemoveScope::Following) {
            let removed = uow
                .follow_requests()
                .delete_between(requester_id, target_id)
                .await?;

            for request in &removed {
                uow.notifications()
                    .delete_matching(
                        &request.target_id,
                        &request.requester_id,
                        NotificationType::FollowRequest,
                    )
                    .await?;
            }

            outcome.requests_removed = removed.len() as u64;
        }

        if scope != Some(RemoveScope::Requested) {
            outcome.edges_removed = uow
                .friendships()
                .delete_between(requester_id, target_id)
                .await?;
        }

        uow.commit().await?;

        info!(
            requester_id = %requester_id,
            target_id = %target_id,
            scope = ?scope,
            requests_removed = outcome.requests_removed,
            edges_removed = outcome.edges_removed,
            "Removed follow relationship"
        );

        Ok(outcome)
    }

    /// Drop `follower_id` from `user_id`'s followers.
    ///
    /// Returns whether an edge was removed.
    pub async fn remove_follower(&self, user_id: &str, follower_id: &str) -> AppResult<bool> {
        validate_pair(user_id, follower_id)?;

        let removed = self
            .store
            .friendships()
            .delete_by_pair(follower_id, user_id)
            .await?;

        if removed > 0 {
            info!(user_id = %user_id, follower_id = %follower_id, "Removed follower");
        }

        Ok(removed > 0)
    }

    // ==================== Reads ====================

    /// Relationship between `viewer_id` and `other_id`.
    pub async fn relationship(&self, viewer_id: &str, other_id: &str) -> AppResult<Relationship> {
        let edges = self.store.friendships();
        let requests = self.store.follow_requests();

        Ok(Relationship {
            following: edges.is_following(viewer_id, other_id).await?,
            followed_by: edges.is_following(other_id, viewer_id).await?,
            request_sent: requests.find_pending(viewer_id, other_id).await?.is_some(),
            request_received: requests.find_pending(other_id, viewer_id).await?.is_some(),
        })
    }

    /// Pending requests addressed to a user, newest first.
    pub async fn pending_received(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_request::Model>> {
        self.store
            .follow_requests()
            .find_received(user_id, limit, until_id)
            .await
    }

    /// Pending requests sent by a user, newest first.
    pub async fn pending_sent(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_request::Model>> {
        self.store
            .follow_requests()
            .find_sent(user_id, limit, until_id)
            .await
    }

    /// Edges pointing at a user, newest first.
    pub async fn followers(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<friendship::Model>> {
        self.store
            .friendships()
            .find_followers(user_id, limit, until_id)
            .await
    }

    /// Edges leaving a user, newest first.
    pub async fn following(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<friendship::Model>> {
        self.store
            .friendships()
            .find_following(user_id, limit, until_id)
            .await
    }

    /// Check if `user_id` follows `friend_id`.
    pub async fn is_following(&self, user_id: &str, friend_id: &str) -> AppResult<bool> {
        self.store.friendships().is_following(user_id, friend_id).await
    }

    // ==================== Structured results ====================

    /// [`Self::send_request`] as a structured result.
    pub async fn send_follow_request(&self, requester_id: &str, target_id: &str) -> OperationResult {
        match self.send_request(requester_id, target_id).await {
            Ok(_) => OperationResult::ok(),
            Err(e) => {
                report("send_follow_request", &e);
                OperationResult::failed(e.user_message())
            }
        }
    }

    /// [`Self::accept_request`] as a boolean.
    pub async fn accept_follow_request(&self, target_id: &str, requester_id: &str) -> bool {
        match self.accept_request(target_id, requester_id).await {
            Ok(_) => true,
            Err(e) => {
                report("accept_follow_request", &e);
                false
            }
        }
    }

    /// [`Self::reject_request`] as a boolean.
    pub async fn reject_follow_request(&self, target_id: &str, requester_id: &str) -> bool {
        match self.reject_request(target_id, requester_id).await {
            Ok(()) => true,
            Err(e) => {
                report("reject_follow_request", &e);
                false
            }
        }
    }

    /// [`Self::follow_back`] as a structured result.
    pub async fn follow_back_user(&self, user_id: &str, follower_id: &str) -> OperationResult {
        match self.follow_back(user_id, follower_id).await {
            Ok(_) => OperationResult::ok(),
            Err(e) => {
                report("follow_back_user", &e);
                OperationResult::failed(e.user_message())
            }
        }
    }

    /// [`Self::remove`] as a structured result, with the scope given by name.
    pub async fn remove_follow_request(
        &self,
        requester_id: &str,
        target_id: &str,
        scope: Option<&str>,
    ) -> OperationResult {
        let scope = match scope.map(str::parse::<RemoveScope>).transpose() {
            Ok(scope) => scope,
            Err(e) => {
                let e = AppError::Validation(e.to_string());
                report("remove_follow_request", &e);
                return OperationResult::failed(e.user_message());
            }
        };

        match self.remove(requester_id, target_id, scope).await {
            Ok(_) => OperationResult::ok(),
            Err(e) => {
                report("remove_follow_request", &e);
                OperationResult::failed(e.user_message())
            }
        }
    }

    // ==================== Helpers ====================

    async fn ensure_exists(&self, user_id: &str) -> AppResult<()> {
        if self.directory.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound(user_id.to_string()))
        }
    }

    fn new_edge(&self, user_id: &str, friend_id: &str) -> friendship::ActiveModel {
        friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            friend_id: Set(friend_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }
}

fn validate_pair(a: &str, b: &str) -> AppResult<()> {
    if a.trim().is_empty() || b.trim().is_empty() {
        return Err(AppError::Validation(USER_ID_REQUIRED.to_string()));
    }
    if a.len() > MAX_EXTERNAL_ID_LEN || b.len() > MAX_EXTERNAL_ID_LEN {
        return Err(AppError::Validation(USER_ID_TOO_LONG.to_string()));
    }
    if a == b {
        return Err(AppError::Validation(CANNOT_FOLLOW_YOURSELF.to_string()));
    }
    Ok(())
}

async fn load_pending(
    uow: &UnitOfWork,
    requester_id: &str,
    target_id: &str,
) -> AppResult<PendingFollowRequest> {
    let model = uow
        .follow_requests()
        .find_pending(requester_id, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound(REQUEST_NOT_FOUND.to_string()))?;

    Ok(PendingFollowRequest::try_from(model)?)
}

fn report(operation: &'static str, err: &AppError) {
    if err.is_server_error() {
        error!(operation, error = %err, "Follow workflow operation failed");
    } else {
        warn!(operation, error = %err, "Follow workflow operation rejected");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::user_directory::DbUserDirectory;
    use followgraph_db::repositories::NotificationQuery;
    use followgraph_db::test_utils::TestDatabase;

    async fn setup(users: &[&str]) -> (TestDatabase, FollowWorkflowService) {
        let db = TestDatabase::in_memory().await.unwrap();
        for id in users {
            db.seed_user(id, id).await.unwrap();
        }
        let directory = Arc::new(DbUserDirectory::new(db.store()));
        let service = FollowWorkflowService::new(db.store(), directory);
        (db, service)
    }

    async fn events(db: &TestDatabase, recipient: &str, ty: NotificationType) -> u64 {
        let store = db.store();
        let found = store
            .notifications()
            .find_by_recipient(
                recipient,
                &NotificationQuery {
                    types: &[ty],
                    limit: 100,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        found.len() as u64
    }

    async fn pending(db: &TestDatabase, a: &str, b: &str) -> u64 {
        db.store().follow_requests().count_between(a, b).await.unwrap()
    }

    async fn edge(db: &TestDatabase, from: &str, to: &str) -> bool {
        db.store().friendships().is_following(from, to).await.unwrap()
    }

    #[tokio::test]
    async fn test_send_request_twice_yields_one_pending() {
        let (db, service) = setup(&["a", "b"]).await;

        assert_eq!(service.send_follow_request("a", "b").await, OperationResult::ok());
        assert_eq!(
            service.send_follow_request("a", "b").await,
            OperationResult::failed("request already pending")
        );

        assert_eq!(pending(&db, "a", "b").await, 1);
        assert_eq!(events(&db, "b", NotificationType::FollowRequest).await, 1);
    }

    #[tokio::test]
    async fn test_send_request_blocks_crossed_request() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        let err = service.send_request("b", "a").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == "request already pending"));
        assert_eq!(pending(&db, "a", "b").await, 1);
    }

    #[tokio::test]
    async fn test_send_request_to_self_fails_validation() {
        let (db, service) = setup(&["a"]).await;

        let result = service.send_follow_request("a", "a").await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("cannot follow yourself"));

        let err = service.send_request("a", "a").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(pending(&db, "a", "a").await, 0);
    }

    #[tokio::test]
    async fn test_send_request_rejects_empty_and_unknown_users() {
        let (_db, service) = setup(&["a"]).await;

        assert!(matches!(
            service.send_request("", "a").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.send_request("a", "ghost").await,
            Err(AppError::UserNotFound(id)) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_overlong_user_id_fails_validation() {
        let (db, service) = setup(&["a"]).await;
        let long_id = "u".repeat(MAX_EXTERNAL_ID_LEN + 1);

        assert!(matches!(
            service.send_request("a", &long_id).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            service.send_follow_request(&long_id, "a").await,
            OperationResult::failed("user id is too long")
        );
        assert_eq!(pending(&db, "a", &long_id).await, 0);
    }

    #[tokio::test]
    async fn test_send_request_when_already_following_either_way() {
        let (_db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        service.accept_request("b", "a").await.unwrap();

        assert_eq!(
            service.send_follow_request("a", "b").await,
            OperationResult::failed("already following")
        );
        // Edge a -> b also blocks b -> a
        assert_eq!(
            service.send_follow_request("b", "a").await,
            OperationResult::failed("already following")
        );
    }

    #[tokio::test]
    async fn test_accept_end_to_end() {
        let (db, service) = setup(&["u1", "u2"]).await;

        // Step 1: u1 asks u2
        service.send_request("u1", "u2").await.unwrap();
        assert_eq!(pending(&db, "u1", "u2").await, 1);
        assert_eq!(events(&db, "u2", NotificationType::FollowRequest).await, 1);

        // Step 2: u2 accepts
        let outcome = service.accept_request("u2", "u1").await.unwrap();
        assert!(outcome.follow_back_suggested);

        assert!(edge(&db, "u1", "u2").await);
        assert!(!edge(&db, "u2", "u1").await);
        assert_eq!(pending(&db, "u1", "u2").await, 0);
        assert_eq!(events(&db, "u2", NotificationType::FollowRequest).await, 0);
        assert_eq!(events(&db, "u1", NotificationType::FriendAccepted).await, 1);
        assert_eq!(events(&db, "u2", NotificationType::FollowBack).await, 1);
    }

    #[tokio::test]
    async fn test_accept_skips_follow_back_when_reverse_edge_exists() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        // b already follows a through the public direct-follow path
        db.store()
            .friendships()
            .insert_if_absent(service.new_edge("b", "a"))
            .await
            .unwrap();

        let outcome = service.accept_request("b", "a").await.unwrap();

        assert!(!outcome.follow_back_suggested);
        assert_eq!(events(&db, "b", NotificationType::FollowBack).await, 0);
        assert_eq!(events(&db, "a", NotificationType::FriendAccepted).await, 1);
    }

    #[tokio::test]
    async fn test_accept_missing_request_writes_nothing() {
        let (db, service) = setup(&["a", "b"]).await;

        assert!(matches!(
            service.accept_request("b", "a").await,
            Err(AppError::NotFound(_))
        ));
        assert!(!service.accept_follow_request("b", "a").await);

        assert!(!edge(&db, "a", "b").await);
        assert_eq!(events(&db, "a", NotificationType::FriendAccepted).await, 0);
    }

    #[tokio::test]
    async fn test_second_accept_creates_no_duplicates() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        assert!(service.accept_follow_request("b", "a").await);
        assert!(!service.accept_follow_request("b", "a").await);

        assert_eq!(db.store().friendships().count_following("a").await.unwrap(), 1);
        assert_eq!(events(&db, "a", NotificationType::FriendAccepted).await, 1);
        assert_eq!(events(&db, "b", NotificationType::FollowBack).await, 1);
    }

    #[tokio::test]
    async fn test_accept_only_by_the_target() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        // The requester cannot accept their own request
        assert!(!service.accept_follow_request("a", "b").await);
        assert_eq!(pending(&db, "a", "b").await, 1);
    }

    #[tokio::test]
    async fn test_reject_leaves_edges_unchanged() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        assert!(service.reject_follow_request("b", "a").await);

        assert_eq!(pending(&db, "a", "b").await, 0);
        assert_eq!(events(&db, "b", NotificationType::FollowRequest).await, 0);
        assert!(!edge(&db, "a", "b").await);
        assert!(!edge(&db, "b", "a").await);

        // Rejected requests can be sent again
        assert!(service.send_follow_request("a", "b").await.success);
    }

    #[tokio::test]
    async fn test_reject_missing_request_writes_nothing() {
        let (db, service) = setup(&["a", "b"]).await;

        assert!(matches!(
            service.reject_request("b", "a").await,
            Err(AppError::NotFound(_))
        ));
        assert!(!service.reject_follow_request("b", "a").await);

        assert_eq!(pending(&db, "a", "b").await, 0);
        assert!(!edge(&db, "a", "b").await);
        assert_eq!(db.store().notifications().count_unseen("a").await.unwrap(), 0);
        assert_eq!(db.store().notifications().count_unseen("b").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reject_after_accept_is_not_found() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        service.accept_request("b", "a").await.unwrap();

        assert!(matches!(
            service.reject_request("b", "a").await,
            Err(AppError::NotFound(_))
        ));

        // The accepted edge and its events survive
        assert!(edge(&db, "a", "b").await);
        assert_eq!(events(&db, "a", NotificationType::FriendAccepted).await, 1);
        assert_eq!(events(&db, "b", NotificationType::FollowBack).await, 1);
    }

    #[tokio::test]
    async fn test_follow_back_is_idempotent() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        service.accept_request("b", "a").await.unwrap();

        assert_eq!(
            service.follow_back("b", "a").await.unwrap(),
            FollowBackOutcome::Followed
        );
        assert!(edge(&db, "b", "a").await);
        assert_eq!(events(&db, "b", NotificationType::FollowBack).await, 0);
        assert_eq!(events(&db, "a", NotificationType::FollowedYouBack).await, 1);

        // Edge already exists: success, no writes
        assert_eq!(service.follow_back_user("b", "a").await, OperationResult::ok());
        assert_eq!(
            service.follow_back("b", "a").await.unwrap(),
            FollowBackOutcome::AlreadyFollowing
        );
        assert_eq!(db.store().friendships().count_following("b").await.unwrap(), 1);
        assert_eq!(events(&db, "a", NotificationType::FollowedYouBack).await, 1);
    }

    #[tokio::test]
    async fn test_follow_back_settles_stale_request() {
        let (db, service) = setup(&["a", "b"]).await;

        // b asked to follow a, then a's edge to b appeared out of band
        service.send_request("b", "a").await.unwrap();
        db.store()
            .friendships()
            .insert_if_absent(service.new_edge("a", "b"))
            .await
            .unwrap();

        service.follow_back("b", "a").await.unwrap();

        assert!(edge(&db, "b", "a").await);
        assert_eq!(pending(&db, "a", "b").await, 0);
        assert_eq!(events(&db, "a", NotificationType::FollowRequest).await, 0);
    }

    #[tokio::test]
    async fn test_follow_back_validation() {
        let (_db, service) = setup(&["a"]).await;

        let result = service.follow_back_user("a", "a").await;
        assert!(!result.success);
        assert!(matches!(
            service.follow_back("a", "ghost").await,
            Err(AppError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_requested_keeps_edges() {
        let (db, service) = setup(&["a", "b", "c"]).await;

        service.send_request("a", "b").await.unwrap();
        service.accept_request("b", "a").await.unwrap();
        service.send_request("c", "a").await.unwrap();

        let outcome = service
            .remove("a", "c", Some(RemoveScope::Requested))
            .await
            .unwrap();

        // The pending c -> a request is matched from either side
        assert_eq!(outcome.requests_removed, 1);
        assert_eq!(outcome.edges_removed, 0);
        assert_eq!(pending(&db, "a", "c").await, 0);
        assert_eq!(events(&db, "a", NotificationType::FollowRequest).await, 0);

        service
            .remove("a", "b", Some(RemoveScope::Requested))
            .await
            .unwrap();
        assert!(edge(&db, "a", "b").await);
    }

    #[tokio::test]
    async fn test_remove_following_keeps_requests() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        db.store()
            .friendships()
            .insert_if_absent(service.new_edge("a", "b"))
            .await
            .unwrap();

        let outcome = service
            .remove("a", "b", Some(RemoveScope::Following))
            .await
            .unwrap();

        assert_eq!(outcome.edges_removed, 1);
        assert!(!edge(&db, "a", "b").await);
        assert_eq!(pending(&db, "a", "b").await, 1);
    }

    #[tokio::test]
    async fn test_remove_following_drops_edges_both_ways() {
        let (db, service) = setup(&["a", "b", "c"]).await;

        for (from, to) in [("a", "b"), ("b", "a"), ("c", "a")] {
            db.store()
                .friendships()
                .insert_if_absent(service.new_edge(from, to))
                .await
                .unwrap();
        }

        let outcome = service
            .remove("a", "b", Some(RemoveScope::Following))
            .await
            .unwrap();

        assert_eq!(outcome.edges_removed, 2);
        assert!(!edge(&db, "a", "b").await);
        assert!(!edge(&db, "b", "a").await);
        // Edges outside the pair are untouched
        assert!(edge(&db, "c", "a").await);
    }

    #[tokio::test]
    async fn test_remove_without_scope_removes_both() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        db.store()
            .friendships()
            .insert_if_absent(service.new_edge("a", "b"))
            .await
            .unwrap();

        assert_eq!(
            service.remove_follow_request("a", "b", None).await,
            OperationResult::ok()
        );
        assert!(!edge(&db, "a", "b").await);
        assert_eq!(pending(&db, "a", "b").await, 0);
        assert_eq!(events(&db, "b", NotificationType::FollowRequest).await, 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_scope_fails() {
        let (_db, service) = setup(&["a", "b"]).await;

        let result = service.remove_follow_request("a", "b", Some("blocked")).await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("unknown remove scope: blocked"));
    }

    #[tokio::test]
    async fn test_remove_follower() {
        let (db, service) = setup(&["a", "b"]).await;

        service.send_request("a", "b").await.unwrap();
        service.accept_request("b", "a").await.unwrap();

        assert!(service.remove_follower("b", "a").await.unwrap());
        assert!(!edge(&db, "a", "b").await);
        assert!(!service.remove_follower("b", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_relationship_and_listings() {
        let (_db, service) = setup(&["a", "b", "c"]).await;

        service.send_request("a", "b").await.unwrap();
        service.send_request("c", "a").await.unwrap();

        let rel = service.relationship("a", "b").await.unwrap();
        assert_eq!(
            rel,
            Relationship {
                request_sent: true,
                ..Default::default()
            }
        );

        let received = service.pending_received("a", 10, None).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].requester_id, "c");

        let sent = service.pending_sent("a", 10, None).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target_id, "b");

        service.accept_request("b", "a").await.unwrap();
        let rel = service.relationship("b", "a").await.unwrap();
        assert!(rel.followed_by);
        assert!(!rel.following);

        assert_eq!(service.followers("b", 10, None).await.unwrap().len(), 1);
        assert_eq!(service.following("a", 10, None).await.unwrap().len(), 1);
        assert!(service.is_following("a", "b").await.unwrap());
    }

    #[test]
    fn test_remove_scope_from_str() {
        assert_eq!("requested".parse::<RemoveScope>(), Ok(RemoveScope::Requested));
        assert_eq!("following".parse::<RemoveScope>(), Ok(RemoveScope::Following));
        assert!("both".parse::<RemoveScope>().is_err());
    }

    #[test]
    fn test_operation_result_serialization() {
        let json = serde_json::to_value(OperationResult::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));

        let json = serde_json::to_value(OperationResult::failed("already following")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "already following" })
        );
    }
}
