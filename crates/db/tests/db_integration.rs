//! Database integration tests.
//!
//! The SQLite tests run everywhere. The `PostgreSQL` tests require a running
//! instance; run them with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `followgraph_test`)
//!   `TEST_DB_PASSWORD` (default: `followgraph_test`)
//!   `TEST_DB_NAME` (default: `followgraph_test`)

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use followgraph_common::{AppError, IdGenerator, pair_key};
use followgraph_db::entities::{
    follow_request::{self, FollowRequestStatus, PendingFollowRequest},
    friendship,
    notification::{self, NotificationType},
};
use followgraph_db::repositories::NotificationQuery;
use followgraph_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

fn pending_request(requester_id: &str, target_id: &str) -> follow_request::ActiveModel {
    follow_request::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        requester_id: Set(requester_id.to_string()),
        target_id: Set(target_id.to_string()),
        pair_key: Set(pair_key(requester_id, target_id)),
        status: Set(FollowRequestStatus::Pending),
        created_at: Set(Utc::now().into()),
    }
}

fn notification(
    recipient_id: &str,
    sender_id: &str,
    notification_type: NotificationType,
) -> notification::ActiveModel {
    notification::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        recipient_id: Set(recipient_id.to_string()),
        sender_id: Set(sender_id.to_string()),
        notification_type: Set(notification_type),
        post_id: Set(None),
        dedupe_key: Set(notification_type.dedupe_key(recipient_id, sender_id)),
        seen: Set(false),
        created_at: Set(Utc::now().into()),
    }
}

async fn seeded() -> TestDatabase {
    let db = TestDatabase::in_memory().await.unwrap();
    db.seed_user("alice", "alice").await.unwrap();
    db.seed_user("bob", "bob").await.unwrap();
    db
}

#[tokio::test]
async fn test_second_request_for_same_pair_is_a_conflict() {
    let db = seeded().await;
    let requests = db.store();
    let requests = requests.follow_requests();

    requests.create(pending_request("alice", "bob")).await.unwrap();
    let err = requests
        .create(pending_request("alice", "bob"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(requests.count_between("alice", "bob").await.unwrap(), 1);
}

#[tokio::test]
async fn test_crossed_requests_are_a_conflict() {
    let db = seeded().await;
    let store = db.store();

    store
        .follow_requests()
        .create(pending_request("alice", "bob"))
        .await
        .unwrap();
    let err = store
        .follow_requests()
        .create(pending_request("bob", "alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_resolve_removes_request_and_frees_the_pair() {
    let db = seeded().await;
    let store = db.store();
    let requests = store.follow_requests();

    let created = requests.create(pending_request("alice", "bob")).await.unwrap();
    let resolved = PendingFollowRequest::try_from(created.clone())
        .unwrap()
        .accept();

    assert!(requests.resolve(&resolved).await.unwrap());
    assert!(requests.find_by_id(&created.id).await.unwrap().is_none());
    // Resolving twice loses the compare-and-set
    assert!(!requests.resolve(&resolved).await.unwrap());
    // A new request for the same pair is allowed again
    requests.create(pending_request("alice", "bob")).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_edge_insert_is_a_noop() {
    let db = seeded().await;
    let store = db.store();
    let edges = store.friendships();

    let edge = || friendship::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        user_id: Set("alice".to_string()),
        friend_id: Set("bob".to_string()),
        created_at: Set(Utc::now().into()),
    };

    assert!(edges.insert_if_absent(edge()).await.unwrap());
    assert!(!edges.insert_if_absent(edge()).await.unwrap());
    assert_eq!(edges.count_following("alice").await.unwrap(), 1);
    assert!(edges.is_following("alice", "bob").await.unwrap());
    assert!(!edges.is_following("bob", "alice").await.unwrap());
}

#[tokio::test]
async fn test_live_follow_request_event_is_unique() {
    let db = seeded().await;
    let store = db.store();
    let notifications = store.notifications();

    assert!(
        notifications
            .insert_deduplicated(notification("bob", "alice", NotificationType::FollowRequest))
            .await
            .unwrap()
    );
    assert!(
        !notifications
            .insert_deduplicated(notification("bob", "alice", NotificationType::FollowRequest))
            .await
            .unwrap()
    );

    // Types without a dedupe key are never collapsed
    for _ in 0..2 {
        assert!(
            notifications
                .insert_deduplicated(notification("bob", "alice", NotificationType::Like))
                .await
                .unwrap()
        );
    }

    let all = notifications
        .find_by_recipient(
            "bob",
            &NotificationQuery {
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_feed_pages_follow_ids_when_clocks_disagree() {
    let db = seeded().await;
    let store = db.store();
    let notifications = store.notifications();

    // Another instance with a skewed clock: later ids, earlier timestamps
    let base = Utc::now();
    for offset in [0_i64, -5, 3, -10] {
        let mut event = notification("bob", "alice", NotificationType::Like);
        event.created_at = Set((base + chrono::Duration::seconds(offset)).into());
        notifications.insert_deduplicated(event).await.unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = notifications
            .find_by_recipient(
                "bob",
                &NotificationQuery {
                    until_id: cursor.as_deref(),
                    limit: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let Some(last) = page.last() else { break };
        cursor = Some(last.id.clone());
        seen.extend(page.into_iter().map(|n| n.id));
    }

    let mut expected = seen.clone();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    expected.dedup();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_rolled_back_unit_of_work_leaves_no_rows() {
    let db = seeded().await;
    let store = db.store();

    let uow = store.begin().await.unwrap();
    uow.follow_requests()
        .create(pending_request("alice", "bob"))
        .await
        .unwrap();
    uow.notifications()
        .insert_deduplicated(notification("bob", "alice", NotificationType::FollowRequest))
        .await
        .unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(
        store
            .follow_requests()
            .count_between("alice", "bob")
            .await
            .unwrap(),
        0
    );
    assert_eq!(store.notifications().count_unseen("bob").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_postgres_migrations_apply() {
    let config = TestDbConfig::default();
    let result = TestDatabase::postgres(&config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
