//! User directory seam.
//!
//! Identity and profiles live outside the follow workflow. The workflow only
//! needs to know whether an id exists, and the feed needs display attributes
//! for senders.

use std::collections::HashMap;

use async_trait::async_trait;
use followgraph_common::AppResult;
use followgraph_db::{SocialStore, entities::user};
use serde::Serialize;

/// Display attributes of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// Callers gate direct follows on this before entering the workflow.
    pub is_private: bool,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            avatar_url: user.avatar_url,
            is_private: user.is_private,
        }
    }
}

/// Lookup of users by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether a user with this id exists.
    async fn exists(&self, user_id: &str) -> AppResult<bool>;

    /// Display attributes for every known id in `ids`.
    ///
    /// Unknown ids are absent from the map rather than an error.
    async fn summaries(&self, ids: &[String]) -> AppResult<HashMap<String, UserSummary>>;
}

/// [`UserDirectory`] backed by the `user` table.
#[derive(Clone)]
pub struct DbUserDirectory {
    store: SocialStore,
}

impl DbUserDirectory {
    /// Create a new directory over the store.
    #[must_use]
    pub const fn new(store: SocialStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserDirectory for DbUserDirectory {
    async fn exists(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.store.users().find_by_id(user_id).await?.is_some())
    }

    async fn summaries(&self, ids: &[String]) -> AppResult<HashMap<String, UserSummary>> {
        let users = self.store.users().find_by_ids(ids).await?;

        Ok(users
            .into_iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use followgraph_db::test_utils::TestDatabase;

    #[tokio::test]
    async fn test_exists() {
        let db = TestDatabase::in_memory().await.unwrap();
        db.seed_user("alice", "alice").await.unwrap();

        let directory = DbUserDirectory::new(db.store());
        assert!(directory.exists("alice").await.unwrap());
        assert!(!directory.exists("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_summaries_skip_unknown_ids() {
        let db = TestDatabase::in_memory().await.unwrap();
        db.seed_user("alice", "alice").await.unwrap();
        db.seed_user("bob", "bob").await.unwrap();

        let directory = DbUserDirectory::new(db.store());
        let found = directory
            .summaries(&["alice".to_string(), "ghost".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let alice = &found["alice"];
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.name.as_deref(), Some("ALICE"));
    }
}
