//! Test utilities for database operations.
//!
//! [`TestDatabase::in_memory`] gives every test its own migrated SQLite database.
//! [`TestDatabase::postgres`] connects to a real `PostgreSQL` for the ignored
//! integration tests.

use std::sync::Arc;

use chrono::Utc;
use followgraph_common::{AppError, AppResult};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, Set};
use tracing::info;

use crate::SocialStore;
use crate::entities::user;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER")
                .unwrap_or_else(|_| "followgraph_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "followgraph_test".to_string()),
            database: std::env::var("TEST_DB_NAME")
                .unwrap_or_else(|_| "followgraph_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated database for tests.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory SQLite database with all migrations applied.
    ///
    /// The pool is pinned to a single connection: every SQLite `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> AppResult<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        crate::migrate(&conn).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Connect to a running `PostgreSQL` and apply migrations.
    pub async fn postgres(config: &TestDbConfig) -> AppResult<Self> {
        let conn = Database::connect(&config.database_url())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        crate::migrate(&conn).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared connection handle.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Store over this database.
    #[must_use]
    pub fn store(&self) -> SocialStore {
        SocialStore::new(self.connection())
    }

    /// Insert a user with the token `token-{id}`.
    pub async fn seed_user(&self, id: &str, username: &str) -> AppResult<user::Model> {
        self.store()
            .users()
            .create(user::ActiveModel {
                id: Set(id.to_string()),
                username: Set(username.to_string()),
                name: Set(Some(username.to_uppercase())),
                avatar_url: Set(Some(format!("https://cdn.example/{id}.png"))),
                is_private: Set(true),
                token: Set(Some(format!("token-{id}"))),
                created_at: Set(Utc::now().into()),
            })
            .await
    }
}
