//! Database layer for followgraph.
//!
//! Three independently stored collections back the follow workflow: follow
//! requests, directed friendship edges and notification events. Repositories are
//! thin views over any sea-orm connection, so the same queries run either against
//! the pool ([`SocialStore`]) or inside a transaction ([`UnitOfWork`]).

pub mod entities;
pub mod migrations;
pub mod repositories;
mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use store::{SocialStore, UnitOfWork};

use followgraph_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Map a store error into the application taxonomy.
///
/// Uniqueness violations are what close the check-then-act races, so callers need
/// to tell them apart from transport failures.
pub(crate) fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(err.to_string()),
    }
}
