//! # Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! tracked in `_sqlx_migrations`.
//!
//! New schema changes go in a new `NNN_description.sql` file; applied files
//! are never edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
