//! # Database Handle
//!
//! `Database` owns the SQLite pool and hands out repositories.
//!
//! ```text
//! DbConfig ──► Database::new ──► SqlitePool (WAL, foreign_keys=ON)
//!                    │                 │
//!                    └── migrations    ├── db.stores() / categories() / products()
//!                                      ├── db.discounts()
//!                                      ├── db.storefront()   listing, product page
//!                                      ├── db.orders()       place_order, lifecycle
//!                                      └── db.stats()        seller dashboard
//! ```
//!
//! WAL lets storefront reads proceed while an order transaction holds the
//! write lock.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    CategoryRepository, DiscountRepository, OrderRepository, ProductRepository, StatsRepository,
    StoreRepository, StorefrontRepository,
};

/// Shared handle to the shopfront database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database described by `config`.
    ///
    /// Foreign keys are switched on for every connection; catalog and order
    /// tables rely on them for tenant integrity. Migrations run unless
    /// `config.run_migrations` is false.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening shopfront database"
        );

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stores(&self) -> StoreRepository {
        StoreRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn discounts(&self) -> DiscountRepository {
        DiscountRepository::new(self.pool.clone())
    }

    /// Order placement and lifecycle.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Shopper-facing listing and product page.
    pub fn storefront(&self) -> StorefrontRepository {
        StorefrontRepository::new(self.pool.clone())
    }

    pub fn stats(&self) -> StatsRepository {
        StatsRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing shopfront database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_rerunning_migrations_is_a_no_op() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_health_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
