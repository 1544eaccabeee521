//! # Stats Repository
//!
//! Seller dashboard counters.

use chrono::{Days, NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfront_core::TenantStats;

/// Repository for dashboard statistics.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Dashboard counters for one store.
    ///
    /// `today` is a UTC calendar date; "orders today" counts orders created
    /// in `[today 00:00, today + 1 00:00)` UTC.
    pub async fn for_tenant(&self, tenant_id: &str, today: NaiveDate) -> DbResult<TenantStats> {
        let day_start = today.and_time(NaiveTime::default()).and_utc();
        let day_end = (today + Days::new(1)).and_time(NaiveTime::default()).and_utc();

        let orders_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE tenant_id = ?1 AND created_at >= ?2 AND created_at < ?3",
        )
        .bind(tenant_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        let pending_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE tenant_id = ?1 AND status = 'pending'")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        let category_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        let stats = TenantStats {
            orders_today,
            pending_orders,
            product_count,
            category_count,
        };

        debug!(tenant_id = %tenant_id, ?stats, "Loaded dashboard stats");
        Ok(stats)
    }
}
