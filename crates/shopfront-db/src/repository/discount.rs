//! # Discount Repository
//!
//! Database operations for percentage discounts.
//!
//! ## Storage vs Domain
//! ```text
//! ┌────────────────────────────────────┐      ┌───────────────────────────────┐
//! │  discounts row                     │      │  Discount                     │
//! │  product_id   TEXT NULL            │ ───► │  target: Product(id)          │
//! │  category_id  TEXT NULL            │      │        | Category(id)         │
//! │  rate_bps     INTEGER              │      │  rate: DiscountRate           │
//! └────────────────────────────────────┘      └───────────────────────────────┘
//!                    DiscountTarget::from_columns (both/neither → error)
//! ```
//!
//! "Active" queries filter on `start_date <= on AND end_date >= on`; the
//! resolver checks the window again, so callers may also pass full lists.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{category, generate_id};
use shopfront_core::{CoreResult, Discount, DiscountRate, DiscountTarget, NewDiscount};

const DISCOUNT_COLUMNS: &str = "id, tenant_id, product_id, category_id, rate_bps, start_date, end_date, created_at";

/// A `discounts` row before its target is validated.
#[derive(Debug, Clone, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    tenant_id: String,
    product_id: Option<String>,
    category_id: Option<String>,
    rate_bps: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl DiscountRow {
    fn into_discount(self) -> CoreResult<Discount> {
        let target = DiscountTarget::from_columns(&self.id, self.product_id, self.category_id)?;
        Ok(Discount {
            id: self.id,
            tenant_id: self.tenant_id,
            target,
            rate: DiscountRate::from_bps(self.rate_bps),
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        })
    }
}

fn into_discounts(rows: Vec<DiscountRow>) -> DbResult<Vec<Discount>> {
    rows.into_iter()
        .map(|row| row.into_discount().map_err(DbError::from))
        .collect()
}

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Creates a discount.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a rate above 100% or an inverted window
    /// - `NotFound` when the target product or category is not in this tenant
    pub async fn create(&self, tenant_id: &str, input: NewDiscount) -> DbResult<Discount> {
        input.validate()?;
        self.ensure_target(tenant_id, &input.target).await?;

        let discount = Discount {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            target: input.target,
            rate: input.rate,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: Utc::now(),
        };

        debug!(
            id = %discount.id,
            tenant_id = %tenant_id,
            target = ?discount.target,
            rate = %discount.rate,
            "Creating discount"
        );

        sqlx::query(&format!(
            "INSERT INTO discounts ({DISCOUNT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ))
        .bind(&discount.id)
        .bind(&discount.tenant_id)
        .bind(discount.target.product_id())
        .bind(discount.target.category_id())
        .bind(discount.rate.bps())
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.created_at)
        .execute(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Replaces a discount's target, rate and window.
    pub async fn update(&self, tenant_id: &str, id: &str, input: NewDiscount) -> DbResult<Discount> {
        input.validate()?;
        self.ensure_target(tenant_id, &input.target).await?;

        debug!(id = %id, tenant_id = %tenant_id, rate = %input.rate, "Updating discount");

        let result = sqlx::query(
            "UPDATE discounts SET product_id = ?1, category_id = ?2, rate_bps = ?3, start_date = ?4, end_date = ?5 \
             WHERE id = ?6 AND tenant_id = ?7",
        )
        .bind(input.target.product_id())
        .bind(input.target.category_id())
        .bind(input.rate.bps())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        self.get(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, tenant_id = %tenant_id, "Deleting discount");

        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_discount().map_err(DbError::from)).transpose()
    }

    /// Lists a store's discounts, latest ending first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE tenant_id = ?1 ORDER BY end_date DESC, created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        into_discounts(rows)
    }

    /// Discounts on one product or category that are active on `on`.
    pub async fn active_for(&self, tenant_id: &str, target: &DiscountTarget, on: NaiveDate) -> DbResult<Vec<Discount>> {
        active_for(&self.pool, tenant_id, target, on).await
    }

    /// Every discount of the store that is active on `on`.
    pub async fn active_for_tenant(&self, tenant_id: &str, on: NaiveDate) -> DbResult<Vec<Discount>> {
        active_for_tenant(&self.pool, tenant_id, on).await
    }

    async fn ensure_target(&self, tenant_id: &str, target: &DiscountTarget) -> DbResult<()> {
        match target {
            DiscountTarget::Product(id) => {
                let exists: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?1 AND tenant_id = ?2")
                        .bind(id)
                        .bind(tenant_id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists == 0 {
                    return Err(DbError::not_found("Product", id));
                }
            }
            DiscountTarget::Category(id) => {
                if category::find(&self.pool, tenant_id, id).await?.is_none() {
                    return Err(DbError::not_found("Category", id));
                }
            }
        }
        Ok(())
    }
}

/// Active discounts on one target, oldest first so the first maximal record
/// is stable.
pub(crate) async fn active_for<'e, E>(
    executor: E,
    tenant_id: &str,
    target: &DiscountTarget,
    on: NaiveDate,
) -> DbResult<Vec<Discount>>
where
    E: SqliteExecutor<'e>,
{
    let column = match target {
        DiscountTarget::Product(_) => "product_id",
        DiscountTarget::Category(_) => "category_id",
    };
    let target_id = match target {
        DiscountTarget::Product(id) | DiscountTarget::Category(id) => id,
    };

    let rows = sqlx::query_as::<_, DiscountRow>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts \
         WHERE tenant_id = ?1 AND {column} = ?2 AND start_date <= ?3 AND end_date >= ?3 \
         ORDER BY created_at, id"
    ))
    .bind(tenant_id)
    .bind(target_id)
    .bind(on)
    .fetch_all(executor)
    .await?;

    into_discounts(rows)
}

pub(crate) async fn active_for_tenant<'e, E>(executor: E, tenant_id: &str, on: NaiveDate) -> DbResult<Vec<Discount>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, DiscountRow>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts \
         WHERE tenant_id = ?1 AND start_date <= ?2 AND end_date >= ?2 \
         ORDER BY created_at, id"
    ))
    .bind(tenant_id)
    .bind(on)
    .fetch_all(executor)
    .await?;

    into_discounts(rows)
}
