//! # Category Repository
//!
//! Categories group a store's products and can carry category-wide discounts.
//!
//! Deleting a category takes its category discounts with it. A category
//! that still holds products cannot be deleted; move or delete them first.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::validation::validate_category_name;
use shopfront_core::Category;

const CATEGORY_COLUMNS: &str = "id, tenant_id, name, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category in the given store.
    ///
    /// ## Errors
    /// - `ForeignKeyViolation` when the tenant doesn't exist
    pub async fn create(&self, tenant_id: &str, name: &str) -> DbResult<Category> {
        validate_category_name(name)?;

        let now = Utc::now();
        let category = Category {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            name: name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, tenant_id = %tenant_id, name = %category.name, "Creating category");

        sqlx::query(
            "INSERT INTO categories (id, tenant_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.id)
        .bind(&category.tenant_id)
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a category, scoped to the tenant.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Category>> {
        find(&self.pool, tenant_id, id).await
    }

    /// Renames a category.
    ///
    /// ## Errors
    /// - `Core(Validation)` for an empty or overlong name
    /// - `NotFound` when the category is not in this tenant
    pub async fn update(&self, tenant_id: &str, id: &str, name: &str) -> DbResult<Category> {
        validate_category_name(name)?;

        debug!(id = %id, tenant_id = %tenant_id, name = %name.trim(), "Renaming category");

        let result = sqlx::query("UPDATE categories SET name = ?1, updated_at = ?2 WHERE id = ?3 AND tenant_id = ?4")
            .bind(name.trim())
            .bind(Utc::now())
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes an empty category and its category discounts.
    ///
    /// ## Errors
    /// - `NotFound` when the category is not in this tenant
    /// - `ForeignKeyViolation` while products still belong to it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if find(&mut *tx, tenant_id, id).await?.is_none() {
            return Err(DbError::not_found("Category", id));
        }

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if products > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("category {id} still holds {products} products"),
            });
        }

        debug!(id = %id, tenant_id = %tenant_id, "Deleting category");

        sqlx::query("DELETE FROM categories WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Lists a store's categories by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Category>> {
        list_for_tenant(&self.pool, tenant_id).await
    }

    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn find<'e, E>(executor: E, tenant_id: &str, id: &str) -> DbResult<Option<Category>>
where
    E: SqliteExecutor<'e>,
{
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND tenant_id = ?2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;
    Ok(category)
}

pub(crate) async fn list_for_tenant<'e, E>(executor: E, tenant_id: &str) -> DbResult<Vec<Category>>
where
    E: SqliteExecutor<'e>,
{
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE tenant_id = ?1 ORDER BY name"
    ))
    .bind(tenant_id)
    .fetch_all(executor)
    .await?;
    Ok(categories)
}
