//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_per_kg_cents   price_per_unit_cents   sold as                   │
//! │  ──────────────────   ────────────────────   ──────────────────────    │
//! │  4000                 NULL                   by weight (40.00 / kg)    │
//! │  NULL                 1000                   by unit   (10.00 each)    │
//! │  set                  set                    rejected                  │
//! │  NULL                 NULL                   rejected                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product slugs are unique across all stores, but every lookup here is
//! still scoped to the requesting tenant.
//!
//! Edits never reach placed orders: order items carry their own snapshot of
//! name, slug and resolved price. A product that appears in an order cannot
//! be deleted; mark it unavailable instead.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{category, generate_id};
use shopfront_core::{NewProduct, Product, ProductUpdate};

pub(crate) const PRODUCT_COLUMNS: &str = "id, tenant_id, category_id, slug, name, description, \
     price_per_kg_cents, price_per_unit_cents, unit_label, is_available, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a bad slug or name, or unless exactly one
    ///   non-negative price is set
    /// - `NotFound` when the category is not in this tenant
    /// - `UniqueViolation` when the slug is taken (in any store)
    pub async fn insert(&self, tenant_id: &str, input: NewProduct) -> DbResult<Product> {
        input.validate()?;

        if category::find(&self.pool, tenant_id, &input.category_id).await?.is_none() {
            return Err(DbError::not_found("Category", &input.category_id));
        }

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            category_id: input.category_id,
            slug: input.slug,
            name: input.name.trim().to_string(),
            description: input.description,
            price_per_kg_cents: input.price_per_kg_cents,
            price_per_unit_cents: input.price_per_unit_cents,
            unit_label: input.unit_label,
            is_available: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, tenant_id = %tenant_id, slug = %product.slug, "Inserting product");

        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.category_id)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_per_kg_cents)
        .bind(product.price_per_unit_cents)
        .bind(&product.unit_label)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Replaces a product's editable fields and returns the stored row.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a bad name, or unless exactly one price is set
    /// - `NotFound` when the product or the new category is not in this tenant
    pub async fn update(&self, tenant_id: &str, id: &str, input: ProductUpdate) -> DbResult<Product> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        if category::find(&mut *tx, tenant_id, &input.category_id).await?.is_none() {
            return Err(DbError::not_found("Category", &input.category_id));
        }

        debug!(id = %id, tenant_id = %tenant_id, category_id = %input.category_id, "Updating product");

        let result = sqlx::query(
            "UPDATE products SET category_id = ?1, name = ?2, description = ?3, price_per_kg_cents = ?4, \
             price_per_unit_cents = ?5, unit_label = ?6, updated_at = ?7 WHERE id = ?8 AND tenant_id = ?9",
        )
        .bind(&input.category_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price_per_kg_cents)
        .bind(input.price_per_unit_cents)
        .bind(&input.unit_label)
        .bind(Utc::now())
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let product = find_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(product)
    }

    /// Deletes a product together with its product discounts.
    ///
    /// ## Errors
    /// - `NotFound` when the product is not in this tenant
    /// - `ForeignKeyViolation` when an order line refers to it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if find_by_id(&mut *tx, tenant_id, id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        let ordered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if ordered > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("product {id} is on {ordered} order lines; mark it unavailable instead"),
            });
        }

        debug!(id = %id, tenant_id = %tenant_id, "Deleting product");

        // product discounts go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM products WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a product by slug, scoped to the tenant.
    pub async fn get_by_slug(&self, tenant_id: &str, slug: &str) -> DbResult<Option<Product>> {
        find_by_slug(&self.pool, tenant_id, slug).await
    }

    /// Gets a product by id, scoped to the tenant.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        find_by_id(&self.pool, tenant_id, id).await
    }

    /// Lists the products a store currently offers, by name.
    pub async fn list_available(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        list_available(&self.pool, tenant_id).await
    }

    /// Marks a product as available or not.
    pub async fn set_availability(&self, tenant_id: &str, id: &str, is_available: bool) -> DbResult<()> {
        debug!(id = %id, tenant_id = %tenant_id, is_available, "Updating product availability");

        let result = sqlx::query(
            "UPDATE products SET is_available = ?1, updated_at = ?2 WHERE id = ?3 AND tenant_id = ?4",
        )
        .bind(is_available)
        .bind(Utc::now())
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn find_by_slug<'e, E>(executor: E, tenant_id: &str, slug: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = ?1 AND tenant_id = ?2"
    ))
    .bind(slug)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;
    Ok(product)
}

pub(crate) async fn find_by_id<'e, E>(executor: E, tenant_id: &str, id: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND tenant_id = ?2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;
    Ok(product)
}

pub(crate) async fn list_available<'e, E>(executor: E, tenant_id: &str) -> DbResult<Vec<Product>>
where
    E: SqliteExecutor<'e>,
{
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 AND is_available = 1 ORDER BY name"
    ))
    .bind(tenant_id)
    .fetch_all(executor)
    .await?;
    Ok(products)
}
