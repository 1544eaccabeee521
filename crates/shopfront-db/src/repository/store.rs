//! # Store Repository
//!
//! Stores are the tenants: a store's `id` is the `tenant_id` of every
//! category, product, discount and order it owns.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::generate_id;
use shopfront_core::validation::{validate_slug, validate_store_name};
use shopfront_core::Store;

const STORE_COLUMNS: &str = "id, store_slug, name, created_at";

/// Repository for store database operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Creates a store.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a malformed slug or empty name
    /// - `UniqueViolation` when the slug is taken
    pub async fn create(&self, store_slug: &str, name: &str) -> DbResult<Store> {
        validate_slug(store_slug)?;
        validate_store_name(name)?;

        let store = Store {
            id: generate_id(),
            store_slug: store_slug.to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %store.id, store_slug = %store.store_slug, "Creating store");

        sqlx::query("INSERT INTO stores (id, store_slug, name, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&store.id)
            .bind(&store.store_slug)
            .bind(&store.name)
            .bind(store.created_at)
            .execute(&self.pool)
            .await?;

        Ok(store)
    }

    /// Gets a store by its public slug.
    pub async fn get_by_slug(&self, store_slug: &str) -> DbResult<Option<Store>> {
        find_by_slug(&self.pool, store_slug).await
    }

    /// Gets a store by its id (the tenant id).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Store>> {
        find_by_id(&self.pool, id).await
    }
}

pub(crate) async fn find_by_slug<'e, E>(executor: E, store_slug: &str) -> DbResult<Option<Store>>
where
    E: SqliteExecutor<'e>,
{
    let store = sqlx::query_as::<_, Store>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE store_slug = ?1"))
        .bind(store_slug)
        .fetch_optional(executor)
        .await?;
    Ok(store)
}

pub(crate) async fn find_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Store>>
where
    E: SqliteExecutor<'e>,
{
    let store = sqlx::query_as::<_, Store>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(store)
}
