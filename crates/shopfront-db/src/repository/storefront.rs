//! # Storefront Repository
//!
//! Read-only views for shoppers: the store listing and the product page.
//! Both price through `shopfront_core::resolve`, the same function the
//! order path uses.
//!
//! ## Listing
//! ```text
//! store_slug ──► Store ──► available products ─┐
//!                      ──► categories ─────────┼──► DiscountIndex::price(.., on)
//!                      ──► active discounts ───┘          │
//!                                                         ▼
//!                                                 Vec<PricedProduct>
//! ```
//!
//! Reads run in one transaction so the listing sees a single snapshot.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{category, discount, product, store};
use shopfront_core::{resolve, Category, DiscountIndex, DiscountTarget, PricedProduct};

/// Repository for storefront views.
#[derive(Debug, Clone)]
pub struct StorefrontRepository {
    pool: SqlitePool,
}

impl StorefrontRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StorefrontRepository { pool }
    }

    /// Available products of a store with prices resolved for `on`.
    ///
    /// A product that cannot be priced is left out of the listing and logged.
    ///
    /// ## Errors
    /// `NotFound` when no store has this slug.
    pub async fn listing(&self, store_slug: &str, on: NaiveDate) -> DbResult<Vec<PricedProduct>> {
        let mut tx = self.pool.begin().await?;

        let store = store::find_by_slug(&mut *tx, store_slug)
            .await?
            .ok_or_else(|| DbError::not_found("Store", store_slug))?;

        let products = product::list_available(&mut *tx, &store.id).await?;
        let categories: HashMap<String, Category> = category::list_for_tenant(&mut *tx, &store.id)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let index = DiscountIndex::new(discount::active_for_tenant(&mut *tx, &store.id, on).await?);

        tx.commit().await?;

        let mut listing = Vec::with_capacity(products.len());
        for product in products {
            let Some(category) = categories.get(&product.category_id).cloned() else {
                warn!(slug = %product.slug, category_id = %product.category_id, "Product category missing, skipping");
                continue;
            };

            match index.price(product, category, on) {
                Ok(priced) => listing.push(priced),
                Err(err) => warn!(store_slug = %store_slug, error = %err, "Product cannot be priced, skipping"),
            }
        }

        debug!(store_slug = %store_slug, on = %on, count = listing.len(), "Storefront listing built");
        Ok(listing)
    }

    /// One product of a store with its price resolved for `on`.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown store or a slug not in that store
    /// - `Core(InvalidProductPricing)` when the product has no base price
    pub async fn product_detail(&self, store_slug: &str, product_slug: &str, on: NaiveDate) -> DbResult<PricedProduct> {
        let mut tx = self.pool.begin().await?;

        let store = store::find_by_slug(&mut *tx, store_slug)
            .await?
            .ok_or_else(|| DbError::not_found("Store", store_slug))?;

        let product = product::find_by_slug(&mut *tx, &store.id, product_slug)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_slug))?;

        let category = category::find(&mut *tx, &store.id, &product.category_id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", &product.category_id))?;

        let product_discounts =
            discount::active_for(&mut *tx, &store.id, &DiscountTarget::Product(product.id.clone()), on).await?;
        let category_discounts =
            discount::active_for(&mut *tx, &store.id, &DiscountTarget::Category(category.id.clone()), on).await?;

        tx.commit().await?;

        let price = resolve(&product, &category, &product_discounts, &category_discounts, on)?;
        let mode = product.pricing_mode()?;

        Ok(PricedProduct {
            product,
            category,
            mode,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use shopfront_core::{DiscountSource, Money, SalePrice};

    fn find<'a>(listing: &'a [PricedProduct], slug: &str) -> &'a PricedProduct {
        listing.iter().find(|p| p.product.slug == slug).unwrap()
    }

    #[tokio::test]
    async fn test_listing_resolves_every_product() {
        let db = setup().await;
        let s = store(&db, "green-grocer").await;
        let fruit = category(&db, &s.id, "Fruit").await;
        let mango = per_unit(&db, &s.id, &fruit.id, "mango", 10_000).await;
        per_unit(&db, &s.id, &fruit.id, "kiwi", 10_000).await;
        let hidden = per_kg(&db, &s.id, &fruit.id, "durian", 5_000).await;
        db.products().set_availability(&s.id, &hidden.id, false).await.unwrap();

        db.discounts()
            .create(
                &s.id,
                new_discount(DiscountTarget::Product(mango.id.clone()), 2_000, date(2024, 1, 1), date(2024, 1, 31)),
            )
            .await
            .unwrap();
        db.discounts()
            .create(
                &s.id,
                new_discount(DiscountTarget::Category(fruit.id.clone()), 1_000, date(2024, 1, 1), date(2024, 1, 31)),
            )
            .await
            .unwrap();

        let listing = db.storefront().listing("green-grocer", date(2024, 1, 15)).await.unwrap();
        assert_eq!(listing.len(), 2);

        let mango = find(&listing, "mango");
        assert_eq!(mango.price.rate.bps(), 2_000);
        assert_eq!(mango.price.sale_price, SalePrice::Discounted(Money::from_cents(8_000)));
        assert_eq!(mango.price.applied.as_ref().unwrap().source, DiscountSource::Product);

        let kiwi = find(&listing, "kiwi");
        assert_eq!(kiwi.price.rate.bps(), 1_000);
        assert_eq!(kiwi.price.effective_price(), Some(Money::from_cents(9_000)));
        assert_eq!(kiwi.category.name, "Fruit");
    }

    #[tokio::test]
    async fn test_listing_after_window_has_no_sale_prices() {
        let db = setup().await;
        let s = store(&db, "green-grocer").await;
        let fruit = category(&db, &s.id, "Fruit").await;
        let mango = per_unit(&db, &s.id, &fruit.id, "mango", 10_000).await;
        db.discounts()
            .create(
                &s.id,
                new_discount(DiscountTarget::Product(mango.id.clone()), 2_000, date(2024, 1, 1), date(2024, 1, 31)),
            )
            .await
            .unwrap();

        let listing = db.storefront().listing("green-grocer", date(2024, 2, 1)).await.unwrap();
        assert_eq!(listing[0].price.sale_price, SalePrice::NoDiscount);
        assert_eq!(listing[0].price.unit_price(), Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_unknown_store() {
        let db = setup().await;
        let result = db.storefront().listing("nobody", date(2024, 1, 1)).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_product_detail_matches_listing() {
        let db = setup().await;
        let a = store(&db, "store-a").await;
        store(&db, "store-b").await;
        let rice = category(&db, &a.id, "Rice").await;
        let basmati = per_kg(&db, &a.id, &rice.id, "basmati", 4_000).await;
        db.discounts()
            .create(
                &a.id,
                new_discount(DiscountTarget::Category(rice.id.clone()), 2_500, date(2024, 3, 1), date(2024, 3, 31)),
            )
            .await
            .unwrap();

        let on = date(2024, 3, 31);
        let detail = db.storefront().product_detail("store-a", "basmati", on).await.unwrap();
        let listing = db.storefront().listing("store-a", on).await.unwrap();

        assert_eq!(detail.product.id, basmati.id);
        assert_eq!(detail.price, listing[0].price);
        assert_eq!(detail.price.effective_price(), Some(Money::from_cents(3_000)));

        // the slug exists, but in another store
        assert!(matches!(
            db.storefront().product_detail("store-b", "basmati", on).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
