//! # Order Repository
//!
//! Order placement and the order lifecycle.
//!
//! ## Placing an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order(tenant, lines, shipping, on)             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── READ  (per line)                                                  │
//! │   │    product by slug in tenant ─── missing ──► ProductNotFound        │
//! │   │    category, product discounts, category discounts                 │
//! │   │    resolve(.., on) ──► price_line() ──► LineQuote                   │
//! │   │                                                                     │
//! │   ├── SUM   OrderQuote::from_lines (total = Σ line totals)              │
//! │   │                                                                     │
//! │   ├── WRITE orders, order_items, order_discounts                        │
//! │   │                                                                     │
//! │  COMMIT  (any error before this drops the transaction: nothing written) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Lifecycle
//! ```text
//!   pending ◄──── toggle_confirmation ────► confirmed ──► shipped ──► delivered
//!      │                                        │
//!      ├── cancel (owning user only) ──► cancelled ◄── set_status (seller)
//!      └──────────── set_status (seller) ───────┘
//! ```
//!
//! Seller moves go through [`OrderRepository::set_status`], which follows
//! `OrderStatus::can_transition_to`. Status changes never touch items or
//! totals.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{category, discount, generate_id, product, store};
use shopfront_core::order::check_line_count;
use shopfront_core::{
    price_line, resolve, CoreError, DiscountTarget, LineRequest, Order, OrderItem, OrderQuote,
    OrderStatus, ShippingRef,
};

const ORDER_COLUMNS: &str = "id, tenant_id, user_id, shipping_address_id, customer_name, phone_number, \
     status, total_cents, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, slug_snapshot, name_snapshot, weight_grams, \
     quantity, base_unit_price_cents, discount_bps, unit_price_cents, line_total_cents, created_at";

/// A committed order with its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Discounts that priced at least one line.
    pub applied_discount_ids: Vec<String>,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Prices and stores an order in one transaction.
    ///
    /// Every line is priced with the same resolver the storefront uses, for
    /// the single reference date `on`. All reads happen before the first
    /// write.
    ///
    /// ## Errors
    /// - `Core(ProductNotFound)` when a slug is not in this tenant
    /// - `Core(InvalidLineItem)` for an empty order, an unavailable product or
    ///   a measure that doesn't fit the product
    /// - `Core(InvalidProductPricing)` for a product without a base price
    /// - `NotFound` when the tenant doesn't exist
    ///
    /// On any error nothing is written.
    pub async fn place_order(
        &self,
        tenant_id: &str,
        lines: &[LineRequest],
        shipping: &ShippingRef,
        on: NaiveDate,
    ) -> DbResult<PlacedOrder> {
        let result = self.place_order_tx(tenant_id, lines, shipping, on).await;

        match &result {
            Ok(placed) => info!(
                order_id = %placed.order.id,
                tenant_id = %tenant_id,
                lines = placed.items.len(),
                total = %placed.order.total(),
                "Order placed"
            ),
            Err(err) => warn!(tenant_id = %tenant_id, lines = lines.len(), error = %err, "Order rejected"),
        }

        result
    }

    async fn place_order_tx(
        &self,
        tenant_id: &str,
        lines: &[LineRequest],
        shipping: &ShippingRef,
        on: NaiveDate,
    ) -> DbResult<PlacedOrder> {
        check_line_count(lines.len())?;

        let mut tx = self.pool.begin().await?;

        if store::find_by_id(&mut *tx, tenant_id).await?.is_none() {
            return Err(DbError::not_found("Store", tenant_id));
        }

        let quote = quote_lines(&mut tx, tenant_id, lines, on).await?;

        let now = Utc::now();
        let order = Order {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            user_id: shipping.user_id.clone(),
            shipping_address_id: shipping.shipping_address_id.clone(),
            customer_name: shipping.customer_name.clone(),
            phone_number: shipping.phone_number.clone(),
            status: OrderStatus::Pending,
            total_cents: quote.total.cents(),
            created_at: now,
            updated_at: now,
        };

        debug!(order_id = %order.id, total_cents = order.total_cents, "Inserting order");

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ))
        .bind(&order.id)
        .bind(&order.tenant_id)
        .bind(&order.user_id)
        .bind(&order.shipping_address_id)
        .bind(&order.customer_name)
        .bind(&order.phone_number)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(quote.lines.len());
        for line in &quote.lines {
            let item = OrderItem {
                id: generate_id(),
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                slug_snapshot: line.slug.clone(),
                name_snapshot: line.name.clone(),
                weight_grams: line.measure.weight_grams(),
                quantity: line.measure.quantity(),
                base_unit_price_cents: line.base_price.cents(),
                discount_bps: line.rate.bps(),
                unit_price_cents: line.unit_price.cents(),
                line_total_cents: line.line_total.cents(),
                created_at: now,
            };

            sqlx::query(&format!(
                "INSERT INTO order_items ({ORDER_ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.slug_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.weight_grams)
            .bind(item.quantity)
            .bind(item.base_unit_price_cents)
            .bind(item.discount_bps)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        for discount_id in &quote.applied_discount_ids {
            sqlx::query("INSERT INTO order_discounts (order_id, discount_id) VALUES (?1, ?2)")
                .bind(&order.id)
                .bind(discount_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(PlacedOrder {
            order,
            items,
            applied_discount_ids: quote.applied_discount_ids,
        })
    }

    /// Gets an order, scoped to the tenant.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Items of an order, in the order they were placed.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Ids of the discounts that priced an order.
    pub async fn applied_discounts(&self, order_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT discount_id FROM order_discounts WHERE order_id = ?1 ORDER BY rowid")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    /// A store's orders, newest first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// A shopper's orders across all stores, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Cancels a pending order on behalf of the shopper who placed it.
    ///
    /// ## Errors
    /// - `NotFound` when the order doesn't exist or belongs to someone else
    /// - `Core(InvalidOrderStatus)` when the order is no longer pending
    pub async fn cancel(&self, order_id: &str, user_id: &str) -> DbResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !order.status.can_cancel() {
            return Err(invalid_status(&order));
        }

        debug!(order_id = %order_id, user_id = %user_id, "Cancelling order");
        self.transition(order, OrderStatus::Cancelled).await
    }

    /// Seller toggle between `pending` and `confirmed`.
    ///
    /// ## Errors
    /// - `NotFound` when the order is not in this tenant
    /// - `Core(InvalidOrderStatus)` for shipped, delivered or cancelled orders
    pub async fn toggle_confirmation(&self, tenant_id: &str, order_id: &str) -> DbResult<Order> {
        let order = self
            .get(tenant_id, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let next = order.status.toggled().ok_or_else(|| invalid_status(&order))?;

        debug!(order_id = %order_id, from = %order.status, to = %next, "Toggling order confirmation");
        self.transition(order, next).await
    }

    /// Seller move to any status `OrderStatus::can_transition_to` allows.
    ///
    /// ## Errors
    /// - `NotFound` when the order is not in this tenant
    /// - `Core(InvalidOrderStatus)` for a move the lifecycle doesn't allow
    pub async fn set_status(&self, tenant_id: &str, order_id: &str, next: OrderStatus) -> DbResult<Order> {
        let order = self
            .get(tenant_id, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !order.status.can_transition_to(next) {
            return Err(invalid_status(&order));
        }

        debug!(order_id = %order_id, from = %order.status, to = %next, "Setting order status");
        self.transition(order, next).await
    }

    /// Moves `order` to `next` unless its status changed underneath us.
    async fn transition(&self, mut order: Order, next: OrderStatus) -> DbResult<Order> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
            .bind(next)
            .bind(now)
            .bind(&order.id)
            .bind(order.status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(invalid_status(&order));
        }

        order.status = next;
        order.updated_at = now;
        Ok(order)
    }
}

fn invalid_status(order: &Order) -> DbError {
    CoreError::InvalidOrderStatus {
        order_id: order.id.clone(),
        current_status: order.status.to_string(),
    }
    .into()
}

/// Reads and prices every line inside the open transaction.
async fn quote_lines(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: &str,
    lines: &[LineRequest],
    on: NaiveDate,
) -> DbResult<OrderQuote> {
    let mut quotes = Vec::with_capacity(lines.len());

    for line in lines {
        let product = product::find_by_slug(&mut **tx, tenant_id, &line.product_slug)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_slug.clone()))?;

        if !product.is_available {
            return Err(CoreError::invalid_line(&product.slug, "product is not available").into());
        }

        let category = category::find(&mut **tx, tenant_id, &product.category_id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", &product.category_id))?;

        let product_target = DiscountTarget::Product(product.id.clone());
        let category_target = DiscountTarget::Category(product.category_id.clone());
        let product_discounts = discount::active_for(&mut **tx, tenant_id, &product_target, on).await?;
        let category_discounts = discount::active_for(&mut **tx, tenant_id, &category_target, on).await?;

        let price = resolve(&product, &category, &product_discounts, &category_discounts, on)?;
        quotes.push(price_line(&product, &price, line)?);
    }

    Ok(OrderQuote::from_lines(quotes)?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use crate::Database;
    use shopfront_core::{ProductUpdate, Store, Weight};

    struct Shop {
        db: Database,
        store: Store,
        rice_id: String,
        discount_id: String,
    }

    /// Rice at 40.00/kg with 25% off in March 2024, eggs at 10.00 each.
    async fn shop() -> Shop {
        let db = setup().await;
        let s = store(&db, "green-grocer").await;
        let staples = category(&db, &s.id, "Staples").await;
        let rice = per_kg(&db, &s.id, &staples.id, "rice", 4_000).await;
        per_unit(&db, &s.id, &staples.id, "eggs", 1_000).await;

        let d = db
            .discounts()
            .create(
                &s.id,
                new_discount(DiscountTarget::Product(rice.id.clone()), 2_500, date(2024, 3, 1), date(2024, 3, 31)),
            )
            .await
            .unwrap();

        Shop {
            db,
            store: s,
            rice_id: rice.id,
            discount_id: d.id,
        }
    }

    fn mixed_lines() -> Vec<LineRequest> {
        vec![
            LineRequest::by_weight("rice", Weight::from_grams(2_500)),
            LineRequest::by_quantity("eggs", 3),
        ]
    }

    async fn row_counts(db: &Database) -> (i64, i64, i64) {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let discounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_discounts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        (orders, items, discounts)
    }

    #[tokio::test]
    async fn test_place_mixed_order() {
        let shop = shop().await;
        let placed = shop
            .db
            .orders()
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();

        assert_eq!(placed.order.total_cents, 10_500);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.items.len(), 2);

        let rice = &placed.items[0];
        assert_eq!(rice.product_id, shop.rice_id);
        assert_eq!(rice.weight_grams, Some(2_500));
        assert_eq!(rice.quantity, None);
        assert_eq!(rice.base_unit_price_cents, 4_000);
        assert_eq!(rice.discount_bps, 2_500);
        assert_eq!(rice.unit_price_cents, 3_000);
        assert_eq!(rice.line_total_cents, 7_500);

        let eggs = &placed.items[1];
        assert_eq!(eggs.quantity, Some(3));
        assert_eq!(eggs.discount_bps, 0);
        assert_eq!(eggs.line_total_cents, 3_000);

        assert_eq!(placed.applied_discount_ids, vec![shop.discount_id.clone()]);

        // stored rows match what was returned
        let orders = shop.db.orders();
        let stored = orders.get(&shop.store.id, &placed.order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 10_500);
        let items = orders.items(&placed.order.id).await.unwrap();
        assert_eq!(items.iter().map(|i| i.line_total_cents).sum::<i64>(), stored.total_cents);
        assert_eq!(items[0].slug_snapshot, "rice");
        assert_eq!(
            orders.applied_discounts(&placed.order.id).await.unwrap(),
            vec![shop.discount_id]
        );
    }

    #[tokio::test]
    async fn test_discount_outside_window_is_not_applied() {
        let shop = shop().await;
        let placed = shop
            .db
            .orders()
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 4, 1))
            .await
            .unwrap();

        assert_eq!(placed.order.total_cents, 13_000);
        assert!(placed.applied_discount_ids.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_product_rolls_back_everything() {
        let shop = shop().await;
        let other = store(&shop.db, "other-store").await;
        let c = category(&shop.db, &other.id, "Dairy").await;
        per_unit(&shop.db, &other.id, &c.id, "milk", 150).await;

        let lines = vec![
            LineRequest::by_weight("rice", Weight::from_grams(1_000)),
            LineRequest::by_quantity("milk", 1),
        ];
        let result = shop
            .db
            .orders()
            .place_order(&shop.store.id, &lines, &ShippingRef::default(), date(2024, 3, 10))
            .await;

        assert!(matches!(result, Err(DbError::Core(CoreError::ProductNotFound(_)))));
        assert_eq!(row_counts(&shop.db).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_invalid_line_rolls_back_everything() {
        let shop = shop().await;
        let lines = vec![
            LineRequest::by_quantity("eggs", 2),
            LineRequest::by_quantity("rice", 2),
        ];
        let result = shop
            .db
            .orders()
            .place_order(&shop.store.id, &lines, &ShippingRef::default(), date(2024, 3, 10))
            .await;

        assert!(matches!(result, Err(DbError::Core(CoreError::InvalidLineItem { .. }))));
        assert_eq!(row_counts(&shop.db).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_empty_order_and_unknown_store() {
        let shop = shop().await;
        let orders = shop.db.orders();

        let empty = orders
            .place_order(&shop.store.id, &[], &ShippingRef::default(), date(2024, 3, 10))
            .await;
        assert!(matches!(empty, Err(DbError::Core(CoreError::InvalidLineItem { .. }))));

        let unknown = orders
            .place_order("no-such-store", &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await;
        assert!(matches!(unknown, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unavailable_product_is_rejected() {
        let shop = shop().await;
        shop.db
            .products()
            .set_availability(&shop.store.id, &shop.rice_id, false)
            .await
            .unwrap();

        let result = shop
            .db
            .orders()
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await;
        assert!(matches!(result, Err(DbError::Core(CoreError::InvalidLineItem { .. }))));
    }

    #[tokio::test]
    async fn test_cancel_only_by_owner_and_only_pending() {
        let shop = shop().await;
        let orders = shop.db.orders();
        let shipping = ShippingRef {
            user_id: Some("user-1".to_string()),
            customer_name: Some("Asha".to_string()),
            ..ShippingRef::default()
        };

        let placed = orders
            .place_order(&shop.store.id, &mixed_lines(), &shipping, date(2024, 3, 10))
            .await
            .unwrap();

        assert!(matches!(
            orders.cancel(&placed.order.id, "user-2").await,
            Err(DbError::NotFound { .. })
        ));

        let cancelled = orders.cancel(&placed.order.id, "user-1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        assert!(matches!(
            orders.cancel(&placed.order.id, "user-1").await,
            Err(DbError::Core(CoreError::InvalidOrderStatus { .. }))
        ));
        assert_eq!(orders.list_for_user("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_confirmation() {
        let shop = shop().await;
        let orders = shop.db.orders();
        let other = store(&shop.db, "other-store").await;

        let placed = orders
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();

        assert!(matches!(
            orders.toggle_confirmation(&other.id, &placed.order.id).await,
            Err(DbError::NotFound { .. })
        ));

        let confirmed = orders.toggle_confirmation(&shop.store.id, &placed.order.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let pending = orders.toggle_confirmation(&shop.store.id, &placed.order.id).await.unwrap();
        assert_eq!(pending.status, OrderStatus::Pending);

        orders.set_status(&shop.store.id, &placed.order.id, OrderStatus::Confirmed).await.unwrap();
        orders.set_status(&shop.store.id, &placed.order.id, OrderStatus::Shipped).await.unwrap();
        assert!(matches!(
            orders.toggle_confirmation(&shop.store.id, &placed.order.id).await,
            Err(DbError::Core(CoreError::InvalidOrderStatus { .. }))
        ));
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let shop = shop().await;
        let orders = shop.db.orders();

        let first = orders
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();
        let second = orders
            .place_order(
                &shop.store.id,
                &[LineRequest::by_quantity("eggs", 1)],
                &ShippingRef::default(),
                date(2024, 3, 10),
            )
            .await
            .unwrap();

        let listed: Vec<String> = orders
            .list(&shop.store.id)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(listed, vec![second.order.id, first.order.id]);

        let other = store(&shop.db, "other-store").await;
        assert!(orders.list(&other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seller_moves_order_to_delivered() {
        let shop = shop().await;
        let orders = shop.db.orders();
        let placed = orders
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();
        let id = &placed.order.id;

        // shipping needs a confirmation first
        assert!(matches!(
            orders.set_status(&shop.store.id, id, OrderStatus::Shipped).await,
            Err(DbError::Core(CoreError::InvalidOrderStatus { .. }))
        ));

        let other = store(&shop.db, "other-store").await;
        assert!(matches!(
            orders.set_status(&other.id, id, OrderStatus::Confirmed).await,
            Err(DbError::NotFound { .. })
        ));

        for next in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
            let order = orders.set_status(&shop.store.id, id, next).await.unwrap();
            assert_eq!(order.status, next);
        }

        assert!(matches!(
            orders.set_status(&shop.store.id, id, OrderStatus::Cancelled).await,
            Err(DbError::Core(CoreError::InvalidOrderStatus { .. }))
        ));

        let stored = orders.get(&shop.store.id, id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
        assert_eq!(stored.total_cents, placed.order.total_cents);
    }

    #[tokio::test]
    async fn test_seller_can_cancel_confirmed_order() {
        let shop = shop().await;
        let orders = shop.db.orders();
        let placed = orders
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();

        orders.set_status(&shop.store.id, &placed.order.id, OrderStatus::Confirmed).await.unwrap();
        let cancelled = orders
            .set_status(&shop.store.id, &placed.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_stored_prices_survive_catalog_changes() {
        let shop = shop().await;
        let orders = shop.db.orders();
        let placed = orders
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await
            .unwrap();

        // raise the discount, then reprice and rename the product
        shop.db
            .discounts()
            .update(
                &shop.store.id,
                &shop.discount_id,
                new_discount(DiscountTarget::Product(shop.rice_id.clone()), 5_000, date(2024, 3, 1), date(2024, 3, 31)),
            )
            .await
            .unwrap();
        let rice = shop.db.products().get_by_id(&shop.store.id, &shop.rice_id).await.unwrap().unwrap();
        shop.db
            .products()
            .update(
                &shop.store.id,
                &shop.rice_id,
                ProductUpdate {
                    name: "Premium Rice".into(),
                    price_per_kg_cents: Some(9_000),
                    ..ProductUpdate::from(&rice)
                },
            )
            .await
            .unwrap();
        shop.db.discounts().delete(&shop.store.id, &shop.discount_id).await.unwrap();

        let stored = orders.get(&shop.store.id, &placed.order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 10_500);

        let items = orders.items(&placed.order.id).await.unwrap();
        let rice_item = &items[0];
        assert_eq!(rice_item.name_snapshot, "rice");
        assert_eq!(rice_item.base_unit_price_cents, 4_000);
        assert_eq!(rice_item.discount_bps, 2_500);
        assert_eq!(rice_item.unit_price_cents, 3_000);
        assert_eq!(rice_item.line_total_cents, 7_500);
        assert_eq!(items[1].line_total_cents, 3_000);

        assert_eq!(
            orders.applied_discounts(&placed.order.id).await.unwrap(),
            vec![shop.discount_id.clone()]
        );

        // a new order picks up the new price with no discount
        let again = orders
            .place_order(
                &shop.store.id,
                &[LineRequest::by_weight("rice", Weight::from_grams(1_000))],
                &ShippingRef::default(),
                date(2024, 3, 10),
            )
            .await
            .unwrap();
        assert_eq!(again.order.total_cents, 9_000);
        assert!(again.applied_discount_ids.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_stored_price_is_rejected_without_writes() {
        let shop = shop().await;
        // bypasses the price cap the repository enforces
        sqlx::query("UPDATE products SET price_per_unit_cents = ?1 WHERE slug = 'eggs'")
            .bind(i64::MAX / 2)
            .execute(shop.db.pool())
            .await
            .unwrap();

        let result = shop
            .db
            .orders()
            .place_order(&shop.store.id, &mixed_lines(), &ShippingRef::default(), date(2024, 3, 10))
            .await;

        assert!(matches!(result, Err(DbError::Core(CoreError::AmountOverflow { .. }))));
        assert_eq!(row_counts(&shop.db).await, (0, 0, 0));
    }
}
