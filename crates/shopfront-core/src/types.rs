//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Store       │   │    Category     │   │    Product      │       │
//! │  │  (the tenant)   │◄──│  tenant_id      │◄──│  category_id    │       │
//! │  │  store_slug     │   │  name           │   │  slug (unique)  │       │
//! │  └─────────────────┘   └─────────────────┘   │  per_kg | unit  │       │
//! │           ▲                     ▲            └─────────────────┘       │
//! │           │                     │                     ▲                │
//! │  ┌────────┴────────┐   ┌────────┴─────────────────────┴───────┐       │
//! │  │     Order       │   │  Discount                             │       │
//! │  │  status, total  │   │  target: Product(id) | Category(id)   │       │
//! │  │  └─ OrderItem   │   │  rate (bps), [start_date, end_date]   │       │
//! │  └─────────────────┘   └───────────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record carries `tenant_id`, the id of the owning [`Store`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountRate, Money};
use crate::validation;

// =============================================================================
// Store
// =============================================================================

/// A seller's store. Its `id` is the tenant id of everything it owns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: String,
    /// Public URL segment of the storefront.
    pub store_slug: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Names may repeat across tenants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in a store's catalog.
///
/// `price_per_kg_cents` and `price_per_unit_cents` are exclusive by
/// convention: exactly one is expected to be set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub category_id: String,
    /// Globally unique, immutable after creation.
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price_per_kg_cents: Option<i64>,
    pub price_per_unit_cents: Option<i64>,
    /// Display label for per-unit products ("bunch", "dozen", ...).
    pub unit_label: Option<String>,
    pub is_available: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// How a product is sold, together with its undiscounted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "mode", content = "price", rename_all = "snake_case")]
#[ts(export)]
pub enum PricingMode {
    PerKg(Money),
    PerUnit(Money),
}

impl PricingMode {
    /// The undiscounted price per kg or per unit.
    #[inline]
    pub fn base_price(&self) -> Money {
        match self {
            PricingMode::PerKg(price) | PricingMode::PerUnit(price) => *price,
        }
    }
}

impl Product {
    /// Returns the product's pricing mode.
    ///
    /// The per-kg price takes precedence when both fields are set.
    ///
    /// ## Errors
    /// `InvalidProductPricing` when neither field is set or the chosen
    /// price is negative.
    pub fn pricing_mode(&self) -> CoreResult<PricingMode> {
        let mode = match (self.price_per_kg_cents, self.price_per_unit_cents) {
            (Some(cents), _) => PricingMode::PerKg(Money::from_cents(cents)),
            (None, Some(cents)) => PricingMode::PerUnit(Money::from_cents(cents)),
            (None, None) => {
                return Err(CoreError::InvalidProductPricing {
                    slug: self.slug.clone(),
                })
            }
        };

        if mode.base_price().is_negative() {
            return Err(CoreError::InvalidProductPricing {
                slug: self.slug.clone(),
            });
        }

        Ok(mode)
    }

    /// Returns the undiscounted price.
    pub fn base_price(&self) -> CoreResult<Money> {
        Ok(self.pricing_mode()?.base_price())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price_per_kg_cents: Option<i64>,
    pub price_per_unit_cents: Option<i64>,
    pub unit_label: Option<String>,
}

impl NewProduct {
    /// Validates the product before it is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_slug(&self.slug)?;
        validation::validate_product_name(&self.name)?;
        validation::validate_uuid(&self.category_id)?;
        validate_prices(self.price_per_kg_cents, self.price_per_unit_cents)
    }
}

/// Seller edits to an existing product. The slug cannot change.
///
/// Placed orders keep the prices they were stored with; an edit only affects
/// what later listings and orders resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_per_kg_cents: Option<i64>,
    pub price_per_unit_cents: Option<i64>,
    pub unit_label: Option<String>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_product_name(&self.name)?;
        validation::validate_uuid(&self.category_id)?;
        validate_prices(self.price_per_kg_cents, self.price_per_unit_cents)
    }
}

impl From<&Product> for ProductUpdate {
    fn from(product: &Product) -> Self {
        ProductUpdate {
            category_id: product.category_id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price_per_kg_cents: product.price_per_kg_cents,
            price_per_unit_cents: product.price_per_unit_cents,
            unit_label: product.unit_label.clone(),
        }
    }
}

/// Exactly one of the two prices, within the allowed range.
fn validate_prices(per_kg: Option<i64>, per_unit: Option<i64>) -> Result<(), ValidationError> {
    match (per_kg, per_unit) {
        (Some(cents), None) | (None, Some(cents)) => validation::validate_price_cents(cents),
        _ => Err(ValidationError::ExactlyOne {
            first: "price_per_kg".to_string(),
            second: "price_per_unit".to_string(),
        }),
    }
}

// =============================================================================
// Discount
// =============================================================================

/// What a discount applies to.
///
/// Storage keeps two nullable columns; this enum makes the "both" and
/// "neither" states unrepresentable once a record is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountTarget {
    Product(String),
    Category(String),
}

impl DiscountTarget {
    /// Builds a target from the nullable storage columns.
    ///
    /// ## Errors
    /// `InvalidDiscountTarget` when both or neither column is set.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::DiscountTarget;
    ///
    /// let target = DiscountTarget::from_columns("d-1", None, Some("cat-1".into())).unwrap();
    /// assert_eq!(target, DiscountTarget::Category("cat-1".into()));
    ///
    /// assert!(DiscountTarget::from_columns("d-2", None, None).is_err());
    /// ```
    pub fn from_columns(
        discount_id: &str,
        product_id: Option<String>,
        category_id: Option<String>,
    ) -> CoreResult<Self> {
        match (product_id, category_id) {
            (Some(id), None) => Ok(DiscountTarget::Product(id)),
            (None, Some(id)) => Ok(DiscountTarget::Category(id)),
            (Some(_), Some(_)) => Err(CoreError::invalid_target(
                discount_id,
                "targets both a product and a category",
            )),
            (None, None) => Err(CoreError::invalid_target(
                discount_id,
                "targets neither a product nor a category",
            )),
        }
    }

    /// Product id column value.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            DiscountTarget::Product(id) => Some(id),
            DiscountTarget::Category(_) => None,
        }
    }

    /// Category id column value.
    pub fn category_id(&self) -> Option<&str> {
        match self {
            DiscountTarget::Category(id) => Some(id),
            DiscountTarget::Product(_) => None,
        }
    }
}

/// A time-bounded percentage discount.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub id: String,
    pub tenant_id: String,
    pub target: DiscountTarget,
    pub rate: DiscountRate,
    /// First day the discount applies (inclusive).
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// Last day the discount applies (inclusive).
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// True when `on` falls inside `[start_date, end_date]`.
    #[inline]
    pub fn is_active_on(&self, on: NaiveDate) -> bool {
        self.start_date <= on && on <= self.end_date
    }
}

/// Input for creating or replacing a discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscount {
    pub target: DiscountTarget,
    pub rate: DiscountRate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewDiscount {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_discount_rate(self.rate)?;
        validation::validate_discount_window(self.start_date, self.end_date)?;
        match &self.target {
            DiscountTarget::Product(id) | DiscountTarget::Category(id) => {
                validation::validate_uuid(id)
            }
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for the seller.
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Shoppers may only cancel orders the seller hasn't acted on.
    #[inline]
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Seller-side toggle between pending and confirmed.
    pub fn toggled(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Pending),
            _ => None,
        }
    }

    /// Moves a seller may make.
    ///
    /// ```text
    /// pending ◄──► confirmed ──► shipped ──► delivered
    ///    │             │
    ///    └─────────────┴──► cancelled
    /// ```
    ///
    /// Delivered and cancelled orders are final. Staying in the same status
    /// is not a transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Pending)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Where an order ships and who placed it. Guests have no `user_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShippingRef {
    pub user_id: Option<String>,
    pub shipping_address_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    pub user_id: Option<String>,
    pub shipping_address_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub status: OrderStatus,
    /// Sum of the stored line totals.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a placed order.
/// Uses snapshot pattern to freeze product data and the resolved price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product slug at time of order (frozen).
    pub slug_snapshot: String,
    /// Product name at time of order (frozen).
    pub name_snapshot: String,
    pub weight_grams: Option<i64>,
    pub quantity: Option<i64>,
    /// Undiscounted price per kg or unit at time of order.
    pub base_unit_price_cents: i64,
    /// Effective discount at time of order.
    pub discount_bps: u32,
    /// Resolved price per kg or unit (frozen).
    pub unit_price_cents: i64,
    /// Rounded line total; order totals sum these.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Counters shown on a seller's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantStats {
    pub orders_today: i64,
    pub pending_orders: i64,
    pub product_count: i64,
    pub category_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
