//! # Order Module
//!
//! Pure order math: turns resolved prices and requested measures into line
//! totals and an order total. The transactional half (reading products and
//! discounts, writing rows) lives in `shopfront-db`.
//!
//! ## Line Pricing
//! ```text
//! LineRequest { slug, weight | quantity }
//!      │
//!      ├── per-kg product   ──► weight required ──► round(unit × grams / 1000)
//!      └── per-unit product ──► quantity required ─► unit × quantity
//!      │
//!      ▼
//! LineQuote { unit_price (frozen), line_total }
//!      │
//!      ▼
//! OrderQuote { total = Σ line_total }
//! ```
//!
//! The order total is the sum of the already-rounded line totals, so it always
//! matches the stored items.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money, Weight};
use crate::pricing::{AppliedDiscount, ResolvedPrice};
use crate::types::{PricingMode, Product};
use crate::validation;

// =============================================================================
// Requests
// =============================================================================

/// One requested line of an order, as submitted by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub product_slug: String,
    /// Required for per-kg products.
    pub weight: Option<Weight>,
    /// Required for per-unit products.
    pub quantity: Option<i64>,
}

impl LineRequest {
    pub fn by_weight(product_slug: impl Into<String>, weight: Weight) -> Self {
        LineRequest {
            product_slug: product_slug.into(),
            weight: Some(weight),
            quantity: None,
        }
    }

    pub fn by_quantity(product_slug: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            product_slug: product_slug.into(),
            weight: None,
            quantity: Some(quantity),
        }
    }
}

/// The validated measure of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum LineMeasure {
    Weight(Weight),
    Quantity(i64),
}

impl LineMeasure {
    /// Weight column value.
    pub fn weight_grams(&self) -> Option<i64> {
        match self {
            LineMeasure::Weight(w) => Some(w.grams()),
            LineMeasure::Quantity(_) => None,
        }
    }

    /// Quantity column value.
    pub fn quantity(&self) -> Option<i64> {
        match self {
            LineMeasure::Quantity(q) => Some(*q),
            LineMeasure::Weight(_) => None,
        }
    }
}

// =============================================================================
// Quotes
// =============================================================================

/// A priced order line, ready to be stored as an `OrderItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineQuote {
    pub product_id: String,
    pub slug: String,
    pub name: String,
    pub measure: LineMeasure,
    pub base_price: Money,
    pub rate: DiscountRate,
    /// Resolved price per kg or per unit.
    pub unit_price: Money,
    pub line_total: Money,
    pub applied: Option<AppliedDiscount>,
}

/// A fully priced order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderQuote {
    pub lines: Vec<LineQuote>,
    pub total: Money,
    /// Distinct discounts that priced at least one line, in line order.
    pub applied_discount_ids: Vec<String>,
}

impl OrderQuote {
    /// Sums priced lines into an order.
    ///
    /// ## Errors
    /// `InvalidLineItem` when `lines` is empty, `Validation` when there are
    /// more than `MAX_ORDER_LINES`, `AmountOverflow` when the total does not
    /// fit in cents.
    pub fn from_lines(lines: Vec<LineQuote>) -> CoreResult<Self> {
        check_line_count(lines.len())?;

        let total = lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.line_total))
            .ok_or_else(|| CoreError::overflow("order total"))?;

        let mut applied_discount_ids: Vec<String> = Vec::new();
        for applied in lines.iter().filter_map(|l| l.applied.as_ref()) {
            if !applied_discount_ids.contains(&applied.discount_id) {
                applied_discount_ids.push(applied.discount_id.clone());
            }
        }

        Ok(OrderQuote {
            lines,
            total,
            applied_discount_ids,
        })
    }
}

/// Rejects empty and oversized orders before anything is read.
pub fn check_line_count(count: usize) -> CoreResult<()> {
    if count == 0 {
        return Err(CoreError::invalid_line("order", "at least one line is required"));
    }
    validation::validate_order_size(count)?;
    Ok(())
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Prices one order line with an already-resolved price.
///
/// ## Errors
/// `InvalidLineItem` when the line names another product, when the measure
/// is missing, doubled or of the wrong kind for the product's pricing mode,
/// or when the weight/quantity is out of range. `AmountOverflow` when the
/// line total does not fit in cents.
///
/// ## Example
/// ```rust
/// use chrono::{NaiveDate, Utc};
/// use shopfront_core::{price_line, resolve, Category, LineRequest, Product, Weight};
///
/// let now = Utc::now();
/// let category = Category {
///     id: "c-1".into(), tenant_id: "t-1".into(), name: "Fruit".into(),
///     created_at: now, updated_at: now,
/// };
/// let product = Product {
///     id: "p-1".into(), tenant_id: "t-1".into(), category_id: "c-1".into(),
///     slug: "apples".into(), name: "Apples".into(), description: None,
///     price_per_kg_cents: Some(4_000), price_per_unit_cents: None,
///     unit_label: None, is_available: true, created_at: now, updated_at: now,
/// };
///
/// let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let price = resolve(&product, &category, &[], &[], on).unwrap();
/// let line = LineRequest::by_weight("apples", Weight::from_grams(2_500));
/// let quote = price_line(&product, &price, &line).unwrap();
/// assert_eq!(quote.line_total.cents(), 10_000);
/// ```
pub fn price_line(product: &Product, price: &ResolvedPrice, line: &LineRequest) -> CoreResult<LineQuote> {
    if line.product_slug != product.slug {
        return Err(CoreError::invalid_line(
            &line.product_slug,
            format!("priced against product {}", product.slug),
        ));
    }

    let slug = &product.slug;
    let unit_price = price.unit_price();

    let (measure, line_total) = match (product.pricing_mode()?, line.weight, line.quantity) {
        (_, Some(_), Some(_)) => {
            return Err(CoreError::invalid_line(slug, "exactly one of weight or quantity must be set"));
        }
        (PricingMode::PerKg(_), Some(weight), None) => {
            validation::validate_weight(weight).map_err(|e| CoreError::invalid_line(slug, e.to_string()))?;
            let total = unit_price.times_weight(weight).ok_or_else(|| CoreError::overflow(slug))?;
            (LineMeasure::Weight(weight), total)
        }
        (PricingMode::PerUnit(_), None, Some(quantity)) => {
            validation::validate_quantity(quantity).map_err(|e| CoreError::invalid_line(slug, e.to_string()))?;
            let total = unit_price.multiply_quantity(quantity).ok_or_else(|| CoreError::overflow(slug))?;
            (LineMeasure::Quantity(quantity), total)
        }
        (PricingMode::PerKg(_), _, _) => {
            return Err(CoreError::invalid_line(slug, "priced per kg, weight required"));
        }
        (PricingMode::PerUnit(_), _, _) => {
            return Err(CoreError::invalid_line(slug, "priced per unit, quantity required"));
        }
    };

    Ok(LineQuote {
        product_id: product.id.clone(),
        slug: product.slug.clone(),
        name: product.name.clone(),
        measure,
        base_price: price.base_price,
        rate: price.rate,
        unit_price,
        line_total,
        applied: price.applied.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
