//! # Pricing Module
//!
//! The discount resolver: turns a product, its category and the discounts
//! targeting either of them into one effective price for a given day.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(product, category, product_discounts, category_discounts, on)  │
//! │                                                                         │
//! │  product_discounts ──► active on `on`? ──► max rate ──┐                 │
//! │                                                        ├─► max ─► rate  │
//! │  category_discounts ─► active on `on`? ──► max rate ──┘                 │
//! │                                                                         │
//! │  base  = price_per_kg ?? price_per_unit                                 │
//! │  rate == 0  ──► SalePrice::NoDiscount                                   │
//! │  rate  > 0  ──► SalePrice::Discounted(round2(base × (1 − rate)))        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same function prices the storefront listing, the product page and
//! every order line, so the three can never disagree for the same day.
//!
//! Callers may pass unfiltered discount lists; activity is always checked
//! here against the single `on` date.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::types::{Category, Discount, DiscountTarget, PricingMode, Product};

// =============================================================================
// Result Types
// =============================================================================

/// Whether a sale price applies.
///
/// `NoDiscount` is distinct from a discount that happens to save nothing:
/// front-ends render the "sale" badge only for `Discounted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
#[ts(export)]
pub enum SalePrice {
    NoDiscount,
    Discounted(Money),
}

/// Which kind of discount won the resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountSource {
    Product,
    Category,
}

/// The discount record that produced the effective rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub discount_id: String,
    pub source: DiscountSource,
    pub rate: DiscountRate,
}

/// Outcome of resolving one product on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedPrice {
    /// Effective discount (zero when nothing is active).
    pub rate: DiscountRate,
    /// Undiscounted price per kg or per unit.
    pub base_price: Money,
    pub sale_price: SalePrice,
    /// Winning discount; `None` exactly when `rate` is zero.
    pub applied: Option<AppliedDiscount>,
}

impl ResolvedPrice {
    /// The discounted price, or `None` when no discount is active.
    #[inline]
    pub fn effective_price(&self) -> Option<Money> {
        match self.sale_price {
            SalePrice::Discounted(price) => Some(price),
            SalePrice::NoDiscount => None,
        }
    }

    /// The price actually charged per kg or per unit.
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.effective_price().unwrap_or(self.base_price)
    }

    #[inline]
    pub fn is_discounted(&self) -> bool {
        matches!(self.sale_price, SalePrice::Discounted(_))
    }
}

/// A catalog product with its price resolved for one day, as shown on the
/// storefront listing and the product page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedProduct {
    pub product: Product,
    pub category: Category,
    pub mode: PricingMode,
    pub price: ResolvedPrice,
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the effective price of `product` on `on`.
///
/// ## Arguments
/// * `product_discounts` - discounts targeting this product (any dates)
/// * `category_discounts` - discounts targeting the product's category (any dates)
/// * `on` - reference date, used for both lists
///
/// ## Errors
/// - `TenantMismatch` when the category or a discount belongs to another tenant
/// - `CategoryMismatch` when `category` is not the product's category
/// - `InvalidDiscountTarget` when a discount targets something else
/// - `InvalidProductPricing` when the product has no usable base price
///
/// ## Attribution
/// On equal rates the product discount is reported as the winner; a category
/// discount wins only when strictly greater. Within one list the first
/// maximal record wins.
///
/// ## Example
/// ```rust
/// use chrono::{NaiveDate, Utc};
/// use shopfront_core::{resolve, Category, Product, SalePrice};
///
/// let now = Utc::now();
/// let category = Category {
///     id: "c-1".into(), tenant_id: "t-1".into(), name: "Fruit".into(),
///     created_at: now, updated_at: now,
/// };
/// let product = Product {
///     id: "p-1".into(), tenant_id: "t-1".into(), category_id: "c-1".into(),
///     slug: "mango".into(), name: "Mango".into(), description: None,
///     price_per_kg_cents: None, price_per_unit_cents: Some(10_000),
///     unit_label: Some("box".into()), is_available: true,
///     created_at: now, updated_at: now,
/// };
///
/// let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let price = resolve(&product, &category, &[], &[], on).unwrap();
/// assert!(price.rate.is_zero());
/// assert_eq!(price.sale_price, SalePrice::NoDiscount);
/// assert_eq!(price.unit_price().cents(), 10_000);
/// ```
pub fn resolve(
    product: &Product,
    category: &Category,
    product_discounts: &[Discount],
    category_discounts: &[Discount],
    on: NaiveDate,
) -> CoreResult<ResolvedPrice> {
    check_category(product, category)?;

    let product_target = DiscountTarget::Product(product.id.clone());
    let category_target = DiscountTarget::Category(product.category_id.clone());
    check_discounts(product, &product_target, product_discounts)?;
    check_discounts(product, &category_target, category_discounts)?;

    let base_price = product.base_price()?;

    let best_product = best_active(product_discounts, on);
    let best_category = best_active(category_discounts, on);

    let winner = match (best_product, best_category) {
        (Some(p), Some(c)) if c.rate > p.rate => Some((c, DiscountSource::Category)),
        (Some(p), _) => Some((p, DiscountSource::Product)),
        (None, Some(c)) => Some((c, DiscountSource::Category)),
        (None, None) => None,
    };

    let rate = winner.map(|(d, _)| d.rate).unwrap_or_default();

    if rate.is_zero() {
        return Ok(ResolvedPrice {
            rate,
            base_price,
            sale_price: SalePrice::NoDiscount,
            applied: None,
        });
    }

    Ok(ResolvedPrice {
        rate,
        base_price,
        sale_price: SalePrice::Discounted(base_price.apply_discount(rate)),
        applied: winner.map(|(d, source)| AppliedDiscount {
            discount_id: d.id.clone(),
            source,
            rate: d.rate,
        }),
    })
}

/// First discount with the highest rate among those active on `on`.
fn best_active(discounts: &[Discount], on: NaiveDate) -> Option<&Discount> {
    discounts
        .iter()
        .filter(|d| d.is_active_on(on))
        .fold(None, |best: Option<&Discount>, d| match best {
            Some(b) if d.rate <= b.rate => Some(b),
            _ => Some(d),
        })
}

fn check_category(product: &Product, category: &Category) -> CoreResult<()> {
    if category.tenant_id != product.tenant_id {
        return Err(CoreError::TenantMismatch {
            entity: "Category".to_string(),
            id: category.id.clone(),
            expected: product.tenant_id.clone(),
            actual: category.tenant_id.clone(),
        });
    }

    if category.id != product.category_id {
        return Err(CoreError::CategoryMismatch {
            slug: product.slug.clone(),
            category_id: category.id.clone(),
        });
    }

    Ok(())
}

fn check_discounts(product: &Product, expected: &DiscountTarget, discounts: &[Discount]) -> CoreResult<()> {
    for discount in discounts {
        if discount.tenant_id != product.tenant_id {
            return Err(CoreError::TenantMismatch {
                entity: "Discount".to_string(),
                id: discount.id.clone(),
                expected: product.tenant_id.clone(),
                actual: discount.tenant_id.clone(),
            });
        }

        if &discount.target != expected {
            return Err(CoreError::invalid_target(
                &discount.id,
                format!("targets {:?}, expected {:?}", discount.target, expected),
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Discount Index
// =============================================================================

/// A tenant's discounts grouped by target, for pricing many products at once
/// (the storefront listing) from a single query.
#[derive(Debug, Clone, Default)]
pub struct DiscountIndex {
    by_product: HashMap<String, Vec<Discount>>,
    by_category: HashMap<String, Vec<Discount>>,
}

impl DiscountIndex {
    /// Groups `discounts` by target.
    pub fn new(discounts: impl IntoIterator<Item = Discount>) -> Self {
        let mut index = DiscountIndex::default();
        for discount in discounts {
            let bucket = match &discount.target {
                DiscountTarget::Product(id) => index.by_product.entry(id.clone()),
                DiscountTarget::Category(id) => index.by_category.entry(id.clone()),
            };
            bucket.or_default().push(discount);
        }
        index
    }

    pub fn for_product(&self, product_id: &str) -> &[Discount] {
        self.by_product.get(product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn for_category(&self, category_id: &str) -> &[Discount] {
        self.by_category.get(category_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolves `product` against the indexed discounts.
    pub fn resolve(&self, product: &Product, category: &Category, on: NaiveDate) -> CoreResult<ResolvedPrice> {
        resolve(
            product,
            category,
            self.for_product(&product.id),
            self.for_category(&product.category_id),
            on,
        )
    }

    /// Resolves and bundles the result for display.
    pub fn price(&self, product: Product, category: Category, on: NaiveDate) -> CoreResult<PricedProduct> {
        let price = self.resolve(&product, &category, on)?;
        let mode = product.pricing_mode()?;
        Ok(PricedProduct {
            product,
            category,
            mode,
            price,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TENANT: &str = "tenant-a";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn category() -> Category {
        let now = Utc::now();
        Category {
            id: "cat-fruit".into(),
            tenant_id: TENANT.into(),
            name: "Fruit".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn product(per_kg: Option<i64>, per_unit: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: "prod-apple".into(),
            tenant_id: TENANT.into(),
            category_id: "cat-fruit".into(),
            slug: "apples".into(),
            name: "Apples".into(),
            description: None,
            price_per_kg_cents: per_kg,
            price_per_unit_cents: per_unit,
            unit_label: None,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn discount(id: &str, target: DiscountTarget, bps: u32, start: NaiveDate, end: NaiveDate) -> Discount {
        Discount {
            id: id.into(),
            tenant_id: TENANT.into(),
            target,
            rate: DiscountRate::from_bps(bps),
            start_date: start,
            end_date: end,
            created_at: Utc::now(),
        }
    }

    fn on_product(id: &str, bps: u32, start: NaiveDate, end: NaiveDate) -> Discount {
        discount(id, DiscountTarget::Product("prod-apple".into()), bps, start, end)
    }

    fn on_category(id: &str, bps: u32, start: NaiveDate, end: NaiveDate) -> Discount {
        discount(id, DiscountTarget::Category("cat-fruit".into()), bps, start, end)
    }

    fn january() -> (NaiveDate, NaiveDate) {
        (date(2024, 1, 1), date(2024, 1, 31))
    }

    #[test]
    fn test_no_discounts_means_no_sale_price() {
        let price = resolve(&product(None, Some(10_000)), &category(), &[], &[], date(2024, 1, 15)).unwrap();

        assert!(price.rate.is_zero());
        assert_eq!(price.base_price, Money::from_cents(10_000));
        assert_eq!(price.sale_price, SalePrice::NoDiscount);
        assert_eq!(price.effective_price(), None);
        assert_eq!(price.applied, None);
        assert_eq!(price.unit_price(), Money::from_cents(10_000));
    }

    #[test]
    fn test_best_of_product_and_category() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(10_000)),
            &category(),
            &[on_product("d-prod", 2_000, start, end)],
            &[on_category("d-cat", 1_000, start, end)],
            date(2024, 1, 15),
        )
        .unwrap();

        assert_eq!(price.rate, DiscountRate::from_bps(2_000));
        assert_eq!(price.effective_price(), Some(Money::from_cents(8_000)));
        assert_eq!(price.applied.unwrap().discount_id, "d-prod");
    }

    #[test]
    fn test_expired_product_discount_falls_back_to_category() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(10_000)),
            &category(),
            &[on_product("d-prod", 2_000, start, end)],
            &[on_category("d-cat", 1_000, date(2024, 1, 15), date(2024, 2, 29))],
            date(2024, 2, 1),
        )
        .unwrap();

        assert_eq!(price.rate, DiscountRate::from_bps(1_000));
        assert_eq!(price.effective_price(), Some(Money::from_cents(9_000)));
        let applied = price.applied.unwrap();
        assert_eq!(applied.source, DiscountSource::Category);
        assert_eq!(applied.discount_id, "d-cat");
    }

    #[test]
    fn test_expired_product_discount_without_category_discount() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(10_000)),
            &category(),
            &[on_product("d-prod", 2_000, start, end)],
            &[],
            date(2024, 2, 1),
        )
        .unwrap();

        assert_eq!(price.sale_price, SalePrice::NoDiscount);
    }

    #[test]
    fn test_window_is_inclusive_at_both_ends() {
        let (start, end) = january();
        let product_discounts = [on_product("d", 1_500, start, end)];
        let category_discounts = [on_category("c", 1_500, start, end)];
        let p = product(Some(2_000), None);
        let c = category();

        for day in [start, end] {
            let by_product = resolve(&p, &c, &product_discounts, &[], day).unwrap();
            assert_eq!(by_product.rate.bps(), 1_500, "product discount on {day}");
            let by_category = resolve(&p, &c, &[], &category_discounts, day).unwrap();
            assert_eq!(by_category.rate.bps(), 1_500, "category discount on {day}");
        }

        for day in [date(2023, 12, 31), date(2024, 2, 1)] {
            let by_product = resolve(&p, &c, &product_discounts, &[], day).unwrap();
            assert!(by_product.rate.is_zero(), "product discount on {day}");
            let by_category = resolve(&p, &c, &[], &category_discounts, day).unwrap();
            assert!(by_category.rate.is_zero(), "category discount on {day}");
        }
    }

    #[test]
    fn test_adding_a_higher_discount_never_lowers_the_rate() {
        let (start, end) = january();
        let on = date(2024, 1, 10);
        let p = product(None, Some(999));
        let c = category();

        let mut product_discounts = vec![];
        let mut last = DiscountRate::zero();
        for (i, bps) in [500, 250, 1_200, 1_200, 3_000, 100].into_iter().enumerate() {
            product_discounts.push(on_product(&format!("d-{i}"), bps, start, end));
            let price = resolve(&p, &c, &product_discounts, &[], on).unwrap();
            assert!(price.rate >= last);
            last = price.rate;
        }
        assert_eq!(last.bps(), 3_000);
    }

    #[test]
    fn test_effective_price_is_rounded_base_times_remaining_share() {
        let (start, end) = january();
        let on = date(2024, 1, 10);
        let c = category();

        for (base, bps, expected) in [(999, 1_500, 849), (4_000, 2_500, 3_000), (1, 5_000, 1), (12_345, 3_333, 8_230)] {
            let price = resolve(
                &product(None, Some(base)),
                &c,
                &[on_product("d", bps, start, end)],
                &[],
                on,
            )
            .unwrap();
            assert_eq!(price.effective_price(), Some(Money::from_cents(expected)), "{base} at {bps} bps");
        }
    }

    #[test]
    fn test_zero_percent_discount_is_no_discount() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(1_000)),
            &category(),
            &[on_product("d-zero", 0, start, end)],
            &[],
            date(2024, 1, 10),
        )
        .unwrap();

        assert_eq!(price.sale_price, SalePrice::NoDiscount);
        assert_eq!(price.applied, None);
    }

    #[test]
    fn test_full_discount_is_discounted_to_zero() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(1_000)),
            &category(),
            &[on_product("d-free", 10_000, start, end)],
            &[],
            date(2024, 1, 10),
        )
        .unwrap();

        assert_eq!(price.sale_price, SalePrice::Discounted(Money::zero()));
        assert!(price.is_discounted());
    }

    #[test]
    fn test_tie_is_attributed_to_product_discount() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(1_000)),
            &category(),
            &[on_product("d-prod", 1_000, start, end)],
            &[on_category("d-cat", 1_000, start, end)],
            date(2024, 1, 10),
        )
        .unwrap();

        let applied = price.applied.unwrap();
        assert_eq!(applied.source, DiscountSource::Product);
        assert_eq!(applied.discount_id, "d-prod");
    }

    #[test]
    fn test_first_maximal_discount_wins_within_a_list() {
        let (start, end) = january();
        let price = resolve(
            &product(None, Some(1_000)),
            &category(),
            &[],
            &[
                on_category("d-1", 500, start, end),
                on_category("d-2", 1_500, start, end),
                on_category("d-3", 1_500, start, end),
            ],
            date(2024, 1, 10),
        )
        .unwrap();

        assert_eq!(price.applied.unwrap().discount_id, "d-2");
    }

    #[test]
    fn test_rejects_cross_tenant_discount() {
        let (start, end) = january();
        let mut foreign = on_category("d-foreign", 5_000, start, end);
        foreign.tenant_id = "tenant-b".into();

        let result = resolve(&product(None, Some(1_000)), &category(), &[], &[foreign], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::TenantMismatch { .. })));
    }

    #[test]
    fn test_rejects_cross_tenant_category() {
        let mut c = category();
        c.tenant_id = "tenant-b".into();
        let result = resolve(&product(None, Some(1_000)), &c, &[], &[], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::TenantMismatch { .. })));
    }

    #[test]
    fn test_rejects_foreign_category() {
        let mut c = category();
        c.id = "cat-veg".into();
        let result = resolve(&product(None, Some(1_000)), &c, &[], &[], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::CategoryMismatch { .. })));
    }

    #[test]
    fn test_rejects_discount_for_another_target() {
        let (start, end) = january();
        let other_product = discount("d-other", DiscountTarget::Product("prod-pear".into()), 1_000, start, end);
        let result = resolve(&product(None, Some(1_000)), &category(), &[other_product], &[], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::InvalidDiscountTarget { .. })));

        // a category discount passed in the product list
        let misplaced = on_category("d-cat", 1_000, start, end);
        let result = resolve(&product(None, Some(1_000)), &category(), &[misplaced], &[], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::InvalidDiscountTarget { .. })));
    }

    #[test]
    fn test_rejects_product_without_price() {
        let result = resolve(&product(None, None), &category(), &[], &[], date(2024, 1, 10));
        assert!(matches!(result, Err(CoreError::InvalidProductPricing { .. })));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let (start, end) = january();
        let p = product(Some(4_000), None);
        let c = category();
        let pd = [on_product("d-prod", 2_500, start, end)];
        let cd = [on_category("d-cat", 1_000, start, end)];
        let on = date(2024, 1, 20);

        let first = resolve(&p, &c, &pd, &cd, on).unwrap();
        let second = resolve(&p, &c, &pd, &cd, on).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sale_price_serialization_keeps_the_distinction() {
        let none = serde_json::to_value(SalePrice::NoDiscount).unwrap();
        assert_eq!(none, serde_json::json!({ "kind": "no_discount" }));

        let some = serde_json::to_value(SalePrice::Discounted(Money::from_cents(0))).unwrap();
        assert_eq!(some, serde_json::json!({ "kind": "discounted", "amount": 0 }));
    }

    #[test]
    fn test_index_groups_by_target() {
        let (start, end) = january();
        let index = DiscountIndex::new(vec![
            on_product("d-prod", 2_000, start, end),
            on_category("d-cat", 1_000, start, end),
            discount("d-veg", DiscountTarget::Category("cat-veg".into()), 4_000, start, end),
        ]);

        assert_eq!(index.for_product("prod-apple").len(), 1);
        assert_eq!(index.for_category("cat-fruit").len(), 1);
        assert!(index.for_product("prod-pear").is_empty());

        let priced = index.price(product(Some(4_000), None), category(), date(2024, 1, 5)).unwrap();
        assert_eq!(priced.mode, PricingMode::PerKg(Money::from_cents(4_000)));
        assert_eq!(priced.price.rate.bps(), 2_000);
        assert_eq!(priced.price.effective_price(), Some(Money::from_cents(3_200)));
    }
}
