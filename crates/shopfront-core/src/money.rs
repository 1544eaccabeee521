//! # Money Module
//!
//! Provides `Money`, `DiscountRate` and `Weight`, the three integer
//! quantities every price in Shopfront is built from.
//!
//! Nothing here touches a float on the pricing path: a price is whole
//! cents, a discount is basis points (2500 = 25%) and a weight is grams.
//! Each multiplication that leaves the integer grid rounds half-up once.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::{DiscountRate, Money, Weight};
//!
//! let per_kg = Money::from_cents(4_000);                      // 40.00 / kg
//! let sale = per_kg.apply_discount(DiscountRate::from_bps(2_500)); // 30.00 / kg
//! let line = sale.times_weight(Weight::from_grams(2_500)).unwrap(); // 2.5 kg
//! assert_eq!(line.cents(), 7_500);                             // 75.00
//! ```
//!
//! Line and order arithmetic is checked: `times_weight`, `multiply_quantity`
//! and `checked_add` return `None` instead of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// ---- money ----

/// A monetary value in the smallest currency unit (cents, paise, ...).
///
/// ## Where Money is Used
/// ```text
/// Product.price_per_*_cents ──► resolve() ──► ResolvedPrice.unit_price()
///                                                   │
///                                   price_line() ◄──┘
///                                        │
///                                   LineQuote.line_total ──► OrderQuote.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Wraps an amount already in cents.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage discount and returns the discounted price.
    ///
    /// Computes `round2(price × (1 − rate))` directly on the remaining share,
    /// rounding half-up to the cent. A zero rate returns the price untouched.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::{DiscountRate, Money};
    ///
    /// let base = Money::from_cents(999); // 9.99
    /// let sale = base.apply_discount(DiscountRate::from_bps(1_500)); // 15% off
    /// assert_eq!(sale.cents(), 849); // 8.4915 → 8.49
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        if rate.is_zero() {
            return *self;
        }
        let remaining_bps = DiscountRate::MAX_BPS.saturating_sub(rate.bps()) as i128;
        // |result| never exceeds |self|, so it fits back into i64
        Money::from_cents(div_round_half_up(self.0 as i128 * remaining_bps, 10_000) as i64)
    }

    /// Multiplies a per-unit price by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1_000);
    /// assert_eq!(unit_price.multiply_quantity(3), Some(Money::from_cents(3_000)));
    /// assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Multiplies a per-kg price by a weight, rounding half-up to the cent.
    /// `None` when the rounded total does not fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::{Money, Weight};
    ///
    /// let per_kg = Money::from_cents(1_999);
    /// // 19.99 × 0.333 kg = 6.65667 → 6.66
    /// assert_eq!(per_kg.times_weight(Weight::from_grams(333)), Some(Money::from_cents(666)));
    /// ```
    pub fn times_weight(&self, weight: Weight) -> Option<Money> {
        let cents = div_round_half_up(
            self.0 as i128 * weight.grams() as i128,
            Weight::GRAMS_PER_KG as i128,
        );
        i64::try_from(cents).ok().map(Money)
    }

    /// Sum of two amounts. `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// Integer division rounding half away from zero.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// ---- discount rate ----

/// Discount percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. Sellers enter percentages with two
/// decimals (e.g. 12.5%), which fit exactly: 12.5% = 1250 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Raw basis points, 0..=10000.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percent for labels like "25% off". Never used in arithmetic.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// ---- weight ----

/// A weight in grams, used for per-kg products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Weight(i64);

impl Weight {
    pub const GRAMS_PER_KG: i64 = 1_000;

    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    /// Returns the weight in kilograms (for display only).
    #[inline]
    pub fn kilograms(&self) -> f64 {
        self.0 as f64 / Self::GRAMS_PER_KG as f64
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.kilograms())
    }
}

// ---- operators ----

/// Shows money as `major.minor` without a currency symbol; each store picks
/// its own symbol at render time.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}
