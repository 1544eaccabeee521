//! # shopfront-core: Pure Pricing Logic for Shopfront
//!
//! This crate is the **heart** of Shopfront. It owns the discount resolution
//! and pricing engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Callers: storefront listing, product page, order API     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopfront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   order   │  │   │
//! │  │   │  Product  │  │   Money   │  │  resolve  │  │ LineQuote │  │   │
//! │  │   │  Discount │  │  Weight   │  │ SalePrice │  │ OrderQuote│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK IN PRICING • PURE FUNCTIONS  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopfront-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, order transaction            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Discount, Order, ...)
//! - [`money`] - Money, DiscountRate and Weight with integer arithmetic
//! - [`pricing`] - The discount resolver
//! - [`order`] - Line item and order total math
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::money::{DiscountRate, Money};
//!
//! let base = Money::from_cents(10_000); // 100.00
//! let sale = base.apply_discount(DiscountRate::from_bps(2_000)); // 20% off
//! assert_eq!(sale.cents(), 8_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money, Weight};
pub use order::{price_line, LineMeasure, LineQuote, LineRequest, OrderQuote};
pub use pricing::{
    resolve, AppliedDiscount, DiscountIndex, DiscountSource, PricedProduct, ResolvedPrice,
    SalePrice,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single per-unit line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum weight of a single per-kg line, in grams (999.9 kg).
pub const MAX_ITEM_WEIGHT_GRAMS: i64 = 999_900;

/// Highest list price a seller may set, per kg or per unit (1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Returns today's calendar date in UTC.
///
/// Pricing functions never read the clock themselves. Call this once at the
/// edge (request handler, page loader) and pass the same date everywhere the
/// request prices something.
pub fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
