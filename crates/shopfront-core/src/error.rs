//! # Errors
//!
//! `CoreError` is what pricing and order assembly return. Seller input
//! checks produce `ValidationError`, which converts into
//! `CoreError::Validation`; shopfront-db wraps both inside `DbError::Core`.
//!
//! Every variant ends the operation that raised it. Nothing is retried.

use thiserror::Error;

/// Pricing and order errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product has no usable base price.
    ///
    /// ## When This Occurs
    /// - Both `price_per_kg` and `price_per_unit` are null
    /// - The configured base price is negative
    #[error("Product {slug} has no usable base price")]
    InvalidProductPricing { slug: String },

    /// Discount record does not target exactly one product or category,
    /// or was handed to the resolver for a target it does not cover.
    #[error("Discount {discount_id} has an invalid target: {reason}")]
    InvalidDiscountTarget { discount_id: String, reason: String },

    /// Product cannot be found inside the requesting tenant.
    ///
    /// ## When This Occurs
    /// - Slug doesn't exist
    /// - Slug belongs to another tenant's store
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A record from one tenant was mixed into another tenant's pricing.
    #[error("{entity} {id} belongs to tenant {actual}, expected {expected}")]
    TenantMismatch {
        entity: String,
        id: String,
        expected: String,
        actual: String,
    },

    /// Category handed to the resolver is not the product's category.
    #[error("Category {category_id} is not the category of product {slug}")]
    CategoryMismatch { slug: String, category_id: String },

    /// Line item measure does not fit the product's pricing mode.
    ///
    /// ## User Workflow
    /// ```text
    /// Order line: { slug: "apples", quantity: 3 }
    ///      │
    ///      ▼
    /// Product "apples" is priced per kg
    ///      │
    ///      ▼
    /// InvalidLineItem { slug: "apples", reason: "priced per kg, weight required" }
    /// ```
    #[error("Invalid line item for {slug}: {reason}")]
    InvalidLineItem { slug: String, reason: String },

    /// A line or order total does not fit in `i64` cents.
    #[error("{context}: amount exceeds the supported range")]
    AmountOverflow { context: String },

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Seller input failed a field check.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidLineItem error.
    pub fn invalid_line(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidLineItem {
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    pub fn overflow(context: impl Into<String>) -> Self {
        CoreError::AmountOverflow {
            context: context.into(),
        }
    }

    /// Creates an InvalidDiscountTarget error.
    pub fn invalid_target(discount_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscountTarget {
            discount_id: discount_id.into(),
            reason: reason.into(),
        }
    }
}

/// Rejected seller or shopper input, raised before anything is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantity, weight, price or bps outside its allowed bounds.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Malformed slug or id.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must be set exclusively.
    #[error("exactly one of {first} or {second} must be set")]
    ExactlyOne { first: String, second: String },

    /// A date window ending before it starts.
    #[error("{field} ends before it starts")]
    InvertedWindow { field: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
