//! # Validation Module
//!
//! Input validation utilities for Shopfront.
//!
//! Seller input is checked here before it reaches SQLite. The schema
//! repeats the hard rules (one discount target, unique slugs, foreign
//! keys) so a row that slips past these checks is still refused.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::validation::{validate_slug, validate_quantity};
//!
//! assert!(validate_slug("red-apples").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::{DiscountRate, Weight};
use crate::{MAX_ITEM_QUANTITY, MAX_ITEM_WEIGHT_GRAMS, MAX_ORDER_LINES, MAX_PRICE_CENTS};

/// Outcome of a single field check.
pub type ValidationResult<T> = Result<T, ValidationError>;

// ---- slugs and names ----

/// Validates a URL slug (product slug or store slug).
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
/// - Lowercase ASCII letters, digits and hyphens only
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_slug;
///
/// assert!(validate_slug("basmati-rice-5kg").is_ok());
/// assert!(validate_slug("").is_err());
/// assert!(validate_slug("Has Space").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: 100,
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, digits, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a category name (1-100 characters after trimming).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("category name", name, 100)
}

/// Validates a store name (1-100 characters after trimming).
pub fn validate_store_name(name: &str) -> ValidationResult<()> {
    validate_name("store name", name, 100)
}

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// ---- amounts ----

/// Units ordered of a per-unit product: 1 to `MAX_ITEM_QUANTITY`.
pub fn validate_quantity(units: i64) -> ValidationResult<()> {
    if units < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if units > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a per-kg weight.
///
/// ## Rules
/// - Must be positive (> 0 g)
/// - Must not exceed MAX_ITEM_WEIGHT_GRAMS (999.9 kg)
pub fn validate_weight(weight: Weight) -> ValidationResult<()> {
    if weight.grams() <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "weight".to_string(),
        });
    }

    if weight.grams() > MAX_ITEM_WEIGHT_GRAMS {
        return Err(ValidationError::OutOfRange {
            field: "weight (g)".to_string(),
            min: 1,
            max: MAX_ITEM_WEIGHT_GRAMS,
        });
    }

    Ok(())
}

/// A list price (per unit or per kg) in cents, from 0 (a giveaway) to
/// `MAX_PRICE_CENTS`. The cap keeps every line and order total inside `i64`.
///
/// ```rust
/// use shopfront_core::validation::validate_price_cents;
/// use shopfront_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents(349).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-1).is_err());
/// assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "list price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a discount rate: 0% to 100%.
pub fn validate_discount_rate(rate: DiscountRate) -> ValidationResult<()> {
    if rate.bps() > DiscountRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount (bps)".to_string(),
            min: 0,
            max: DiscountRate::MAX_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a discount validity window. A single-day window is allowed.
pub fn validate_discount_window(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::InvertedWindow {
            field: "discount window".to_string(),
        });
    }

    Ok(())
}

/// Validates the number of lines in an order.
pub fn validate_order_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "order lines".to_string(),
        });
    }

    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// ---- ids ----

/// Category and product ids are UUIDs generated by the repositories; a
/// seller-supplied reference must at least parse as one.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    match uuid::Uuid::parse_str(id) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: format!("'{id}' is not a UUID"),
        }),
    }
}
