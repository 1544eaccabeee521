//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and their callers                       │
//! │                                                                         │
//! │  Seller dashboard         Storefront pages          Checkout            │
//! │       │                        │                        │               │
//! │       ▼                        ▼                        ▼               │
//! │  CategoryRepository       StorefrontRepository     OrderRepository      │
//! │  ProductRepository        ├── listing()            ├── place_order()    │
//! │  DiscountRepository       └── product_detail()     ├── cancel()         │
//! │  StatsRepository                 │                 └── ...              │
//! │       │                          │                        │             │
//! │       │                          └──── resolve() ◄────────┘             │
//! │       ▼                                (shopfront-core)                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every query that touches catalog or order data filters on `tenant_id`.
//! Lookups that must also run inside the order transaction are free
//! functions generic over [`sqlx::SqliteExecutor`], so the same SQL serves
//! both `&SqlitePool` and `&mut *tx`.

pub mod category;
pub mod discount;
pub mod order;
pub mod product;
pub mod stats;
pub mod store;
pub mod storefront;

pub use category::CategoryRepository;
pub use discount::DiscountRepository;
pub use order::{OrderRepository, PlacedOrder};
pub use product::ProductRepository;
pub use stats::StatsRepository;
pub use store::StoreRepository;
pub use storefront::StorefrontRepository;

/// Generates a new primary key.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Test Support
// =============================================================================
