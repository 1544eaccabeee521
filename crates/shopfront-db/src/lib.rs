//! # shopfront-db: Database Layer for Shopfront
//!
//! SQLite persistence for stores, catalogs, discounts and orders, and the
//! transactional order path that prices every line with the shared resolver.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Data Flow                              │
//! │                                                                         │
//! │  Storefront page / checkout handler                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopfront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ StorefrontRepo  │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo       │   │ 001_initial  │  │   │
//! │  │   │ DbConfig      │    │ DiscountRepo .. │   │  _schema.sql │  │   │
//! │  │   └───────────────┘    └────────┬────────┘   └──────────────┘  │   │
//! │  │                                 │                               │   │
//! │  └─────────────────────────────────┼───────────────────────────────┘   │
//! │                                    ▼                                    │
//! │                     shopfront-core::resolve (pure)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `DbConfig` builder and environment loading
//! - [`pool`] - Connection pool creation
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_core::today;
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let listing = db.storefront().listing("green-grocer", today()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig};
pub use error::{DbError, DbResult};
pub use pool::Database;

pub use repository::{
    CategoryRepository, DiscountRepository, OrderRepository, PlacedOrder, ProductRepository,
    StatsRepository, StoreRepository, StorefrontRepository,
};
