//! # Database Errors
//!
//! `DbError` covers storage failures and carries `CoreError` through
//! unchanged, so a caller of `place_order` can match on
//! `DbError::Core(CoreError::ProductNotFound(_))` directly.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ─────────────► NotFound / UniqueViolation /                │
//! │                             ForeignKeyViolation / QueryFailed / ...     │
//! │  MigrateError ────────────► MigrationFailed                             │
//! │  CoreError ───────────────► Core(..)            (resolver, order lines) │
//! │  ValidationError ─────────► Core(Validation(..)) (seller input)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopfront_core::{CoreError, ValidationError};
use thiserror::Error;

/// Errors returned by repositories and the order transaction.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id or slug inside the requesting tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A slug (product or store) is already taken.
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    /// A row points at a store, category or product that doesn't exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Could not connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQL error, including a CHECK constraint rejecting a row.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Commit of the order transaction failed; nothing was written.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("No database connection available")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),

    /// Pricing or order rule violation raised by shopfront-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Maps a SQLite `UNIQUE constraint failed: <table>.<column>` message to
/// the field a seller would recognise.
fn unique_field(message: &str) -> &str {
    let column = message
        .split_once("UNIQUE constraint failed: ")
        .map(|(_, rest)| rest.trim())
        .unwrap_or("unknown");

    match column {
        "products.slug" => "product slug",
        "stores.store_slug" => "store slug",
        other => other,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if message.contains("UNIQUE constraint failed") {
                    // SQLite doesn't report the offending value
                    DbError::duplicate(unique_field(message), "unknown")
                } else if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    }
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
