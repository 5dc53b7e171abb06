//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every method takes the tenant as its first argument and every statement
//! filters on it.

pub mod asset;
pub mod material;
pub mod product;
pub mod quote;
pub mod vat_rate;

pub use asset::AssetRepository;
pub use material::{MaterialError, MaterialRepository};
pub use product::{ProductError, ProductFilter, ProductRepository};
pub use quote::{QuoteFilter, QuoteRepository, QuoteRepositoryError};
pub use vat_rate::{VatRateError, VatRateRepository};

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DbErr, SqlErr};

pub(crate) fn to_utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}
