//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Tenant-scoped list queries (`query`)
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod query;
pub mod repositories;

pub use repositories::{
    AssetRepository, MaterialError, MaterialRepository, ProductError, ProductFilter,
    ProductRepository, QuoteFilter, QuoteRepository, QuoteRepositoryError, VatRateError,
    VatRateRepository,
};

use fieldline_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Connects with the pool limits from the application config.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
