//! Shared types, errors, and configuration for Fieldline.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for tenant-scoped entity references
//! - Pagination and list-request types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;


pub use auth::Claims;
pub use config::{AppConfig, StorageProviderKind, StorageSettings};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
