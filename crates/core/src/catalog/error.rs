//! Catalog validation errors.

use fieldline_shared::AppError;
use thiserror::Error;

/// Catalog input errors. All of them are the caller's to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A required text field is blank.
    #[error("{field} is required")]
    Required {
        /// Field name as sent by the client.
        field: &'static str,
    },

    /// A text field exceeds its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name as sent by the client.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// VAT rate outside `0..=10000` basis points.
    #[error("rateBps must be between 0 and 10000, got {0}")]
    RateOutOfRange(i32),

    /// Negative money amount.
    #[error("{field} cannot be negative, got {value}")]
    NegativePrice {
        /// Field name as sent by the client.
        field: &'static str,
        /// Offending value.
        value: i64,
    },

    /// Unknown product type.
    #[error("invalid product type '{0}', expected 'product' or 'service'")]
    InvalidProductType(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self::Validation(err.to_string())
    }
}
