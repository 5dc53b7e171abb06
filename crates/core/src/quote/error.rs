//! Quote errors.

use fieldline_shared::AppError;
use thiserror::Error;

use super::types::QuoteStatus;
use crate::catalog::CatalogError;

/// Quote operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Field-level input error.
    #[error(transparent)]
    Invalid(#[from] CatalogError),

    /// A quote needs at least one line.
    #[error("a quote needs at least one line")]
    NoLines,

    /// Too many lines in one request.
    #[error("a quote can have at most {0} lines")]
    TooManyLines(usize),

    /// Quantity must be positive.
    #[error("line {position}: quantity must be positive, got {quantity}")]
    InvalidQuantity {
        /// Zero-based line position.
        position: i32,
        /// Offending quantity.
        quantity: i64,
    },

    /// Free-text line without a description.
    #[error("line {0}: description is required when no product is given")]
    MissingDescription(i32),

    /// Free-text line without a price.
    #[error("line {0}: unitPriceCents is required when no product is given")]
    MissingPrice(i32),

    /// Free-text line without a VAT rate.
    #[error("line {0}: vatRateBps is required when no product is given")]
    MissingVatRate(i32),

    /// Product referenced by a line is inactive.
    #[error("line {0}: product is inactive")]
    InactiveProduct(i32),

    /// Amounts do not fit in 64-bit cents.
    #[error("quote amounts overflow")]
    Overflow,

    /// Unknown status string.
    #[error("invalid quote status '{0}'")]
    InvalidStatus(String),

    /// Status change not allowed by the workflow.
    #[error("cannot move quote from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        /// Current status.
        from: QuoteStatus,
        /// Requested status.
        to: QuoteStatus,
    },

    /// Only drafts can be deleted.
    #[error("only draft quotes can be deleted, quote is {}", .0.as_str())]
    NotDraft(QuoteStatus),
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidTransition { .. } => Self::BusinessRule(err.to_string()),
            QuoteError::NotDraft(_) => Self::Conflict(err.to_string()),
            QuoteError::Overflow
            | QuoteError::Invalid(_)
            | QuoteError::NoLines
            | QuoteError::TooManyLines(_)
            | QuoteError::InvalidQuantity { .. }
            | QuoteError::MissingDescription(_)
            | QuoteError::MissingPrice(_)
            | QuoteError::MissingVatRate(_)
            | QuoteError::InactiveProduct(_)
            | QuoteError::InvalidStatus(_) => Self::Validation(err.to_string()),
        }
    }
}
