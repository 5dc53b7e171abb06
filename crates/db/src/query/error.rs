//! List query errors.

use fieldline_shared::AppError;

/// Errors raised while turning list parameters into SQL.
///
/// All of them are caused by the caller's input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// `sortBy` is not in the resource's allow-list.
    #[error("Invalid sort field '{field}'; allowed: {allowed}")]
    InvalidSortField {
        /// Requested field.
        field: String,
        /// Comma-separated allowed fields.
        allowed: String,
    },

    /// `sortOrder` is neither `asc` nor `desc`.
    #[error("Invalid sort order '{0}'; expected 'asc' or 'desc'")]
    InvalidSortOrder(String),

    /// A date range whose start is after its end.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Range start.
        from: chrono::NaiveDate,
        /// Range end.
        to: chrono::NaiveDate,
    },
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        Self::Validation(err.to_string())
    }
}
