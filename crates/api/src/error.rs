//! Error to HTTP response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fieldline_core::asset::AssetError;
use fieldline_core::catalog::CatalogError;
use fieldline_core::quote::QuoteError;
use fieldline_core::storage::StorageError;
use fieldline_db::query::QueryError;
use fieldline_db::{MaterialError, ProductError, QuoteRepositoryError, VatRateError};
use fieldline_shared::AppError;
use serde::Serialize;

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error. Renders as `{"error": CODE, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

macro_rules! from_app_error {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    Self(err.into())
                }
            }
        )+
    };
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

from_app_error!(
    CatalogError,
    QuoteError,
    StorageError,
    AssetError,
    QueryError,
    VatRateError,
    ProductError,
    MaterialError,
    QuoteRepositoryError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_server_error() {
            tracing::error!(code = self.0.error_code(), error = %self.0, "request failed");
        } else {
            tracing::debug!(code = self.0.error_code(), error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: self.0.error_code(),
            message: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(AppError::NotFound("product 1".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case(AppError::Conflict("taken".into()), StatusCode::CONFLICT, "CONFLICT")]
    #[case(AppError::BusinessRule("no".into()), StatusCode::UNPROCESSABLE_ENTITY, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::ServiceUnavailable("storage".into()), StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")]
    #[tokio::test]
    async fn test_status_and_code(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let (got, body) = render(ApiError(err)).await;
        assert_eq!(got, status);
        assert_eq!(body["error"], code);
    }

    #[tokio::test]
    async fn test_database_detail_is_hidden() {
        let (status, body) = render(ApiError(AppError::Database(
            "relation \"products\" does not exist".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_domain_errors_convert() {
        let (status, body) = render(QueryError::InvalidSortOrder("sideways".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, body) = render(CatalogError::RateOutOfRange(10_001).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("10001"));

        let (status, body) =
            render(QuoteRepositoryError::StatusChanged(uuid::Uuid::nil()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CONFLICT");

        let (status, _) = render(AssetError::DuplicateKey("a/b.png".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
