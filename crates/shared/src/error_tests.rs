//! Tests for `AppError` status and code mapping.

use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
#[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
#[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
#[case(AppError::BusinessRule(String::new()), 422, "BUSINESS_RULE_VIOLATION")]
#[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
#[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
#[case(AppError::ExternalService(String::new()), 500, "EXTERNAL_SERVICE_ERROR")]
#[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
#[case(AppError::ServiceUnavailable(String::new()), 503, "SERVICE_UNAVAILABLE")]
fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Validation("msg".into()).to_string(),
        "Validation error: msg"
    );
    assert_eq!(
        AppError::Conflict("msg".into()).to_string(),
        "Conflict: msg"
    );
    assert_eq!(
        AppError::ServiceUnavailable("msg".into()).to_string(),
        "Service unavailable: msg"
    );
}

#[test]
fn test_public_message_hides_database_detail() {
    let err = AppError::Database("relation \"products\" does not exist".into());
    assert!(err.is_server_error());
    assert!(!err.public_message().contains("products"));
}

#[test]
fn test_public_message_keeps_client_errors() {
    let err = AppError::Validation("sortBy 'price' is not allowed".into());
    assert!(!err.is_server_error());
    assert_eq!(err.public_message(), "sortBy 'price' is not allowed");
}
