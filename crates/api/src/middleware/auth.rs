//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use fieldline_shared::types::{OrganizationId, UserId};
use fieldline_shared::{AppError, Claims, JwtError};

use crate::{AppState, error::ApiError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates JWT tokens.
///
/// On success the token's claims are stored in the request extensions,
/// where [`AuthUser`] picks them up. The tenant of every downstream
/// operation is the claims' `org`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header with Bearer token is required".into())
        })?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        match e {
            JwtError::Expired => AppError::Unauthorized("Token has expired".into()),
            _ => AppError::Unauthorized("Invalid or malformed token".into()),
        }
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller.
///
/// Only available behind [`auth_middleware`]; elsewhere it rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The caller's user ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.user_id())
    }

    /// The tenant the caller acts for.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        OrganizationId::from_uuid(self.0.organization_id())
    }

    /// The caller's role in the organization.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("bearer abc", Some("abc"))]
    #[case("Bearer ", None)]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("abc.def.ghi", None)]
    fn test_extract_bearer_token(#[case] header: &str, #[case] want: Option<&str>) {
        assert_eq!(extract_bearer_token(header), want);
    }
}
