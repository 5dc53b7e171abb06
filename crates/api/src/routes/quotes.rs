//! Quote routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use fieldline_core::quote::{NewQuote, Quote, QuoteWithLines};
use fieldline_db::{QuoteFilter, QuoteRepository};
use fieldline_shared::types::{ListParams, Page, QuoteId};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
};

/// Creates the quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/{id}", get(get_quote).delete(delete_quote))
        .route("/quotes/{id}/status", patch(update_quote_status))
}

/// Body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    /// Target status: `draft`, `sent`, `accepted` or `rejected`.
    pub status: String,
}

fn repo(state: &AppState) -> QuoteRepository {
    QuoteRepository::new((*state.db).clone())
}

/// GET `/quotes`
///
/// Headers only. Filters: `status`, `createdFrom`, `createdTo` (inclusive
/// UTC days).
async fn list_quotes(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<QuoteFilter>,
) -> ApiResult<Json<Page<Quote>>> {
    let page = repo(&state)
        .list(auth.organization_id(), &params, &filter)
        .await?;
    Ok(Json(page))
}

/// GET `/quotes/{id}`
async fn get_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<QuoteId>,
) -> ApiResult<Json<QuoteWithLines>> {
    Ok(Json(repo(&state).get(auth.organization_id(), id).await?))
}

/// POST `/quotes`
///
/// Lines referencing a product inherit its name, price and VAT rate unless
/// the request overrides them. Totals are computed server-side.
async fn create_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewQuote>,
) -> ApiResult<(StatusCode, Json<QuoteWithLines>)> {
    let quote = repo(&state)
        .create(auth.organization_id(), auth.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// PATCH `/quotes/{id}/status`
async fn update_quote_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<QuoteId>,
    ApiJson(body): ApiJson<StatusChangeRequest>,
) -> ApiResult<Json<Quote>> {
    let quote = repo(&state)
        .update_status(auth.organization_id(), id, &body.status)
        .await?;
    Ok(Json(quote))
}

/// DELETE `/quotes/{id}`
///
/// Only drafts can be deleted.
async fn delete_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<QuoteId>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(auth.organization_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
