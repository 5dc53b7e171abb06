//! VAT rate routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use fieldline_core::catalog::{NewVatRate, VatRate, VatRatePatch};
use fieldline_db::VatRateRepository;
use fieldline_shared::types::{ListParams, Page, VatRateId};

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
};

/// Creates the VAT rate routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vat-rates", get(list_vat_rates).post(create_vat_rate))
        .route(
            "/vat-rates/{id}",
            get(get_vat_rate)
                .patch(update_vat_rate)
                .delete(delete_vat_rate),
        )
}

fn repo(state: &AppState) -> VatRateRepository {
    VatRateRepository::new((*state.db).clone())
}

/// GET `/vat-rates`
async fn list_vat_rates(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<VatRate>>> {
    let page = repo(&state).list(auth.organization_id(), &params).await?;
    Ok(Json(page))
}

/// GET `/vat-rates/{id}`
async fn get_vat_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<VatRateId>,
) -> ApiResult<Json<VatRate>> {
    Ok(Json(repo(&state).get(auth.organization_id(), id).await?))
}

/// POST `/vat-rates`
async fn create_vat_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewVatRate>,
) -> ApiResult<(StatusCode, Json<VatRate>)> {
    let rate = repo(&state).create(auth.organization_id(), input).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

/// PATCH `/vat-rates/{id}`
async fn update_vat_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<VatRateId>,
    ApiJson(patch): ApiJson<VatRatePatch>,
) -> ApiResult<Json<VatRate>> {
    let rate = repo(&state)
        .update(auth.organization_id(), id, patch)
        .await?;
    Ok(Json(rate))
}

/// DELETE `/vat-rates/{id}`
///
/// Answers 409 while products still use the rate.
async fn delete_vat_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<VatRateId>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(auth.organization_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
