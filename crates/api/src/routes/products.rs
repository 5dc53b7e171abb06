//! Product routes, including the product-material links.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use fieldline_core::catalog::{Material, NewProduct, Product, ProductPatch};
use fieldline_db::{MaterialRepository, ProductFilter, ProductRepository};
use fieldline_shared::types::{ListParams, MaterialId, Page, ProductId};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
};

/// Creates the product routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route(
            "/products/{id}/materials",
            get(list_product_materials).post(add_product_materials),
        )
        .route(
            "/products/{id}/materials/{material_id}",
            delete(remove_product_material),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Body for linking materials to a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMaterialsRequest {
    /// Materials to link. Duplicates are collapsed.
    pub material_ids: Vec<MaterialId>,
}

// ============================================================================
// Products
// ============================================================================

fn products(state: &AppState) -> ProductRepository {
    ProductRepository::new((*state.db).clone())
}

fn materials(state: &AppState) -> MaterialRepository {
    MaterialRepository::new((*state.db).clone())
}

/// GET `/products`
///
/// Accepts the common list parameters plus `vatRateId`, `productType` and
/// `isActive`.
async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Json<Page<Product>>> {
    let page = products(&state)
        .list(auth.organization_id(), &params, &filter)
        .await?;
    Ok(Json(page))
}

/// GET `/products/{id}`
async fn get_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<Json<Product>> {
    Ok(Json(products(&state).get(auth.organization_id(), id).await?))
}

/// POST `/products`
async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = products(&state)
        .create(auth.organization_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH `/products/{id}`
async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    let product = products(&state)
        .update(auth.organization_id(), id, patch)
        .await?;
    Ok(Json(product))
}

/// DELETE `/products/{id}`
///
/// Material links and asset records go with the product. Stored asset
/// objects are left in the bucket.
async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<StatusCode> {
    products(&state).delete(auth.organization_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Product materials
// ============================================================================

/// GET `/products/{id}/materials`
async fn list_product_materials(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<Json<Vec<Material>>> {
    let linked = materials(&state)
        .list_product_materials(auth.organization_id(), id)
        .await?;
    Ok(Json(linked))
}

/// POST `/products/{id}/materials`
///
/// All-or-nothing: one unknown material and nothing is linked. Returns every
/// material linked to the product afterwards.
async fn add_product_materials(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<LinkMaterialsRequest>,
) -> ApiResult<Json<Vec<Material>>> {
    let linked = materials(&state)
        .add_product_materials(auth.organization_id(), id, &body.material_ids)
        .await?;
    Ok(Json(linked))
}

/// DELETE `/products/{id}/materials/{material_id}`
async fn remove_product_material(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((id, material_id)): ApiPath<(ProductId, MaterialId)>,
) -> ApiResult<StatusCode> {
    materials(&state)
        .remove_product_material(auth.organization_id(), id, material_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
