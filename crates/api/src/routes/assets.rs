//! Product asset routes.
//!
//! Uploads are two-phase: the client asks for a presigned `PUT`, sends the
//! file straight to the object store, then confirms the key here. Every
//! route needs configured storage and answers 503 without it.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use fieldline_core::asset::{
    AddExternalUrlInput, AssetDownload, AssetService, AssetType, ConfirmUploadInput,
    ProductAsset, RequestUploadInput,
};
use fieldline_core::storage::PresignedGrant;
use fieldline_db::AssetRepository;
use fieldline_shared::AppError;
use fieldline_shared::types::{AssetId, ProductId};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath},
    middleware::AuthUser,
};

/// Creates the asset routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{id}/assets",
            get(list_assets).post(confirm_upload),
        )
        .route("/products/{id}/assets/upload-url", post(request_upload))
        .route("/products/{id}/assets/external", post(add_external_url))
        .route(
            "/products/{id}/assets/{asset_id}",
            get(get_asset).delete(delete_asset),
        )
        .route(
            "/products/{id}/assets/{asset_id}/download-url",
            get(download_url),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Body for requesting an upload grant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Asset classification; `other` when omitted.
    #[serde(default)]
    pub asset_type: AssetType,
    /// Original file name.
    pub file_name: String,
    /// MIME type the upload will carry.
    pub content_type: String,
    /// Declared size in bytes.
    pub size_bytes: i64,
}

/// Body for confirming an upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadRequest {
    /// Asset classification; `other` when omitted.
    #[serde(default)]
    pub asset_type: AssetType,
    /// Key from the upload grant.
    pub file_key: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
}

/// Body for linking an external URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalUrlRequest {
    /// Asset classification; `other` when omitted.
    #[serde(default)]
    pub asset_type: AssetType,
    /// Absolute http(s) URL.
    pub url: String,
    /// Display name.
    #[serde(default)]
    pub file_name: Option<String>,
}

fn service(state: &AppState) -> ApiResult<AssetService<AssetRepository>> {
    let storage = state.storage.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Object storage is not configured".to_string())
    })?;
    let repo = AssetRepository::new((*state.db).clone());
    Ok(AssetService::new(storage, Arc::new(repo)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/products/{id}/assets`
async fn list_assets(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> ApiResult<Json<Vec<ProductAsset>>> {
    let assets = service(&state)?
        .list(auth.organization_id(), product_id)
        .await?;
    Ok(Json(assets))
}

/// POST `/products/{id}/assets/upload-url`
async fn request_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UploadUrlRequest>,
) -> ApiResult<Json<PresignedGrant>> {
    let grant = service(&state)?
        .request_upload(RequestUploadInput {
            organization_id: auth.organization_id(),
            product_id,
            asset_type: body.asset_type,
            file_name: body.file_name,
            content_type: body.content_type,
            size_bytes: body.size_bytes,
        })
        .await?;
    Ok(Json(grant))
}

/// POST `/products/{id}/assets`
///
/// Records an upload made with a grant from `upload-url`.
async fn confirm_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ConfirmUploadRequest>,
) -> ApiResult<(StatusCode, Json<ProductAsset>)> {
    let asset = service(&state)?
        .confirm_upload(ConfirmUploadInput {
            organization_id: auth.organization_id(),
            product_id,
            asset_type: body.asset_type,
            file_key: body.file_key,
            file_name: body.file_name,
            content_type: body.content_type,
            size_bytes: body.size_bytes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// POST `/products/{id}/assets/external`
async fn add_external_url(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ExternalUrlRequest>,
) -> ApiResult<(StatusCode, Json<ProductAsset>)> {
    let asset = service(&state)?
        .add_external_url(AddExternalUrlInput {
            organization_id: auth.organization_id(),
            product_id,
            asset_type: body.asset_type,
            url: body.url,
            file_name: body.file_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// GET `/products/{id}/assets/{asset_id}`
async fn get_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((product_id, asset_id)): ApiPath<(ProductId, AssetId)>,
) -> ApiResult<Json<ProductAsset>> {
    let asset = service(&state)?
        .get(auth.organization_id(), product_id, asset_id)
        .await?;
    Ok(Json(asset))
}

/// GET `/products/{id}/assets/{asset_id}/download-url`
async fn download_url(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((product_id, asset_id)): ApiPath<(ProductId, AssetId)>,
) -> ApiResult<Json<AssetDownload>> {
    let download = service(&state)?
        .download_url(auth.organization_id(), product_id, asset_id)
        .await?;
    Ok(Json(download))
}

/// DELETE `/products/{id}/assets/{asset_id}`
async fn delete_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((product_id, asset_id)): ApiPath<(ProductId, AssetId)>,
) -> ApiResult<StatusCode> {
    service(&state)?
        .delete(auth.organization_id(), product_id, asset_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
