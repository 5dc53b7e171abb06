//! Material routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use fieldline_core::catalog::{Material, MaterialPatch, NewMaterial};
use fieldline_db::MaterialRepository;
use fieldline_shared::types::{ListParams, MaterialId, Page};

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
};

/// Creates the material routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/materials", get(list_materials).post(create_material))
        .route(
            "/materials/{id}",
            get(get_material)
                .patch(update_material)
                .delete(delete_material),
        )
}

fn repo(state: &AppState) -> MaterialRepository {
    MaterialRepository::new((*state.db).clone())
}

async fn list_materials(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<Material>>> {
    Ok(Json(repo(&state).list(auth.organization_id(), &params).await?))
}

async fn get_material(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<MaterialId>,
) -> ApiResult<Json<Material>> {
    Ok(Json(repo(&state).get(auth.organization_id(), id).await?))
}

async fn create_material(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewMaterial>,
) -> ApiResult<(StatusCode, Json<Material>)> {
    let material = repo(&state).create(auth.organization_id(), input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn update_material(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<MaterialId>,
    ApiJson(patch): ApiJson<MaterialPatch>,
) -> ApiResult<Json<Material>> {
    let material = repo(&state)
        .update(auth.organization_id(), id, patch)
        .await?;
    Ok(Json(material))
}

/// Links to products are removed with the material.
async fn delete_material(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<MaterialId>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(auth.organization_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
