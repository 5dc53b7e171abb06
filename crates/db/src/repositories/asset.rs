//! Product asset repository for database operations.
//!
//! Implements the core asset repository trait using SeaORM.

use fieldline_core::asset::{
    AssetError, AssetRepository as AssetRepoTrait, AssetType, NewAsset, ProductAsset,
};
use fieldline_shared::types::{AssetId, OrganizationId, ProductId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::{is_unique_violation, to_utc};
use crate::entities::{product_assets, products};

/// Asset repository implementation.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    db: DatabaseConnection,
}

impl AssetRepository {
    /// Create a new asset repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AssetRepoTrait for AssetRepository {
    async fn create(&self, input: NewAsset) -> Result<ProductAsset, AssetError> {
        let file_key = input.file_key.clone();
        let active_model = product_assets::ActiveModel {
            id: Set(input.id.into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            product_id: Set(input.product_id.into_inner()),
            asset_type: Set(input.asset_type.as_str().to_string()),
            file_key: Set(input.file_key),
            external_url: Set(input.external_url),
            file_name: Set(input.file_name),
            content_type: Set(input.content_type),
            size_bytes: Set(input.size_bytes),
            created_at: Set(chrono::Utc::now().into()),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AssetError::DuplicateKey(file_key.unwrap_or_default())
            } else {
                AssetError::repository(e.to_string())
            }
        })?;

        to_domain(model)
    }

    async fn find_by_id(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        id: AssetId,
    ) -> Result<Option<ProductAsset>, AssetError> {
        let model = product_assets::Entity::find_by_id(id.into_inner())
            .filter(product_assets::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(product_assets::Column::ProductId.eq(product_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn list_by_product(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> Result<Vec<ProductAsset>, AssetError> {
        let models = product_assets::Entity::find()
            .filter(product_assets::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(product_assets::Column::ProductId.eq(product_id.into_inner()))
            .order_by_desc(product_assets::Column::CreatedAt)
            .order_by_asc(product_assets::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        if models
            .iter()
            .any(|m| m.organization_id != organization_id.into_inner())
        {
            return Err(AssetError::repository(
                "asset list returned a row from another organization",
            ));
        }
        models.into_iter().map(to_domain).collect()
    }

    async fn delete(&self, organization_id: OrganizationId, id: AssetId) -> Result<bool, AssetError> {
        let result = product_assets::Entity::delete_many()
            .filter(product_assets::Column::Id.eq(id.into_inner()))
            .filter(product_assets::Column::OrganizationId.eq(organization_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn product_exists(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> Result<bool, AssetError> {
        let count: u64 = products::Entity::find_by_id(product_id.into_inner())
            .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        Ok(count > 0)
    }
}

/// Convert database model to domain model.
fn to_domain(model: product_assets::Model) -> Result<ProductAsset, AssetError> {
    let asset_type = AssetType::parse(&model.asset_type).ok_or_else(|| {
        AssetError::repository(format!("unknown asset type '{}'", model.asset_type))
    })?;

    Ok(ProductAsset {
        id: AssetId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        product_id: ProductId::from_uuid(model.product_id),
        asset_type,
        file_key: model.file_key,
        external_url: model.external_url,
        file_name: model.file_name,
        content_type: model.content_type,
        size_bytes: model.size_bytes,
        created_at: to_utc(model.created_at),
    })
}
