//! Material repository and product-material links.

use std::collections::HashSet;

use chrono::Utc;
use fieldline_core::catalog::{CatalogError, Material, MaterialPatch, NewMaterial};
use fieldline_shared::AppError;
use fieldline_shared::types::{
    ListParams, MaterialId, OrganizationId, Page, ProductId, SortOrder,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::to_utc;
use crate::entities::{materials, product_materials, products};
use crate::query::{ListSpec, QueryBuilder, QueryError, ensure_tenant, fetch_page};

/// List definition for materials.
pub const MATERIAL_LIST: ListSpec = ListSpec {
    table: "materials",
    search_columns: &["name", "description"],
    sort_fields: &[
        ("name", "name"),
        ("unitPriceCents", "unit_price_cents"),
        ("createdAt", "created_at"),
    ],
    default_sort: "name",
    default_order: SortOrder::Asc,
    tie_break: "id",
};

/// Error types for material operations.
#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    /// Material not found in the organization.
    #[error("Material not found: {0}")]
    NotFound(Uuid),

    /// Product not found in the organization.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Material is not linked to the product.
    #[error("Material {material_id} is not linked to product {product_id}")]
    LinkNotFound {
        /// Product ID.
        product_id: Uuid,
        /// Material ID.
        material_id: Uuid,
    },

    /// Empty material list.
    #[error("at least one material ID is required")]
    NoMaterials,

    /// Field validation failed.
    #[error(transparent)]
    Invalid(#[from] CatalogError),

    /// Bad list parameters.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<MaterialError> for AppError {
    fn from(err: MaterialError) -> Self {
        match err {
            MaterialError::NotFound(_)
            | MaterialError::ProductNotFound(_)
            | MaterialError::LinkNotFound { .. } => Self::NotFound(err.to_string()),
            MaterialError::NoMaterials => Self::Validation(err.to_string()),
            MaterialError::Invalid(e) => e.into(),
            MaterialError::Query(e) => e.into(),
            MaterialError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Material repository.
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    db: DatabaseConnection,
}

impl MaterialRepository {
    /// Creates a new material repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists materials.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        params: &ListParams,
    ) -> Result<Page<Material>, MaterialError> {
        let query = QueryBuilder::new(&MATERIAL_LIST, organization_id, params).build()?;
        let page = fetch_page::<materials::Entity, _>(&self.db, query).await?;
        ensure_tenant(organization_id, &page.items, |m| m.organization_id)?;
        Ok(page.map(to_domain))
    }

    /// Gets a material by ID.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        id: MaterialId,
    ) -> Result<Material, MaterialError> {
        self.find_model(organization_id, id).await.map(to_domain)
    }

    /// Creates a material.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        input: NewMaterial,
    ) -> Result<Material, MaterialError> {
        let input = input.validate()?;
        let now = Utc::now().into();

        let model = materials::ActiveModel {
            id: Set(MaterialId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            unit: Set(input.unit),
            unit_price_cents: Set(input.unit_price_cents),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(org_id = %organization_id, material_id = %model.id, "created material");
        Ok(to_domain(model))
    }

    /// Applies a patch to a material.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        id: MaterialId,
        patch: MaterialPatch,
    ) -> Result<Material, MaterialError> {
        let model = self.find_model(organization_id, id).await?;
        let updated = patch.apply(to_domain(model.clone()))?;

        let mut active: materials::ActiveModel = model.into();
        active.name = Set(updated.name);
        active.description = Set(updated.description);
        active.unit = Set(updated.unit);
        active.unit_price_cents = Set(updated.unit_price_cents);
        active.updated_at = Set(updated.updated_at.into());

        Ok(to_domain(active.update(&self.db).await?))
    }

    /// Deletes a material and its product links.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        id: MaterialId,
    ) -> Result<(), MaterialError> {
        let result = materials::Entity::delete_many()
            .filter(materials::Column::Id.eq(id.into_inner()))
            .filter(materials::Column::OrganizationId.eq(organization_id.into_inner()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(MaterialError::NotFound(id.into_inner()));
        }
        tracing::info!(org_id = %organization_id, material_id = %id, "deleted material");
        Ok(())
    }

    /// Links materials to a product in one transaction.
    ///
    /// Either every requested material is linked or nothing changes.
    /// Duplicate IDs in the request collapse; links that already exist are
    /// kept. Returns the product's materials after the change.
    pub async fn add_product_materials(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        material_ids: &[MaterialId],
    ) -> Result<Vec<Material>, MaterialError> {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = material_ids
            .iter()
            .map(|id| id.into_inner())
            .filter(|id| seen.insert(*id))
            .collect();
        if ids.is_empty() {
            return Err(MaterialError::NoMaterials);
        }

        let txn = self.db.begin().await?;

        ensure_product(&txn, organization_id, product_id).await?;

        let found: HashSet<Uuid> = materials::Entity::find()
            .select_only()
            .column(materials::Column::Id)
            .filter(materials::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(materials::Column::Id.is_in(ids.clone()))
            .into_tuple::<Uuid>()
            .all(&txn)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(MaterialError::NotFound(*missing));
        }

        let now = Utc::now();
        for material_id in &ids {
            let link = product_materials::ActiveModel {
                product_id: Set(product_id.into_inner()),
                material_id: Set(*material_id),
                organization_id: Set(organization_id.into_inner()),
                created_at: Set(now.into()),
            };
            product_materials::Entity::insert(link)
                .on_conflict(
                    OnConflict::columns([
                        product_materials::Column::ProductId,
                        product_materials::Column::MaterialId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        let linked = linked_materials(&txn, organization_id, product_id).await?;
        txn.commit().await?;

        tracing::info!(
            org_id = %organization_id,
            product_id = %product_id,
            requested = ids.len(),
            "linked materials to product"
        );
        Ok(linked)
    }

    /// Removes one material from a product.
    pub async fn remove_product_material(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        material_id: MaterialId,
    ) -> Result<(), MaterialError> {
        ensure_product(&self.db, organization_id, product_id).await?;

        let result = product_materials::Entity::delete_many()
            .filter(product_materials::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(product_materials::Column::ProductId.eq(product_id.into_inner()))
            .filter(product_materials::Column::MaterialId.eq(material_id.into_inner()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(MaterialError::LinkNotFound {
                product_id: product_id.into_inner(),
                material_id: material_id.into_inner(),
            });
        }
        Ok(())
    }

    /// Lists a product's materials ordered by name.
    pub async fn list_product_materials(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> Result<Vec<Material>, MaterialError> {
        ensure_product(&self.db, organization_id, product_id).await?;
        linked_materials(&self.db, organization_id, product_id).await
    }

    async fn find_model(
        &self,
        organization_id: OrganizationId,
        id: MaterialId,
    ) -> Result<materials::Model, MaterialError> {
        materials::Entity::find_by_id(id.into_inner())
            .filter(materials::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(MaterialError::NotFound(id.into_inner()))
    }
}

async fn ensure_product<C: ConnectionTrait>(
    db: &C,
    organization_id: OrganizationId,
    product_id: ProductId,
) -> Result<(), MaterialError> {
    let count = products::Entity::find_by_id(product_id.into_inner())
        .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
        .count(db)
        .await?;
    if count == 0 {
        return Err(MaterialError::ProductNotFound(product_id.into_inner()));
    }
    Ok(())
}

async fn linked_materials<C: ConnectionTrait>(
    db: &C,
    organization_id: OrganizationId,
    product_id: ProductId,
) -> Result<Vec<Material>, MaterialError> {
    let models = materials::Entity::find()
        .join(JoinType::InnerJoin, materials::Relation::ProductMaterials.def())
        .filter(product_materials::Column::ProductId.eq(product_id.into_inner()))
        .filter(materials::Column::OrganizationId.eq(organization_id.into_inner()))
        .order_by_asc(materials::Column::Name)
        .order_by_asc(materials::Column::Id)
        .all(db)
        .await?;

    ensure_tenant(organization_id, &models, |m| m.organization_id)?;
    Ok(models.into_iter().map(to_domain).collect())
}

pub(crate) fn to_domain(model: materials::Model) -> Material {
    Material {
        id: MaterialId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        name: model.name,
        description: model.description,
        unit: model.unit,
        unit_price_cents: model.unit_price_cents,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    }
}
