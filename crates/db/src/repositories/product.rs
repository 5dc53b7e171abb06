//! Product repository.

use chrono::Utc;
use fieldline_core::catalog::{CatalogError, NewProduct, Product, ProductPatch, ProductType};
use fieldline_shared::AppError;
use fieldline_shared::types::{ListParams, OrganizationId, Page, ProductId, SortOrder, VatRateId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{is_unique_violation, to_utc};
use crate::entities::{products, vat_rates};
use crate::query::{
    Filter, FilterValue, ListSpec, QueryBuilder, QueryError, ensure_tenant, fetch_page,
};

/// List definition for products.
pub const PRODUCT_LIST: ListSpec = ListSpec {
    table: "products",
    search_columns: &["name", "description", "sku"],
    sort_fields: &[
        ("name", "name"),
        ("unitPriceCents", "unit_price_cents"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
    default_sort: "name",
    default_order: SortOrder::Asc,
    tie_break: "id",
};

/// Error types for product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Product not found in the organization.
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    /// VAT rate not found in the organization.
    #[error("VAT rate not found: {0}")]
    VatRateNotFound(Uuid),

    /// SKU already used in the organization.
    #[error("SKU '{0}' already exists")]
    DuplicateSku(String),

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

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) | ProductError::VatRateNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            ProductError::DuplicateSku(_) => Self::Conflict(err.to_string()),
            ProductError::Invalid(e) => e.into(),
            ProductError::Query(e) => e.into(),
            ProductError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Exact-match filters for listing products.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Only products with this VAT rate.
    #[serde(default)]
    pub vat_rate_id: Option<Uuid>,
    /// `product` or `service`.
    #[serde(default)]
    pub product_type: Option<String>,
    /// Active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists products.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        params: &ListParams,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, ProductError> {
        let product_type = filter
            .product_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ProductType::parse_input)
            .transpose()?;

        let query = QueryBuilder::new(&PRODUCT_LIST, organization_id, params)
            .filter(Filter::Exact {
                column: "vat_rate_id",
                value: FilterValue::Uuid(filter.vat_rate_id),
            })
            .filter(Filter::Exact {
                column: "product_type",
                value: FilterValue::Text(product_type.map(|t| t.as_str().to_string())),
            })
            .filter(Filter::Exact {
                column: "is_active",
                value: FilterValue::Bool(filter.is_active),
            })
            .build()?;

        let page = fetch_page::<products::Entity, _>(&self.db, query).await?;
        ensure_tenant(organization_id, &page.items, |m| m.organization_id)?;
        Ok(page.try_map(to_domain)?)
    }

    /// Gets a product by ID.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> Result<Product, ProductError> {
        Ok(to_domain(self.find_model(organization_id, id).await?)?)
    }

    /// Creates a product.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        input: NewProduct,
    ) -> Result<Product, ProductError> {
        let input = input.validate()?;
        self.ensure_vat_rate(organization_id, input.vat_rate_id)
            .await?;

        let now = Utc::now().into();
        let model = products::ActiveModel {
            id: Set(ProductId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            vat_rate_id: Set(input.vat_rate_id.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            sku: Set(input.sku.clone()),
            unit: Set(input.unit),
            unit_price_cents: Set(input.unit_price_cents),
            product_type: Set(input.product_type.as_str().to_string()),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| duplicate_or(e, input.sku.as_deref()))?;

        tracing::info!(org_id = %organization_id, product_id = %model.id, "created product");
        Ok(to_domain(model)?)
    }

    /// Applies a patch to a product.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ProductError> {
        let model = self.find_model(organization_id, id).await?;
        let updated = patch.apply(to_domain(model.clone())?)?;

        if updated.vat_rate_id.into_inner() != model.vat_rate_id {
            self.ensure_vat_rate(organization_id, updated.vat_rate_id)
                .await?;
        }

        let mut active: products::ActiveModel = model.into();
        active.vat_rate_id = Set(updated.vat_rate_id.into_inner());
        active.name = Set(updated.name);
        active.description = Set(updated.description);
        active.sku = Set(updated.sku.clone());
        active.unit = Set(updated.unit);
        active.unit_price_cents = Set(updated.unit_price_cents);
        active.product_type = Set(updated.product_type.as_str().to_string());
        active.is_active = Set(updated.is_active);
        active.updated_at = Set(updated.updated_at.into());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| duplicate_or(e, updated.sku.as_deref()))?;
        Ok(to_domain(model)?)
    }

    /// Deletes a product. Its asset rows and material links go with it.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> Result<(), ProductError> {
        let result = products::Entity::delete_many()
            .filter(products::Column::Id.eq(id.into_inner()))
            .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ProductError::NotFound(id.into_inner()));
        }
        tracing::info!(org_id = %organization_id, product_id = %id, "deleted product");
        Ok(())
    }

    async fn find_model(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> Result<products::Model, ProductError> {
        products::Entity::find_by_id(id.into_inner())
            .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id.into_inner()))
    }

    async fn ensure_vat_rate(
        &self,
        organization_id: OrganizationId,
        vat_rate_id: VatRateId,
    ) -> Result<(), ProductError> {
        let count = vat_rates::Entity::find_by_id(vat_rate_id.into_inner())
            .filter(vat_rates::Column::OrganizationId.eq(organization_id.into_inner()))
            .count(&self.db)
            .await?;
        if count == 0 {
            return Err(ProductError::VatRateNotFound(vat_rate_id.into_inner()));
        }
        Ok(())
    }
}

fn duplicate_or(err: DbErr, sku: Option<&str>) -> ProductError {
    match sku {
        Some(sku) if is_unique_violation(&err) => ProductError::DuplicateSku(sku.to_string()),
        _ => err.into(),
    }
}

pub(crate) fn to_domain(model: products::Model) -> Result<Product, DbErr> {
    let product_type = ProductType::parse(&model.product_type).ok_or_else(|| {
        DbErr::Custom(format!("unknown product type '{}'", model.product_type))
    })?;

    Ok(Product {
        id: ProductId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        vat_rate_id: VatRateId::from_uuid(model.vat_rate_id),
        name: model.name,
        description: model.description,
        sku: model.sku,
        unit: model.unit,
        unit_price_cents: model.unit_price_cents,
        product_type,
        is_active: model.is_active,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}
