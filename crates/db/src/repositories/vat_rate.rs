//! VAT rate repository.

use chrono::Utc;
use fieldline_core::catalog::{CatalogError, NewVatRate, VatRate, VatRatePatch};
use fieldline_shared::AppError;
use fieldline_shared::types::{ListParams, OrganizationId, Page, SortOrder, VatRateId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::{is_foreign_key_violation, is_unique_violation, to_utc};
use crate::entities::{products, vat_rates};
use crate::query::{ListSpec, QueryBuilder, QueryError, ensure_tenant, fetch_page};

/// List definition for VAT rates. Names are unique per tenant, so they
/// break ties.
pub const VAT_RATE_LIST: ListSpec = ListSpec {
    table: "vat_rates",
    search_columns: &["name"],
    sort_fields: &[
        ("name", "name"),
        ("rateBps", "rate_bps"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
    default_sort: "name",
    default_order: SortOrder::Asc,
    tie_break: "name",
};

/// Error types for VAT rate operations.
#[derive(Debug, thiserror::Error)]
pub enum VatRateError {
    /// VAT rate not found in the organization.
    #[error("VAT rate not found: {0}")]
    NotFound(Uuid),

    /// Name already used in the organization.
    #[error("VAT rate '{0}' already exists")]
    DuplicateName(String),

    /// Products still reference the rate.
    #[error("VAT rate is used by {0} products")]
    InUse(u64),

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

impl From<VatRateError> for AppError {
    fn from(err: VatRateError) -> Self {
        match err {
            VatRateError::NotFound(_) => Self::NotFound(err.to_string()),
            VatRateError::DuplicateName(_) | VatRateError::InUse(_) => {
                Self::Conflict(err.to_string())
            }
            VatRateError::Invalid(e) => e.into(),
            VatRateError::Query(e) => e.into(),
            VatRateError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// VAT rate repository.
#[derive(Debug, Clone)]
pub struct VatRateRepository {
    db: DatabaseConnection,
}

impl VatRateRepository {
    /// Creates a new VAT rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists VAT rates.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        params: &ListParams,
    ) -> Result<Page<VatRate>, VatRateError> {
        let query = QueryBuilder::new(&VAT_RATE_LIST, organization_id, params).build()?;
        let page = fetch_page::<vat_rates::Entity, _>(&self.db, query).await?;
        ensure_tenant(organization_id, &page.items, |m| m.organization_id)?;
        Ok(page.map(to_domain))
    }

    /// Gets a VAT rate by ID.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        id: VatRateId,
    ) -> Result<VatRate, VatRateError> {
        self.find_model(organization_id, id).await.map(to_domain)
    }

    /// Creates a VAT rate.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        input: NewVatRate,
    ) -> Result<VatRate, VatRateError> {
        let input = input.validate()?;
        self.ensure_name_free(organization_id, &input.name, None)
            .await?;

        let now = Utc::now().into();
        let model = vat_rates::ActiveModel {
            id: Set(VatRateId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(input.name.clone()),
            rate_bps: Set(input.rate_bps),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| duplicate_or(e, &input.name))?;

        tracing::info!(org_id = %organization_id, vat_rate_id = %model.id, "created VAT rate");
        Ok(to_domain(model))
    }

    /// Applies a patch to a VAT rate.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        id: VatRateId,
        patch: VatRatePatch,
    ) -> Result<VatRate, VatRateError> {
        let model = self.find_model(organization_id, id).await?;
        let updated = patch.apply(to_domain(model.clone()))?;

        if updated.name != model.name {
            self.ensure_name_free(organization_id, &updated.name, Some(id))
                .await?;
        }

        let mut active: vat_rates::ActiveModel = model.into();
        active.name = Set(updated.name.clone());
        active.rate_bps = Set(updated.rate_bps);
        active.updated_at = Set(updated.updated_at.into());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| duplicate_or(e, &updated.name))?;
        Ok(to_domain(model))
    }

    /// Deletes a VAT rate that no product uses.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        id: VatRateId,
    ) -> Result<(), VatRateError> {
        self.find_model(organization_id, id).await?;

        let used = products::Entity::find()
            .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(products::Column::VatRateId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if used > 0 {
            return Err(VatRateError::InUse(used));
        }

        let result = vat_rates::Entity::delete_many()
            .filter(vat_rates::Column::Id.eq(id.into_inner()))
            .filter(vat_rates::Column::OrganizationId.eq(organization_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| {
                // A product created between the count and the delete.
                if is_foreign_key_violation(&e) {
                    VatRateError::InUse(1)
                } else {
                    e.into()
                }
            })?;

        if result.rows_affected == 0 {
            return Err(VatRateError::NotFound(id.into_inner()));
        }
        tracing::info!(org_id = %organization_id, vat_rate_id = %id, "deleted VAT rate");
        Ok(())
    }

    async fn find_model(
        &self,
        organization_id: OrganizationId,
        id: VatRateId,
    ) -> Result<vat_rates::Model, VatRateError> {
        vat_rates::Entity::find_by_id(id.into_inner())
            .filter(vat_rates::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(VatRateError::NotFound(id.into_inner()))
    }

    async fn ensure_name_free(
        &self,
        organization_id: OrganizationId,
        name: &str,
        except: Option<VatRateId>,
    ) -> Result<(), VatRateError> {
        let mut query = vat_rates::Entity::find()
            .filter(vat_rates::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(vat_rates::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(vat_rates::Column::Id.ne(id.into_inner()));
        }

        if query.count(&self.db).await? > 0 {
            return Err(VatRateError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

fn duplicate_or(err: DbErr, name: &str) -> VatRateError {
    if is_unique_violation(&err) {
        VatRateError::DuplicateName(name.to_string())
    } else {
        err.into()
    }
}

pub(crate) fn to_domain(model: vat_rates::Model) -> VatRate {
    VatRate {
        id: VatRateId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        name: model.name,
        rate_bps: model.rate_bps,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    }
}
