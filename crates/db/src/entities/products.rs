//! `SeaORM` Entity for products table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub vat_rate_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub unit: String,
    pub unit_price_cents: i64,
    /// `product` or `service`.
    pub product_type: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::vat_rates::Entity",
        from = "Column::VatRateId",
        to = "super::vat_rates::Column::Id"
    )]
    VatRates,
    #[sea_orm(has_many = "super::product_assets::Entity")]
    ProductAssets,
    #[sea_orm(has_many = "super::product_materials::Entity")]
    ProductMaterials,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::vat_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VatRates.def()
    }
}

impl Related<super::product_assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductAssets.def()
    }
}

impl Related<super::materials::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_materials::Relation::Materials.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_materials::Relation::Products.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
