//! Catalog entities and creation inputs.

use chrono::{DateTime, Utc};
use fieldline_shared::types::{MaterialId, OrganizationId, ProductId, VatRateId};
use serde::{Deserialize, Serialize};

use super::error::CatalogError;
use super::validation::{normalize_optional, normalize_required, validate_price, validate_rate_bps};

pub(crate) const NAME_MAX: usize = 200;
pub(crate) const DESCRIPTION_MAX: usize = 2000;
pub(crate) const SKU_MAX: usize = 64;
pub(crate) const UNIT_MAX: usize = 32;

/// Whether a catalog item is a physical product or billable labor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Physical good.
    #[default]
    Product,
    /// Labor or service.
    Service,
}

impl ProductType {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(Self::Product),
            "service" => Some(Self::Service),
            _ => None,
        }
    }

    /// Parse, reporting unknown values as a catalog error.
    pub fn parse_input(s: &str) -> Result<Self, CatalogError> {
        Self::parse(s).ok_or_else(|| CatalogError::InvalidProductType(s.to_string()))
    }
}

/// A VAT rate, in basis points (2100 = 21%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatRate {
    /// Identifier.
    pub id: VatRateId,
    /// Owning tenant.
    pub organization_id: OrganizationId,
    /// Display name, unique per tenant.
    pub name: String,
    /// Rate in basis points.
    pub rate_bps: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a VAT rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVatRate {
    /// Display name.
    pub name: String,
    /// Rate in basis points.
    pub rate_bps: i32,
}

impl NewVatRate {
    /// Normalize and validate.
    pub fn validate(self) -> Result<Self, CatalogError> {
        Ok(Self {
            name: normalize_required("name", &self.name, NAME_MAX)?,
            rate_bps: validate_rate_bps(self.rate_bps)?,
        })
    }
}

/// A catalog product or service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Identifier.
    pub id: ProductId,
    /// Owning tenant.
    pub organization_id: OrganizationId,
    /// VAT rate applied when quoting this product.
    pub vat_rate_id: VatRateId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Unit of measure (`pcs`, `h`, `m`).
    pub unit: String,
    /// Net price per unit in cents.
    pub unit_price_cents: i64,
    /// Product or service.
    pub product_type: ProductType,
    /// Inactive products are hidden from new quotes.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

fn default_active() -> bool {
    true
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// VAT rate; must belong to the same tenant.
    pub vat_rate_id: VatRateId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Net price per unit in cents.
    pub unit_price_cents: i64,
    /// Product or service.
    #[serde(default)]
    pub product_type: ProductType,
    /// Whether the product can be quoted.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewProduct {
    /// Normalize and validate.
    pub fn validate(self) -> Result<Self, CatalogError> {
        Ok(Self {
            vat_rate_id: self.vat_rate_id,
            name: normalize_required("name", &self.name, NAME_MAX)?,
            description: normalize_optional(
                "description",
                self.description.as_deref(),
                DESCRIPTION_MAX,
            )?,
            sku: normalize_optional("sku", self.sku.as_deref(), SKU_MAX)?,
            unit: normalize_required("unit", &self.unit, UNIT_MAX)?,
            unit_price_cents: validate_price("unitPriceCents", self.unit_price_cents)?,
            product_type: self.product_type,
            is_active: self.is_active,
        })
    }
}

/// A material consumed when installing or servicing products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Identifier.
    pub id: MaterialId,
    /// Owning tenant.
    pub organization_id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Unit of measure.
    pub unit: String,
    /// Cost per unit in cents.
    pub unit_price_cents: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a material.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Cost per unit in cents.
    pub unit_price_cents: i64,
}

impl NewMaterial {
    /// Normalize and validate.
    pub fn validate(self) -> Result<Self, CatalogError> {
        Ok(Self {
            name: normalize_required("name", &self.name, NAME_MAX)?,
            description: normalize_optional(
                "description",
                self.description.as_deref(),
                DESCRIPTION_MAX,
            )?,
            unit: normalize_required("unit", &self.unit, UNIT_MAX)?,
            unit_price_cents: validate_price("unitPriceCents", self.unit_price_cents)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_roundtrip() {
        for t in [ProductType::Product, ProductType::Service] {
            assert_eq!(ProductType::parse(t.as_str()), Some(t));
        }
        assert!(matches!(
            ProductType::parse_input("bundle"),
            Err(CatalogError::InvalidProductType(_))
        ));
    }

    #[test]
    fn test_new_product_defaults_and_normalization() {
        let input: NewProduct = serde_json::from_value(serde_json::json!({
            "vatRateId": VatRateId::new(),
            "name": "  Boiler service ",
            "description": "   ",
            "unitPriceCents": 8500,
        }))
        .unwrap();

        let product = input.validate().unwrap();
        assert_eq!(product.name, "Boiler service");
        assert_eq!(product.description, None);
        assert_eq!(product.unit, "pcs");
        assert_eq!(product.product_type, ProductType::Product);
        assert!(product.is_active);
    }

    #[test]
    fn test_new_product_rejects_negative_price() {
        let input = NewProduct {
            vat_rate_id: VatRateId::new(),
            name: "Pipe".into(),
            description: None,
            sku: None,
            unit: "m".into(),
            unit_price_cents: -1,
            product_type: ProductType::Product,
            is_active: true,
        };
        assert!(matches!(
            input.validate(),
            Err(CatalogError::NegativePrice { field: "unitPriceCents", .. })
        ));
    }

    #[test]
    fn test_new_vat_rate_validation() {
        let ok = NewVatRate {
            name: " Standard ".into(),
            rate_bps: 2100,
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Standard");

        let err = NewVatRate {
            name: "Weird".into(),
            rate_bps: 10_001,
        }
        .validate();
        assert_eq!(err.unwrap_err(), CatalogError::RateOutOfRange(10_001));
    }

    #[test]
    fn test_new_material_requires_name() {
        let err = NewMaterial {
            name: String::new(),
            description: None,
            unit: "pcs".into(),
            unit_price_cents: 10,
        }
        .validate();
        assert_eq!(err.unwrap_err(), CatalogError::Required { field: "name" });
    }
}
