//! Partial updates.
//!
//! A field left out of the request body stays `None` and is not touched.
//! Nullable columns use `Option<Option<T>>`: `Some(None)` clears the value.

use chrono::Utc;
use fieldline_shared::types::VatRateId;
use serde::{Deserialize, Deserializer};

use super::error::CatalogError;
use super::types::{
    DESCRIPTION_MAX, Material, NAME_MAX, Product, ProductType, SKU_MAX, UNIT_MAX, VatRate,
};
use super::validation::{normalize_optional, normalize_required, validate_price, validate_rate_bps};

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn merge_optional(
    field: &'static str,
    patch: Option<Option<String>>,
    current: Option<String>,
    max: usize,
) -> Result<Option<String>, CatalogError> {
    match patch {
        None => Ok(current),
        Some(None) => Ok(None),
        Some(Some(value)) => normalize_optional(field, Some(&value), max),
    }
}

/// Patch for a VAT rate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatRatePatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New rate in basis points.
    #[serde(default)]
    pub rate_bps: Option<i32>,
}

impl VatRatePatch {
    /// Merge onto `current`, validating every provided field.
    pub fn apply(self, current: VatRate) -> Result<VatRate, CatalogError> {
        Ok(VatRate {
            name: match self.name {
                Some(name) => normalize_required("name", &name, NAME_MAX)?,
                None => current.name,
            },
            rate_bps: match self.rate_bps {
                Some(rate) => validate_rate_bps(rate)?,
                None => current.rate_bps,
            },
            updated_at: Utc::now(),
            ..current
        })
    }
}

/// Patch for a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    /// New VAT rate.
    #[serde(default)]
    pub vat_rate_id: Option<VatRateId>,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New SKU; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    /// New unit.
    #[serde(default)]
    pub unit: Option<String>,
    /// New unit price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    /// New type.
    #[serde(default)]
    pub product_type: Option<ProductType>,
    /// New active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Merge onto `current`, validating every provided field.
    pub fn apply(self, current: Product) -> Result<Product, CatalogError> {
        Ok(Product {
            vat_rate_id: self.vat_rate_id.unwrap_or(current.vat_rate_id),
            name: match self.name {
                Some(name) => normalize_required("name", &name, NAME_MAX)?,
                None => current.name,
            },
            description: merge_optional(
                "description",
                self.description,
                current.description,
                DESCRIPTION_MAX,
            )?,
            sku: merge_optional("sku", self.sku, current.sku, SKU_MAX)?,
            unit: match self.unit {
                Some(unit) => normalize_required("unit", &unit, UNIT_MAX)?,
                None => current.unit,
            },
            unit_price_cents: match self.unit_price_cents {
                Some(cents) => validate_price("unitPriceCents", cents)?,
                None => current.unit_price_cents,
            },
            product_type: self.product_type.unwrap_or(current.product_type),
            is_active: self.is_active.unwrap_or(current.is_active),
            updated_at: Utc::now(),
            ..current
        })
    }
}

/// Patch for a material.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New unit.
    #[serde(default)]
    pub unit: Option<String>,
    /// New unit price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl MaterialPatch {
    /// Merge onto `current`, validating every provided field.
    pub fn apply(self, current: Material) -> Result<Material, CatalogError> {
        Ok(Material {
            name: match self.name {
                Some(name) => normalize_required("name", &name, NAME_MAX)?,
                None => current.name,
            },
            description: merge_optional(
                "description",
                self.description,
                current.description,
                DESCRIPTION_MAX,
            )?,
            unit: match self.unit {
                Some(unit) => normalize_required("unit", &unit, UNIT_MAX)?,
                None => current.unit,
            },
            unit_price_cents: match self.unit_price_cents {
                Some(cents) => validate_price("unitPriceCents", cents)?,
                None => current.unit_price_cents,
            },
            updated_at: Utc::now(),
            ..current
        })
    }
}
