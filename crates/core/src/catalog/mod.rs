//! Catalog domain: VAT rates, products, materials.
//!
//! Inputs are normalized here (trimmed, blank optionals collapsed to `None`)
//! before they reach the repository. Updates are explicit patch values merged
//! onto the loaded entity in pure code.

mod error;
mod patch;
mod types;
mod validation;

pub use error::CatalogError;
pub use patch::{MaterialPatch, ProductPatch, VatRatePatch};
pub use types::{Material, NewMaterial, NewProduct, NewVatRate, Product, ProductType, VatRate};
pub use validation::{
    MAX_BPS, normalize_optional, normalize_required, validate_price, validate_rate_bps,
};
