//! `SeaORM` entities.
//!
//! Enumerated columns (`product_type`, `asset_type`, `status`) are stored as
//! text guarded by CHECK constraints and parsed into core enums at the
//! repository boundary.

pub mod materials;
pub mod organizations;
pub mod product_assets;
pub mod product_materials;
pub mod products;
pub mod quote_lines;
pub mod quotes;
pub mod vat_rates;
