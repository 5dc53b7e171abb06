//! Core business logic for Fieldline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `catalog` - VAT rates, products, materials and their validation
//! - `quote` - Quote lines, money totals and the status lifecycle
//! - `asset` - Product files and links, two-phase uploads
//! - `storage` - Object storage client, key building and presigning

pub mod asset;
pub mod catalog;
pub mod quote;
pub mod storage;
