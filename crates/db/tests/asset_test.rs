//! Integration tests for the asset repository.
//!
//! Requires a running `PostgreSQL` database; run with `--ignored`.

mod common;

use fieldline_core::asset::{AssetError, AssetRepository as _, AssetType, NewAsset};
use fieldline_core::catalog::{NewProduct, NewVatRate, ProductType};
use fieldline_db::{AssetRepository, ProductRepository, VatRateRepository};
use fieldline_shared::types::{AssetId, OrganizationId, ProductId};

async fn seed_product(db: &sea_orm::DatabaseConnection, org: OrganizationId) -> ProductId {
    let rate = VatRateRepository::new(db.clone())
        .create(org, NewVatRate { name: "Std".into(), rate_bps: 2100 })
        .await
        .unwrap();
    ProductRepository::new(db.clone())
        .create(
            org,
            NewProduct {
                vat_rate_id: rate.id,
                name: "Panel".into(),
                description: None,
                sku: None,
                unit: "pcs".into(),
                unit_price_cents: 1_000,
                product_type: ProductType::Product,
                is_active: true,
            },
        )
        .await
        .unwrap()
        .id
}

fn asset(org: OrganizationId, product: ProductId, key: Option<&str>, url: Option<&str>) -> NewAsset {
    NewAsset {
        id: AssetId::new(),
        organization_id: org,
        product_id: product,
        asset_type: AssetType::Document,
        file_key: key.map(ToString::to_string),
        external_url: url.map(ToString::to_string),
        file_name: "sheet.pdf".into(),
        content_type: key.map(|_| "application/pdf".to_string()),
        size_bytes: key.map(|_| 2048),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_asset_roundtrip_and_scoping() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Assets").await;
    let other = common::create_org(&db, "Other").await;
    let repo = AssetRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let key = format!("{org}/{product}/document/sheet_0a1b2c3d.pdf");
    let stored = repo.create(asset(org, product, Some(&key), None)).await.unwrap();
    let linked = repo
        .create(asset(org, product, None, Some("https://example.com/sheet.pdf")))
        .await
        .unwrap();

    let listed = repo.list_by_product(org, product).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|a| a.id == stored.id));
    assert!(listed.iter().any(|a| a.id == linked.id));

    assert!(repo.find_by_id(other, product, stored.id).await.unwrap().is_none());
    assert!(!repo.product_exists(other, product).await.unwrap());
    assert!(!repo.delete(other, stored.id).await.unwrap());
    assert!(repo.delete(org, stored.id).await.unwrap());

    common::cleanup_org(&db, org).await;
    common::cleanup_org(&db, other).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_key_and_url_are_exclusive() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Exclusive").await;
    let repo = AssetRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let both = repo
        .create(asset(
            org,
            product,
            Some("k/k/document/a_0a1b2c3d.pdf"),
            Some("https://example.com/a.pdf"),
        ))
        .await;
    assert!(both.is_err());

    let neither = repo.create(asset(org, product, None, None)).await;
    assert!(neither.is_err());

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_confirming_same_key_twice_conflicts() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Duplicate keys").await;
    let repo = AssetRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let key = format!("{org}/{product}/document/sheet_0a1b2c3d.pdf");
    repo.create(asset(org, product, Some(&key), None)).await.unwrap();

    let again = repo.create(asset(org, product, Some(&key), None)).await;
    assert!(
        matches!(&again, Err(AssetError::DuplicateKey(k)) if *k == key),
        "{again:?}"
    );
    assert_eq!(repo.list_by_product(org, product).await.unwrap().len(), 1);

    common::cleanup_org(&db, org).await;
}
