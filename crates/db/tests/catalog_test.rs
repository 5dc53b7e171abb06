//! Integration tests for VAT rate and product listing.
//!
//! Requires a running `PostgreSQL` database; run with `--ignored`.

mod common;

use std::collections::HashSet;

use fieldline_core::catalog::{NewProduct, NewVatRate, ProductPatch, ProductType, VatRatePatch};
use fieldline_db::{ProductError, ProductFilter, ProductRepository, VatRateError, VatRateRepository};
use fieldline_shared::types::ListParams;

fn list_params(sort_by: &str, sort_order: &str, page: u64, page_size: u64) -> ListParams {
    ListParams {
        search: Some(String::new()),
        sort_by: Some(sort_by.to_string()),
        sort_order: Some(sort_order.to_string()),
        page: Some(page),
        page_size: Some(page_size),
    }
}

async fn seed_rates(repo: &VatRateRepository, org: fieldline_shared::types::OrganizationId) {
    for (name, rate_bps) in [("Low", 0), ("Standard", 2100), ("High", 2100)] {
        repo.create(
            org,
            NewVatRate {
                name: name.to_string(),
                rate_bps,
            },
        )
        .await
        .expect("Failed to create VAT rate");
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_vat_rates_sorted_with_tie_break() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Rates").await;
    let repo = VatRateRepository::new(db.clone());
    seed_rates(&repo, org).await;

    let page = repo
        .list(org, &list_params("rateBps", "asc", 1, 2))
        .await
        .unwrap();

    let names: Vec<_> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Low", "High"]);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_page_walk_is_complete_and_stable() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Walk").await;
    let repo = VatRateRepository::new(db.clone());
    for i in 0..7 {
        repo.create(
            org,
            NewVatRate {
                name: format!("Rate {i}"),
                rate_bps: 1000,
            },
        )
        .await
        .unwrap();
    }

    let mut seen = HashSet::new();
    let mut page_no = 1;
    loop {
        let page = repo
            .list(org, &list_params("rateBps", "desc", page_no, 3))
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        if page.items.is_empty() {
            break;
        }
        for rate in page.items {
            assert!(seen.insert(rate.id), "duplicate across pages");
        }
        page_no += 1;
    }
    assert_eq!(seen.len(), 7);

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_lists_never_cross_tenants() {
    let db = common::connect().await;
    let org_a = common::create_org(&db, "A").await;
    let org_b = common::create_org(&db, "B").await;
    let repo = VatRateRepository::new(db.clone());
    seed_rates(&repo, org_a).await;
    seed_rates(&repo, org_b).await;

    let page = repo
        .list(
            org_a,
            &ListParams {
                search: Some("a".to_string()),
                ..ListParams::default()
            },
        )
        .await
        .unwrap();

    assert!(page.items.iter().all(|r| r.organization_id == org_a));
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Standard");

    let foreign = repo.list(org_b, &ListParams::default()).await.unwrap();
    let err = repo.get(org_a, foreign.items[0].id).await.unwrap_err();
    assert!(matches!(err, VatRateError::NotFound(_)));

    common::cleanup_org(&db, org_a).await;
    common::cleanup_org(&db, org_b).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_vat_rate_rules() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Rules").await;
    let rates = VatRateRepository::new(db.clone());
    let products = ProductRepository::new(db.clone());

    let rate = rates
        .create(
            org,
            NewVatRate {
                name: "Standard".into(),
                rate_bps: 2100,
            },
        )
        .await
        .unwrap();

    let dup = rates
        .create(
            org,
            NewVatRate {
                name: "Standard".into(),
                rate_bps: 900,
            },
        )
        .await;
    assert!(matches!(dup, Err(VatRateError::DuplicateName(_))));

    let renamed = rates
        .update(
            org,
            rate.id,
            VatRatePatch {
                rate_bps: Some(1900),
                ..VatRatePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Standard");
    assert_eq!(renamed.rate_bps, 1900);

    products
        .create(
            org,
            NewProduct {
                vat_rate_id: rate.id,
                name: "Heat pump".into(),
                description: None,
                sku: Some("HP-1".into()),
                unit: "pcs".into(),
                unit_price_cents: 450_000,
                product_type: ProductType::Product,
                is_active: true,
            },
        )
        .await
        .unwrap();

    let in_use = rates.delete(org, rate.id).await;
    assert!(matches!(in_use, Err(VatRateError::InUse(1))));

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_product_filters_and_patch() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Products").await;
    let other = common::create_org(&db, "Other").await;
    let rates = VatRateRepository::new(db.clone());
    let repo = ProductRepository::new(db.clone());

    let rate = rates
        .create(org, NewVatRate { name: "Std".into(), rate_bps: 2100 })
        .await
        .unwrap();
    let foreign_rate = rates
        .create(other, NewVatRate { name: "Std".into(), rate_bps: 2100 })
        .await
        .unwrap();

    let new_product = |name: &str, product_type| NewProduct {
        vat_rate_id: rate.id,
        name: name.to_string(),
        description: Some("installed on site".into()),
        sku: None,
        unit: "pcs".into(),
        unit_price_cents: 10_000,
        product_type,
        is_active: true,
    };
    let pump = repo
        .create(org, new_product("Pump", ProductType::Product))
        .await
        .unwrap();
    repo.create(org, new_product("Install", ProductType::Service))
        .await
        .unwrap();

    let services = repo
        .list(
            org,
            &ListParams::default(),
            &ProductFilter {
                product_type: Some("service".into()),
                ..ProductFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(services.total, 1);
    assert_eq!(services.items[0].name, "Install");

    let cross = repo
        .create(
            org,
            NewProduct {
                vat_rate_id: foreign_rate.id,
                ..new_product("Cross", ProductType::Product)
            },
        )
        .await;
    assert!(matches!(cross, Err(ProductError::VatRateNotFound(_))));

    let patched = repo
        .update(
            org,
            pump.id,
            ProductPatch {
                description: Some(None),
                unit_price_cents: Some(12_500),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.description, None);
    assert_eq!(patched.unit_price_cents, 12_500);
    assert_eq!(patched.name, "Pump");

    common::cleanup_org(&db, org).await;
    common::cleanup_org(&db, other).await;
}
