//! Integration tests for product-material linking.
//!
//! Requires a running `PostgreSQL` database; run with `--ignored`.

mod common;

use fieldline_core::catalog::{NewMaterial, NewProduct, NewVatRate, ProductType};
use fieldline_db::{MaterialError, MaterialRepository, ProductRepository, VatRateRepository};
use fieldline_shared::types::{MaterialId, OrganizationId, ProductId};
use sea_orm::ConnectionTrait;

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
                name: "Boiler".into(),
                description: None,
                sku: None,
                unit: "pcs".into(),
                unit_price_cents: 250_000,
                product_type: ProductType::Product,
                is_active: true,
            },
        )
        .await
        .unwrap()
        .id
}

async fn seed_material(repo: &MaterialRepository, org: OrganizationId, name: &str) -> MaterialId {
    repo.create(
        org,
        NewMaterial {
            name: name.to_string(),
            description: None,
            unit: "m".into(),
            unit_price_cents: 350,
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_link_is_all_or_nothing() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Links").await;
    let other = common::create_org(&db, "Other").await;
    let repo = MaterialRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let pipe = seed_material(&repo, org, "Pipe").await;
    let valve = seed_material(&repo, org, "Valve").await;
    let foreign = seed_material(&repo, other, "Foreign").await;

    let result = repo
        .add_product_materials(org, product, &[pipe, foreign, valve])
        .await;
    assert!(matches!(result, Err(MaterialError::NotFound(id)) if id == foreign.into_inner()));

    let linked = repo.list_product_materials(org, product).await.unwrap();
    assert!(linked.is_empty());

    common::cleanup_org(&db, org).await;
    common::cleanup_org(&db, other).await;
}

/// Makes every insert of a link to `material` fail inside Postgres.
async fn block_links_to(db: &sea_orm::DatabaseConnection, material: MaterialId) -> String {
    let name = format!("block_{}", material.into_inner().simple());
    db.execute_unprepared(&format!(
        r"
CREATE FUNCTION {name}() RETURNS trigger AS $$
BEGIN
    IF NEW.material_id = '{material}' THEN
        RAISE EXCEPTION 'link to % blocked', NEW.material_id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
CREATE TRIGGER {name} BEFORE INSERT ON product_materials
    FOR EACH ROW EXECUTE FUNCTION {name}();
"
    ))
    .await
    .unwrap();
    name
}

async fn unblock(db: &sea_orm::DatabaseConnection, name: &str) {
    db.execute_unprepared(&format!(
        "DROP TRIGGER IF EXISTS {name} ON product_materials; DROP FUNCTION IF EXISTS {name}();"
    ))
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_failed_insert_rolls_back_earlier_links() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Rollback").await;
    let repo = MaterialRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let pipe = seed_material(&repo, org, "Pipe").await;
    let valve = seed_material(&repo, org, "Valve").await;
    let trigger = block_links_to(&db, valve).await;

    // Pipe is inserted first, then the valve insert raises.
    let result = repo.add_product_materials(org, product, &[pipe, valve]).await;
    unblock(&db, &trigger).await;

    assert!(matches!(result, Err(MaterialError::Database(_))), "{result:?}");
    let linked = repo.list_product_materials(org, product).await.unwrap();
    assert!(linked.is_empty(), "{linked:?}");

    let linked = repo
        .add_product_materials(org, product, &[pipe, valve])
        .await
        .unwrap();
    assert_eq!(linked.len(), 2);

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_link_dedups_and_keeps_existing() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Dedup").await;
    let repo = MaterialRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let valve = seed_material(&repo, org, "Valve").await;
    let pipe = seed_material(&repo, org, "Pipe").await;

    repo.add_product_materials(org, product, &[valve]).await.unwrap();
    let linked = repo
        .add_product_materials(org, product, &[pipe, valve, pipe])
        .await
        .unwrap();

    let names: Vec<_> = linked.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Pipe", "Valve"]);

    repo.remove_product_material(org, product, pipe).await.unwrap();
    let again = repo.remove_product_material(org, product, pipe).await;
    assert!(matches!(again, Err(MaterialError::LinkNotFound { .. })));

    repo.delete(org, valve).await.unwrap();
    assert!(repo.list_product_materials(org, product).await.unwrap().is_empty());

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_link_to_foreign_product() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Mine").await;
    let other = common::create_org(&db, "Theirs").await;
    let repo = MaterialRepository::new(db.clone());
    let their_product = seed_product(&db, other).await;
    let pipe = seed_material(&repo, org, "Pipe").await;

    let result = repo.add_product_materials(org, their_product, &[pipe]).await;
    assert!(matches!(result, Err(MaterialError::ProductNotFound(_))));

    common::cleanup_org(&db, org).await;
    common::cleanup_org(&db, other).await;
}
