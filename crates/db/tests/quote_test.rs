//! Integration tests for quotes.
//!
//! Requires a running `PostgreSQL` database; run with `--ignored`.

mod common;

use fieldline_core::catalog::{NewProduct, NewVatRate, ProductType};
use fieldline_core::quote::{NewQuote, NewQuoteLine, QuoteError, QuoteStatus};
use fieldline_db::{ProductRepository, QuoteFilter, QuoteRepository, QuoteRepositoryError, VatRateRepository};
use fieldline_shared::types::{ListParams, OrganizationId, ProductId, UserId};

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
                name: "Heat pump".into(),
                description: None,
                sku: None,
                unit: "pcs".into(),
                unit_price_cents: 333,
                product_type: ProductType::Product,
                is_active: true,
            },
        )
        .await
        .unwrap()
        .id
}

fn quote_for(product: ProductId) -> NewQuote {
    NewQuote {
        customer_name: "  Jane Doe ".into(),
        valid_until: None,
        notes: None,
        lines: vec![
            NewQuoteLine {
                product_id: Some(product),
                description: None,
                quantity: 3,
                unit_price_cents: None,
                vat_rate_bps: None,
            },
            NewQuoteLine {
                product_id: None,
                description: Some("Labor".into()),
                quantity: 2,
                unit_price_cents: Some(5_000),
                vat_rate_bps: Some(900),
            },
        ],
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_quote_with_product_defaults() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Quotes").await;
    let repo = QuoteRepository::new(db.clone());
    let product = seed_product(&db, org).await;

    let created = repo
        .create(org, UserId::new(), quote_for(product))
        .await
        .unwrap();

    assert_eq!(created.quote.customer_name, "Jane Doe");
    assert_eq!(created.quote.status, QuoteStatus::Draft);
    assert!(created.quote.quote_number.starts_with("Q-"));
    // 3 * 333 = 999 net, 209.79 VAT -> 210; 2 * 5000 = 10000 net, 900 VAT.
    assert_eq!(created.quote.subtotal_cents, 10_999);
    assert_eq!(created.quote.vat_cents, 1_110);
    assert_eq!(created.quote.total_cents, 12_109);
    assert_eq!(created.lines.len(), 2);
    assert_eq!(created.lines[0].description, "Heat pump");
    assert_eq!(created.lines[0].vat_rate_bps, 2100);
    assert_eq!(created.lines[1].position, 1);

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_foreign_product_rejected() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Mine").await;
    let other = common::create_org(&db, "Theirs").await;
    let repo = QuoteRepository::new(db.clone());
    let their_product = seed_product(&db, other).await;

    let result = repo.create(org, UserId::new(), quote_for(their_product)).await;
    assert!(matches!(result, Err(QuoteRepositoryError::ProductNotFound(_))));

    let page = repo
        .list(org, &ListParams::default(), &QuoteFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    common::cleanup_org(&db, org).await;
    common::cleanup_org(&db, other).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_status_workflow_and_delete() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Workflow").await;
    let repo = QuoteRepository::new(db.clone());
    let product = seed_product(&db, org).await;
    let quote = repo
        .create(org, UserId::new(), quote_for(product))
        .await
        .unwrap()
        .quote;

    let skipped = repo.update_status(org, quote.id, "accepted").await;
    assert!(matches!(
        skipped,
        Err(QuoteRepositoryError::Quote(QuoteError::InvalidTransition { .. }))
    ));

    let sent = repo.update_status(org, quote.id, "sent").await.unwrap();
    assert_eq!(sent.status, QuoteStatus::Sent);

    let sent_only = repo
        .list(
            org,
            &ListParams::default(),
            &QuoteFilter {
                status: Some("sent".into()),
                ..QuoteFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(sent_only.total, 1);

    let not_draft = repo.delete(org, quote.id).await;
    assert!(matches!(
        not_draft,
        Err(QuoteRepositoryError::Quote(QuoteError::NotDraft(QuoteStatus::Sent)))
    ));

    repo.update_status(org, quote.id, "draft").await.unwrap();
    repo.delete(org, quote.id).await.unwrap();
    assert!(matches!(
        repo.get(org, quote.id).await,
        Err(QuoteRepositoryError::NotFound(_))
    ));

    common::cleanup_org(&db, org).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_status_changes_only_one_wins() {
    let db = common::connect().await;
    let org = common::create_org(&db, "Race").await;
    let repo = QuoteRepository::new(db.clone());
    let product = seed_product(&db, org).await;
    let quote = repo
        .create(org, UserId::new(), quote_for(product))
        .await
        .unwrap()
        .quote;
    repo.update_status(org, quote.id, "sent").await.unwrap();

    let (accepted, rejected) = tokio::join!(
        repo.update_status(org, quote.id, "accepted"),
        repo.update_status(org, quote.id, "rejected"),
    );

    let winners = [accepted.is_ok(), rejected.is_ok()];
    assert_eq!(winners.iter().filter(|ok| **ok).count(), 1, "{winners:?}");
    let loser = if accepted.is_ok() { rejected } else { accepted };
    assert!(matches!(
        loser,
        Err(QuoteRepositoryError::StatusChanged(_)
            | QuoteRepositoryError::Quote(QuoteError::InvalidTransition { .. }))
    ));

    let stored = repo.get(org, quote.id).await.unwrap().quote.status;
    assert!(matches!(stored, QuoteStatus::Accepted | QuoteStatus::Rejected));

    common::cleanup_org(&db, org).await;
}
