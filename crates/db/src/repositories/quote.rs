//! Quote repository.
//!
//! A quote and its lines are written in one transaction; amounts come from
//! `fieldline_core::quote` and are never recomputed in SQL.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use fieldline_core::quote::{
    NewQuote, ProductDefaults, Quote, QuoteError, QuoteLine, QuoteStatus, QuoteTotals,
    QuoteWithLines, generate_quote_number, resolve_line,
};
use fieldline_shared::AppError;
use fieldline_shared::types::{
    ListParams, OrganizationId, Page, ProductId, QuoteId, QuoteLineId, SortOrder, UserId,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{is_unique_violation, to_utc};
use crate::entities::{products, quote_lines, quotes, vat_rates};
use crate::query::{
    Filter, FilterValue, ListSpec, QueryBuilder, QueryError, ensure_tenant, fetch_page,
};

/// List definition for quotes.
pub const QUOTE_LIST: ListSpec = ListSpec {
    table: "quotes",
    search_columns: &["quote_number", "customer_name"],
    sort_fields: &[
        ("quoteNumber", "quote_number"),
        ("customerName", "customer_name"),
        ("totalCents", "total_cents"),
        ("status", "status"),
        ("createdAt", "created_at"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    tie_break: "id",
};

/// Error types for quote persistence.
#[derive(Debug, thiserror::Error)]
pub enum QuoteRepositoryError {
    /// Quote not found in the organization.
    #[error("Quote not found: {0}")]
    NotFound(Uuid),

    /// A line references a product outside the organization.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Generated quote number already taken.
    #[error("Quote number '{0}' already exists, please retry")]
    NumberTaken(String),

    /// Status was changed by another request after it was read.
    #[error("Quote {0} was changed by another request, reload and retry")]
    StatusChanged(Uuid),

    /// Domain rule violated.
    #[error(transparent)]
    Quote(#[from] QuoteError),

    /// Bad list parameters.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<QuoteRepositoryError> for AppError {
    fn from(err: QuoteRepositoryError) -> Self {
        match err {
            QuoteRepositoryError::NotFound(_) | QuoteRepositoryError::ProductNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            QuoteRepositoryError::NumberTaken(_) | QuoteRepositoryError::StatusChanged(_) => {
                Self::Conflict(err.to_string())
            }
            QuoteRepositoryError::Quote(e) => e.into(),
            QuoteRepositoryError::Query(e) => e.into(),
            QuoteRepositoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Filters for listing quotes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFilter {
    /// Workflow state.
    #[serde(default)]
    pub status: Option<String>,
    /// Created on or after this day (UTC).
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    /// Created on or before this day (UTC).
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

/// Quote repository.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: DatabaseConnection,
}

impl QuoteRepository {
    /// Creates a new quote repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists quote headers.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        params: &ListParams,
        filter: &QuoteFilter,
    ) -> Result<Page<Quote>, QuoteRepositoryError> {
        let status = filter
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(QuoteStatus::parse_input)
            .transpose()?;

        let query = QueryBuilder::new(&QUOTE_LIST, organization_id, params)
            .filter(Filter::Exact {
                column: "status",
                value: FilterValue::Text(status.map(|s| s.as_str().to_string())),
            })
            .filter(Filter::OnOrAfter {
                column: "created_at",
                date: filter.created_from,
            })
            .filter(Filter::OnOrBefore {
                column: "created_at",
                date: filter.created_to,
            })
            .build()?;

        let page = fetch_page::<quotes::Entity, _>(&self.db, query).await?;
        ensure_tenant(organization_id, &page.items, |m| m.organization_id)?;
        Ok(page.try_map(to_domain)?)
    }

    /// Gets a quote with its lines.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        id: QuoteId,
    ) -> Result<QuoteWithLines, QuoteRepositoryError> {
        let quote = self.find_model(organization_id, id).await?;
        let lines = quote_lines::Entity::find()
            .filter(quote_lines::Column::QuoteId.eq(id.into_inner()))
            .filter(quote_lines::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(quote_lines::Column::Position)
            .all(&self.db)
            .await?;

        Ok(QuoteWithLines {
            quote: to_domain(quote)?,
            lines: lines.into_iter().map(line_to_domain).collect(),
        })
    }

    /// Creates a draft quote with its lines.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        created_by: UserId,
        input: NewQuote,
    ) -> Result<QuoteWithLines, QuoteRepositoryError> {
        let (customer_name, notes) = input.validate_header()?;

        let txn = self.db.begin().await?;

        let defaults = product_defaults(&txn, organization_id, &input).await?;
        let drafts = input
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let position = i32::try_from(idx).map_err(|_| QuoteError::Overflow)?;
                let product = line.product_id.and_then(|id| defaults.get(&id));
                resolve_line(position, line, product)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let totals = QuoteTotals::from_lines(&drafts)?;

        let now = Utc::now();
        let quote_id = QuoteId::new();
        let quote_number = generate_quote_number(now.date_naive());

        let quote = quotes::ActiveModel {
            id: Set(quote_id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            quote_number: Set(quote_number.clone()),
            customer_name: Set(customer_name),
            status: Set(QuoteStatus::Draft.as_str().to_string()),
            valid_until: Set(input.valid_until),
            notes: Set(notes),
            subtotal_cents: Set(totals.subtotal_cents),
            vat_cents: Set(totals.vat_cents),
            total_cents: Set(totals.total_cents),
            created_by: Set(created_by.into_inner()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                QuoteRepositoryError::NumberTaken(quote_number.clone())
            } else {
                e.into()
            }
        })?;

        let line_models: Vec<quote_lines::ActiveModel> = drafts
            .into_iter()
            .map(|draft| quote_lines::ActiveModel {
                id: Set(QuoteLineId::new().into_inner()),
                quote_id: Set(quote_id.into_inner()),
                organization_id: Set(organization_id.into_inner()),
                product_id: Set(draft.product_id.map(ProductId::into_inner)),
                description: Set(draft.description),
                quantity: Set(draft.quantity),
                unit_price_cents: Set(draft.unit_price_cents),
                vat_rate_bps: Set(draft.vat_rate_bps),
                position: Set(draft.position),
            })
            .collect();
        quote_lines::Entity::insert_many(line_models)
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            org_id = %organization_id,
            quote_id = %quote_id,
            quote_number = %quote.quote_number,
            total_cents = quote.total_cents,
            "created quote"
        );
        self.get(organization_id, quote_id).await
    }

    /// Moves a quote to another workflow state.
    pub async fn update_status(
        &self,
        organization_id: OrganizationId,
        id: QuoteId,
        status: &str,
    ) -> Result<Quote, QuoteRepositoryError> {
        let next = QuoteStatus::parse_input(status.trim())?;
        let model = self.find_model(organization_id, id).await?;
        let current = parse_status(&model.status)?;
        current.transition(next)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = quotes::Entity::update_many()
            .col_expr(quotes::Column::Status, Expr::value(next.as_str()))
            .col_expr(quotes::Column::UpdatedAt, Expr::value(now))
            .filter(quotes::Column::Id.eq(model.id))
            .filter(quotes::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(quotes::Column::Status.eq(current.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(QuoteRepositoryError::StatusChanged(id.into_inner()));
        }
        let model = self.find_model(organization_id, id).await?;

        tracing::info!(
            org_id = %organization_id,
            quote_id = %id,
            from = current.as_str(),
            to = next.as_str(),
            "changed quote status"
        );
        to_domain(model)
    }

    /// Deletes a draft quote.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        id: QuoteId,
    ) -> Result<(), QuoteRepositoryError> {
        let model = self.find_model(organization_id, id).await?;
        let status = parse_status(&model.status)?;
        if status != QuoteStatus::Draft {
            return Err(QuoteError::NotDraft(status).into());
        }

        let result = quotes::Entity::delete_many()
            .filter(quotes::Column::Id.eq(id.into_inner()))
            .filter(quotes::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(quotes::Column::Status.eq(QuoteStatus::Draft.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            // Sent between the read and the delete.
            return Err(QuoteError::NotDraft(QuoteStatus::Sent).into());
        }
        tracing::info!(org_id = %organization_id, quote_id = %id, "deleted quote");
        Ok(())
    }

    async fn find_model(
        &self,
        organization_id: OrganizationId,
        id: QuoteId,
    ) -> Result<quotes::Model, QuoteRepositoryError> {
        quotes::Entity::find_by_id(id.into_inner())
            .filter(quotes::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(QuoteRepositoryError::NotFound(id.into_inner()))
    }
}

/// Catalog values for every product the quote references.
async fn product_defaults<C: ConnectionTrait>(
    db: &C,
    organization_id: OrganizationId,
    input: &NewQuote,
) -> Result<HashMap<ProductId, ProductDefaults>, QuoteRepositoryError> {
    let ids: HashSet<Uuid> = input
        .lines
        .iter()
        .filter_map(|line| line.product_id.map(ProductId::into_inner))
        .collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, String, i64, bool, i32)> = products::Entity::find()
        .select_only()
        .column(products::Column::Id)
        .column(products::Column::Name)
        .column(products::Column::UnitPriceCents)
        .column(products::Column::IsActive)
        .column(vat_rates::Column::RateBps)
        .join(JoinType::InnerJoin, products::Relation::VatRates.def())
        .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(products::Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;

    let defaults: HashMap<ProductId, ProductDefaults> = rows
        .into_iter()
        .map(|(id, name, unit_price_cents, is_active, vat_rate_bps)| {
            (
                ProductId::from_uuid(id),
                ProductDefaults {
                    name,
                    unit_price_cents,
                    vat_rate_bps,
                    is_active,
                },
            )
        })
        .collect();

    if let Some(missing) = ids
        .iter()
        .find(|id| !defaults.contains_key(&ProductId::from_uuid(**id)))
    {
        return Err(QuoteRepositoryError::ProductNotFound(*missing));
    }
    Ok(defaults)
}

fn parse_status(raw: &str) -> Result<QuoteStatus, DbErr> {
    QuoteStatus::parse(raw).ok_or_else(|| DbErr::Custom(format!("unknown quote status '{raw}'")))
}

fn to_domain(model: quotes::Model) -> Result<Quote, QuoteRepositoryError> {
    Ok(Quote {
        id: QuoteId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        quote_number: model.quote_number,
        customer_name: model.customer_name,
        status: parse_status(&model.status)?,
        valid_until: model.valid_until,
        notes: model.notes,
        subtotal_cents: model.subtotal_cents,
        vat_cents: model.vat_cents,
        total_cents: model.total_cents,
        created_by: UserId::from_uuid(model.created_by),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

fn line_to_domain(model: quote_lines::Model) -> QuoteLine {
    QuoteLine {
        id: QuoteLineId::from_uuid(model.id),
        quote_id: QuoteId::from_uuid(model.quote_id),
        product_id: model.product_id.map(ProductId::from_uuid),
        description: model.description,
        quantity: model.quantity,
        unit_price_cents: model.unit_price_cents,
        vat_rate_bps: model.vat_rate_bps,
        position: model.position,
    }
}
