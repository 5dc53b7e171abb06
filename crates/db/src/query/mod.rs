//! Tenant-scoped filter/sort/paginate queries.
//!
//! Each listable resource declares a [`ListSpec`]; [`QueryBuilder`] turns
//! request parameters into a count statement and a page statement. User
//! input only ever travels as bound parameters.

mod builder;
mod error;

pub use builder::{BuiltQuery, Filter, FilterValue, ListSpec, QueryBuilder, like_pattern};
pub use error::QueryError;

use fieldline_shared::types::{OrganizationId, Page};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult};

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

/// Run a built query and return the page of models.
pub async fn fetch_page<E, C>(db: &C, query: BuiltQuery) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let total = CountRow::find_by_statement(query.count)
        .one(db)
        .await?
        .map_or(0, |row| row.total);
    let items = E::find().from_raw_sql(query.page).all(db).await?;

    Ok(Page::new(
        items,
        query.request,
        u64::try_from(total).unwrap_or_default(),
    ))
}

/// Re-check that every listed row belongs to the tenant.
///
/// The SQL already filters on `organization_id`; this catches a list query
/// that lost the predicate through a later edit or schema drift.
pub fn ensure_tenant<T>(
    organization_id: OrganizationId,
    rows: &[T],
    owner: impl Fn(&T) -> uuid::Uuid,
) -> Result<(), DbErr> {
    if let Some(row) = rows.iter().find(|r| owner(r) != organization_id.into_inner()) {
        tracing::error!(
            org_id = %organization_id,
            row_org_id = %owner(row),
            "list query returned a row from another organization"
        );
        return Err(DbErr::Custom(
            "list query returned a row from another organization".to_string(),
        ));
    }
    Ok(())
}
