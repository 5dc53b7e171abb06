//! Parameterized list query construction.

use std::fmt::Write as _;

use chrono::NaiveDate;
use fieldline_shared::types::{ListParams, OrganizationId, PageRequest, SortOrder};
use sea_orm::{DbBackend, Statement, Value};
use uuid::Uuid;

use super::error::QueryError;

/// Static description of a listable table.
///
/// One `const` per resource; never built from request data.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    /// Table name.
    pub table: &'static str,
    /// Columns matched by the free-text search term.
    pub search_columns: &'static [&'static str],
    /// Allowed sort fields as `(external name, column)`.
    pub sort_fields: &'static [(&'static str, &'static str)],
    /// Column used when `sortBy` is absent.
    pub default_sort: &'static str,
    /// Direction used when `sortOrder` is absent.
    pub default_order: SortOrder,
    /// Unique column appended to every ordering.
    pub tie_break: &'static str,
}

impl ListSpec {
    /// Resolve an external sort field to its column.
    pub fn sort_column(&self, field: Option<&str>) -> Result<&'static str, QueryError> {
        let Some(field) = field else {
            return Ok(self.default_sort);
        };
        self.sort_fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| QueryError::InvalidSortField {
                field: field.to_string(),
                allowed: self
                    .sort_fields
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Resolve a sort direction.
    pub fn sort_order(&self, order: Option<&str>) -> Result<SortOrder, QueryError> {
        match order {
            None => Ok(self.default_order),
            Some(raw) => {
                SortOrder::parse(raw).ok_or_else(|| QueryError::InvalidSortOrder(raw.to_string()))
            }
        }
    }
}

/// Typed value for an exact-match filter. `None` matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// UUID column.
    Uuid(Option<Uuid>),
    /// Text column.
    Text(Option<String>),
    /// Boolean column.
    Bool(Option<bool>),
}

impl FilterValue {
    const fn sql_type(&self) -> &'static str {
        match self {
            Self::Uuid(_) => "uuid",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Uuid(v) => v.into(),
            Self::Text(v) => v.into(),
            Self::Bool(v) => v.into(),
        }
    }
}

/// A predicate in a list query.
///
/// Every filter binds exactly one parameter whether or not it has a value,
/// so parameter positions do not depend on which filters the caller sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`.
    Exact {
        /// Column name.
        column: &'static str,
        /// Value to match.
        value: FilterValue,
    },
    /// Case-insensitive substring match.
    Contains {
        /// Column name.
        column: &'static str,
        /// Substring; wildcards in it are matched literally.
        value: Option<String>,
    },
    /// `column` (as a UTC date) on or after `date`.
    OnOrAfter {
        /// Timestamp column name.
        column: &'static str,
        /// Inclusive lower bound.
        date: Option<NaiveDate>,
    },
    /// `column` (as a UTC date) on or before `date`.
    OnOrBefore {
        /// Timestamp column name.
        column: &'static str,
        /// Inclusive upper bound.
        date: Option<NaiveDate>,
    },
}

/// Count and page statements for one list request.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    /// `SELECT COUNT(*) AS total ...` without limit/offset.
    pub count: Statement,
    /// `SELECT * ... ORDER BY ... LIMIT ... OFFSET ...`.
    pub page: Statement,
    /// The page the statements were built for.
    pub request: PageRequest,
}

/// Escape `ILIKE` wildcards and wrap the term in `%`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds tenant-scoped list queries.
///
/// `organization_id = $1` is always the first predicate.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    spec: &'a ListSpec,
    organization_id: OrganizationId,
    search: Option<String>,
    filters: Vec<Filter>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: PageRequest,
}

impl<'a> QueryBuilder<'a> {
    /// Start a query for one tenant from request parameters.
    #[must_use]
    pub fn new(spec: &'a ListSpec, organization_id: OrganizationId, params: &ListParams) -> Self {
        Self {
            spec,
            organization_id,
            search: params.search_term().map(ToString::to_string),
            filters: Vec::new(),
            sort_by: params.sort_field().map(ToString::to_string),
            sort_order: params.sort_direction().map(ToString::to_string),
            page: params.page_request(),
        }
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Build the count and page statements.
    pub fn build(&self) -> Result<BuiltQuery, QueryError> {
        let column = self.spec.sort_column(self.sort_by.as_deref())?;
        let order = self.spec.sort_order(self.sort_order.as_deref())?;
        self.check_date_ranges()?;

        let mut values: Vec<Value> = vec![self.organization_id.into_inner().into()];
        let mut where_sql = String::from("organization_id = $1");

        if !self.spec.search_columns.is_empty() {
            let idx = values.len() + 1;
            let matches = self
                .spec
                .search_columns
                .iter()
                .map(|col| format!("{col} ILIKE ${idx}"))
                .collect::<Vec<_>>()
                .join(" OR ");
            let _ = write!(where_sql, " AND (${idx}::text IS NULL OR {matches})");
            values.push(self.search.as_deref().map(like_pattern).into());
        }

        for filter in &self.filters {
            let idx = values.len() + 1;
            let (predicate, value) = render_filter(filter.clone(), idx);
            let _ = write!(where_sql, " AND {predicate}");
            values.push(value);
        }

        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM {} WHERE {where_sql}",
            self.spec.table
        );
        let count = Statement::from_sql_and_values(DbBackend::Postgres, count_sql, values.clone());

        let mut order_sql = format!("{column} {}", order.as_sql());
        if column != self.spec.tie_break {
            let _ = write!(order_sql, ", {} ASC", self.spec.tie_break);
        }

        let limit_idx = values.len() + 1;
        values.push(to_i64(self.page.limit()).into());
        values.push(to_i64(self.page.offset()).into());
        let page_sql = format!(
            "SELECT * FROM {} WHERE {where_sql} ORDER BY {order_sql} LIMIT ${limit_idx} OFFSET ${}",
            self.spec.table,
            limit_idx + 1
        );
        let page = Statement::from_sql_and_values(DbBackend::Postgres, page_sql, values);

        Ok(BuiltQuery {
            count,
            page,
            request: self.page,
        })
    }

    fn check_date_ranges(&self) -> Result<(), QueryError> {
        for lower in &self.filters {
            let Filter::OnOrAfter {
                column,
                date: Some(from),
            } = lower
            else {
                continue;
            };
            for upper in &self.filters {
                if let Filter::OnOrBefore {
                    column: c,
                    date: Some(to),
                } = upper
                    && c == column
                    && from > to
                {
                    return Err(QueryError::InvalidDateRange {
                        from: *from,
                        to: *to,
                    });
                }
            }
        }
        Ok(())
    }
}

fn render_filter(filter: Filter, idx: usize) -> (String, Value) {
    match filter {
        Filter::Exact { column, value } => (
            format!("(${idx}::{} IS NULL OR {column} = ${idx})", value.sql_type()),
            value.into_value(),
        ),
        Filter::Contains { column, value } => (
            format!("(${idx}::text IS NULL OR {column} ILIKE ${idx})"),
            value.as_deref().map(like_pattern).into(),
        ),
        Filter::OnOrAfter { column, date } => (
            format!("(${idx}::date IS NULL OR ({column} AT TIME ZONE 'UTC')::date >= ${idx})"),
            date.into(),
        ),
        Filter::OnOrBefore { column, date } => (
            format!("(${idx}::date IS NULL OR ({column} AT TIME ZONE 'UTC')::date <= ${idx})"),
            date.into(),
        ),
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
