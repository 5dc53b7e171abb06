//! Pagination and list-request types for list endpoints.
//!
//! Page numbers are 1-indexed. Page sizes are clamped rather than rejected so
//! a client asking for 1000 rows simply gets the maximum.

use serde::{Deserialize, Serialize};

/// Default page size when the client sends none.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Largest page a client can request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u64,
    /// Number of items per page, in `1..=MAX_PAGE_SIZE`.
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a window from raw client input, applying defaults and clamps.
    #[must_use]
    pub fn normalized(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Sort direction. Parsing is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Parses `"asc"` or `"desc"`; anything else yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query-string parameters shared by every list endpoint.
///
/// `sort_by` and `sort_order` stay raw strings; each resource validates them
/// against its own allow-list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Free-text search term.
    #[serde(default)]
    pub search: Option<String>,
    /// External sort field name.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Requested page.
    #[serde(default)]
    pub page: Option<u64>,
    /// Requested page size.
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl ListParams {
    /// Trimmed search term, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Requested sort field, `None` when blank.
    #[must_use]
    pub fn sort_field(&self) -> Option<&str> {
        self.sort_by.as_deref().filter(|s| !s.is_empty())
    }

    /// Requested sort direction, `None` when blank.
    #[must_use]
    pub fn sort_direction(&self) -> Option<&str> {
        self.sort_order.as_deref().filter(|s| !s.is_empty())
    }

    /// Normalized pagination window.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::normalized(self.page, self.page_size)
    }
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Current page number.
    pub page: u64,
    /// Items per page.
    pub page_size: u64,
    /// `ceil(total / page_size)`; zero when nothing matched.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assembles a page from the query window and the unpaginated total.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let page_size = request.page_size.max(1);
        Self {
            items,
            total,
            page: request.page,
            page_size,
            total_pages: total.div_ceil(page_size),
        }
    }

    /// Converts every item, keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    /// Like [`Page::map`], stopping at the first conversion error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        })
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
