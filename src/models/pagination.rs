//! Pagination types
//!
//! Listings are split into pages of [`POSTS_PER_PAGE`] items. The requested
//! page comes from the `page` query parameter, either a 1-based number or
//! `last`, and is resolved against the total item count before the page
//! itself is fetched.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Items per page on every post listing
pub const POSTS_PER_PAGE: u32 = 10;

/// Page requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    Number(u32),
    Last,
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageSelector {
    /// Parse the raw `page` parameter. Absent means the first page;
    /// anything that is neither a number nor `last` is `None`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(Self::default()),
            Some("last") => Some(Self::Last),
            Some(value) => value.parse().ok().map(Self::Number),
        }
    }
}

/// Resolved pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: POSTS_PER_PAGE,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Resolve a selector against `total` items.
    ///
    /// Returns `None` when the page does not exist. The first page always
    /// exists, even for an empty listing.
    pub fn resolve(selector: PageSelector, total: i64, per_page: u32) -> Option<Self> {
        let per_page = per_page.max(1);
        let num_pages = page_count(total, per_page);
        let page = match selector {
            PageSelector::Last => num_pages,
            PageSelector::Number(n) if (1..=num_pages).contains(&n) => n,
            PageSelector::Number(_) => return None,
        };
        Some(Self { page, per_page })
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

fn page_count(total: i64, per_page: u32) -> u32 {
    let total = total.max(0) as u64;
    let pages = total.div_ceil(per_page as u64).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One page of a listing.
///
/// Serializes as `{ items, number, num_pages, count, has_next, has_previous }`.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages, at least one
    pub fn total_pages(&self) -> u32 {
        page_count(self.total, self.per_page.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: Serialize> Serialize for PagedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PagedResult", 6)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("number", &self.page)?;
        state.serialize_field("num_pages", &self.total_pages())?;
        state.serialize_field("count", &self.total)?;
        state.serialize_field("has_next", &self.has_next())?;
        state.serialize_field("has_previous", &self.has_prev())?;
        state.end()
    }
}
