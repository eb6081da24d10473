//! The paginated repository contract shared by every entity.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::trace;

use crate::{Error, Result};

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// A window into a listing.
///
/// [`Repository::list`] trusts the values it is given; callers that take
/// them from user input should go through [`Page::validated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Number of items to skip.
    pub offset: u32,
}

impl Page {
    /// Create a page without validation.
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Build a page from optional caller input.
    ///
    /// A missing limit defaults to [`DEFAULT_LIMIT`]; a missing offset to 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `limit` is outside `1..=MAX_LIMIT`.
    pub fn validated(limit: Option<u32>, offset: Option<u32>) -> Result<Self> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        Ok(Self::new(limit, offset.unwrap_or(0)))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of items matching the filter, across all pages.
    pub total: u64,
    /// Limit the page was requested with.
    pub limit: u32,
    /// Offset the page was requested with.
    pub offset: u32,
}

/// One page of a listing plus its total count.
///
/// `total` comes from a separate count statement, so under concurrent
/// writes it may disagree with `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items in this page.
    pub data: Vec<T>,
    /// Counts and the window used.
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// Create a page.
    #[must_use]
    pub const fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            data,
            pagination: Pagination {
                total,
                limit: page.limit,
                offset: page.offset,
            },
        }
    }

    /// An empty page with a total of zero.
    #[must_use]
    pub const fn empty(page: Page) -> Self {
        Self::new(Vec::new(), 0, page)
    }

    /// Total number of matching items.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pagination.total
    }

    /// Returns true if this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Transform every item, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Create/get/update/delete/list contract implemented by every entity store.
///
/// The rules every implementation follows:
/// - `get`, `update` and `delete` report a missing row as [`Error::NotFound`],
///   detected from the row identity the backend returns, never from an
///   affected-row count.
/// - `list` counts first and skips the item query when the count is zero.
/// - Listings are ordered by ascending primary key.
/// - Unique violations become [`Error::Conflict`], dangling parents
///   [`Error::MissingParent`].
#[allow(async_fn_in_trait)]
pub trait Repository {
    /// Stored entity type.
    type Entity: fmt::Debug;
    /// Primary key type.
    type Id: Copy + fmt::Display;
    /// Parent filter accepted by [`Repository::list`].
    type Scope;

    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    /// Insert a new row, returning the entity with id and timestamps filled.
    async fn create(&self, entity: Self::Entity) -> Result<Self::Entity>;

    /// Fetch one row by id.
    async fn get(&self, id: Self::Id) -> Result<Self::Entity>;

    /// Write the mutable fields of an existing row and refresh `updated_at`.
    async fn update(&self, entity: &mut Self::Entity) -> Result<()>;

    /// Remove one row by id.
    async fn delete(&self, id: Self::Id) -> Result<()>;

    /// List rows matching `scope`, one page at a time.
    async fn list(&self, scope: Self::Scope, page: Page) -> Result<Paginated<Self::Entity>>;
}

/// Count-then-select helper behind every `list` implementation.
///
/// `count_sql` and `select_sql` take the same optional scope key as their
/// first parameter; `select_sql` must end in `LIMIT ? OFFSET ?`.
pub(crate) async fn paginate<T>(
    pool: &SqlitePool,
    count_sql: &str,
    select_sql: &str,
    scope: Option<i64>,
    page: Page,
    decode: impl Fn(&SqliteRow) -> Result<T>,
) -> Result<Paginated<T>> {
    let mut count = sqlx::query_scalar::<_, i64>(count_sql);
    if let Some(key) = scope {
        count = count.bind(key);
    }
    let total = u64::try_from(count.fetch_one(pool).await?).unwrap_or_default();

    if total == 0 {
        trace!("Count is zero, skipping item query");
        return Ok(Paginated::empty(page));
    }

    let mut select = sqlx::query(select_sql);
    if let Some(key) = scope {
        select = select.bind(key);
    }
    let rows = select
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(pool)
        .await?;

    let data = rows.iter().map(decode).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, total, page))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_validation() {
        assert_eq!(Page::validated(None, None).unwrap(), Page::new(10, 0));
        assert_eq!(Page::validated(Some(100), Some(5)).unwrap(), Page::new(100, 5));
        assert!(Page::validated(Some(0), None).is_err());
        assert!(Page::validated(Some(101), None).is_err());
    }

    #[test]
    fn test_paginated_json_shape() {
        let page = Paginated::new(vec!["a", "b"], 12, Page::new(2, 4));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": ["a", "b"],
                "pagination": {"total": 12, "limit": 2, "offset": 4}
            })
        );
    }

    #[test]
    fn test_paginated_map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2, 3], 30, Page::new(3, 0)).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20, 30]);
        assert_eq!(page.total(), 30);
    }
}
