//! Page windows, page results and their response payloads.
//!
//! # Invariants
//! - `limit > 0` and `offset >= 0` for every constructed `PageWindow`.
//! - `offset == page_number * page_size` for windows built from a page number.
//! - `content.len() <= limit` and, when present, `total_elements >=
//!   offset + content.len()` whenever content is non-empty.

use crate::query::{QueryError, QueryResult};
use serde::Serialize;

/// Whether a page fetch runs a total-count query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Count matching rows, then select the window.
    WithTotal,
    /// Select `limit + 1` rows to detect a next page without counting.
    SliceOnly,
}

/// Validated `(offset, limit)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    offset: u64,
    limit: u64,
}

impl PageWindow {
    /// Builds a window from a row offset.
    ///
    /// # Errors
    /// - `QueryError::InvalidPageRequest` when `offset < 0` or `limit <= 0`.
    pub fn from_offset(offset: i64, limit: i64) -> QueryResult<Self> {
        if limit <= 0 {
            return Err(QueryError::InvalidPageRequest(format!(
                "limit must be positive, got {limit}"
            )));
        }
        if offset < 0 {
            return Err(QueryError::InvalidPageRequest(format!(
                "offset must not be negative, got {offset}"
            )));
        }
        Ok(Self {
            offset: offset.unsigned_abs(),
            limit: limit.unsigned_abs(),
        })
    }

    /// Builds a window from a zero-based page number.
    ///
    /// # Errors
    /// - `QueryError::InvalidPageRequest` for a negative page, a non-positive
    ///   size, or when `page_number * page_size` overflows.
    pub fn of_page(page_number: i64, page_size: i64) -> QueryResult<Self> {
        if page_number < 0 {
            return Err(QueryError::InvalidPageRequest(format!(
                "page number must not be negative, got {page_number}"
            )));
        }
        if page_size <= 0 {
            return Err(QueryError::InvalidPageRequest(format!(
                "page size must be positive, got {page_size}"
            )));
        }
        let offset = page_number.checked_mul(page_size).ok_or_else(|| {
            QueryError::InvalidPageRequest(format!(
                "page {page_number} with size {page_size} overflows the row offset"
            ))
        })?;
        Self::from_offset(offset, page_size)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Zero-based page number; offsets that are not page-aligned round down.
    pub fn page_number(&self) -> u64 {
        self.offset / self.limit
    }

    pub fn page_size(&self) -> u64 {
        self.limit
    }

    /// Window directly after this one.
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    /// Window directly before this one, or the first window.
    pub fn previous_or_first(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(self.limit),
            limit: self.limit,
        }
    }

    /// Row bounds for a select; slice mode over-fetches by one row.
    pub(crate) fn bounds(&self, mode: CountMode) -> RowBounds {
        let limit = match mode {
            CountMode::WithTotal => self.limit,
            CountMode::SliceOnly => self.limit.saturating_add(1),
        };
        RowBounds {
            offset: clamp_to_i64(self.offset),
            limit: clamp_to_i64(limit),
        }
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Raw `LIMIT/OFFSET` bounds handed to a record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub offset: i64,
    pub limit: i64,
}

/// Content slice plus paging metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    pub content: Vec<T>,
    pub window: PageWindow,
    /// Exact matching row count; `None` in slice mode.
    pub total_elements: Option<u64>,
    pub has_next: bool,
}

impl<T> PageResult<T> {
    /// Page with a counted total. The total is raised when a concurrent write
    /// made the select see more rows than the count.
    pub(crate) fn with_total(content: Vec<T>, window: PageWindow, counted: u64) -> Self {
        let seen = if content.is_empty() {
            0
        } else {
            window.offset.saturating_add(content.len() as u64)
        };
        let total = counted.max(seen);
        let has_next = window.offset.saturating_add(content.len() as u64) < total
            && !content.is_empty();
        Self {
            content,
            window,
            total_elements: Some(total),
            has_next,
        }
    }

    /// Slice built from a `limit + 1` fetch; the extra row only flags `has_next`.
    pub(crate) fn from_overfetch(mut rows: Vec<T>, window: PageWindow) -> Self {
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        let has_next = rows.len() > limit;
        rows.truncate(limit);
        Self {
            content: rows,
            window,
            total_elements: None,
            has_next,
        }
    }

    pub fn number(&self) -> u64 {
        self.window.page_number()
    }

    pub fn size(&self) -> u64 {
        self.window.page_size()
    }

    /// `ceil(total / size)`; `None` in slice mode.
    pub fn total_pages(&self) -> Option<u64> {
        self.total_elements
            .map(|total| total.div_ceil(self.window.page_size()))
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.window.offset > 0
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Converts the content while keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            window: self.window,
            total_elements: self.total_elements,
            has_next: self.has_next,
        }
    }

    /// Fallible variant of [`PageResult::map`].
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PageResult<U>, E> {
        Ok(PageResult {
            content: self.content.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
            window: self.window,
            total_elements: self.total_elements,
            has_next: self.has_next,
        })
    }

    /// Response shape for API callers: a counted page or a slice.
    pub fn into_payload(self) -> PagePayload<T> {
        match self.total_elements {
            Some(total_elements) => {
                let total_pages = total_elements.div_ceil(self.window.page_size());
                let number = self.number();
                let first = self.is_first();
                let last = self.is_last();
                PagePayload::Page(PageBody {
                    content: self.content,
                    total_elements,
                    total_pages,
                    number,
                    first,
                    last,
                })
            }
            None => PagePayload::Slice(SliceBody {
                has_next: self.has_next,
                content: self.content,
            }),
        }
    }
}

/// Serialized page response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PagePayload<T> {
    Page(PageBody<T>),
    Slice(SliceBody<T>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
    pub first: bool,
    pub last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceBody<T> {
    pub content: Vec<T>,
    pub has_next: bool,
}
