//! Paging parameters and results shared by the list queries.

use sea_orm::{ColumnTrait, Condition};

/// Which page of a list to fetch, with an optional free-text filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Items per page
    pub limit: u64,
    /// Substring matched against the list's searchable columns
    pub search: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
        }
    }
}

impl PageRequest {
    /// Request for page `page` of `limit` items; zeros fall back to the defaults.
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        let defaults = Self::default();
        Self {
            page: if page == 0 { defaults.page } else { page },
            limit: if limit == 0 { defaults.limit } else { limit },
            search: None,
        }
    }

    /// Adds a search filter. Blank text means no filter.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Zero-based page index as expected by `SeaORM`'s paginator
    #[must_use]
    pub const fn page_index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    /// `LIKE '%search%'` over any of `columns`, or `None` when there is no filter.
    pub(crate) fn search_condition<C: ColumnTrait>(&self, columns: &[C]) -> Option<Condition> {
        let search = self.search.as_deref()?;
        Some(
            columns
                .iter()
                .fold(Condition::any(), |condition, column| {
                    condition.add(column.contains(search))
                }),
        )
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Items matching the filter across all pages
    pub total: u64,
    /// One-based page number
    pub page: u64,
    /// Page size
    pub limit: u64,
}

impl<T> Page<T> {
    /// Number of pages needed to show `total` items
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_zero_fallback() {
        assert_eq!(PageRequest::default(), PageRequest::new(0, 0));
        assert_eq!(PageRequest::new(3, 25).page_index(), 2);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(PageRequest::default().with_search("   ").search, None);
        assert_eq!(
            PageRequest::default().with_search(" ana ").search.as_deref(),
            Some("ana")
        );
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<()> = Page {
            items: Vec::new(),
            total: 21,
            page: 1,
            limit: 10,
        };
        assert_eq!(page.total_pages(), 3);

        let empty: Page<()> = Page {
            items: Vec::new(),
            total: 0,
            page: 1,
            limit: 10,
        };
        assert_eq!(empty.total_pages(), 0);
    }
}
