//! Pagination types for search results.

use serde::{Deserialize, Serialize};

use super::Facet;

/// Pagination configuration for a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of results to return.
    pub count: u32,

    /// Number of results to skip.
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            count: 20,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Creates pagination for the first page with the specified count.
    pub fn new(count: u32) -> Self {
        Self { count, offset: 0 }
    }

    /// Creates pagination starting at `offset` with the default count.
    pub fn offset(offset: u32) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Creates pagination for a zero-based page number.
    pub fn page(number: u32, count: u32) -> Self {
        Self {
            count,
            offset: number.saturating_mul(count),
        }
    }

    /// Sets the count limit.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Index one past the last requested result.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.count)
    }

    /// Pagination for the following page.
    pub fn next(&self) -> Self {
        Self {
            count: self.count,
            offset: self.offset.saturating_add(self.count),
        }
    }
}

/// Information about a page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total count of matching documents (if available).
    pub total: Option<u64>,

    /// Whether there are more results after this page.
    pub has_next: bool,

    /// Whether there are results before this page.
    pub has_previous: bool,
}

impl PageInfo {
    /// Creates page info indicating no more pages.
    pub fn end() -> Self {
        Self {
            total: None,
            has_next: false,
            has_previous: false,
        }
    }

    /// Derives page info from the total hit count.
    pub fn from_total(pagination: &Pagination, total: u64) -> Self {
        Self {
            total: Some(total),
            has_next: pagination.end() < total,
            has_previous: pagination.offset > 0,
        }
    }

    /// Sets the total count.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// A page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,

    /// Pagination information.
    pub page_info: PageInfo,

    /// Facets computed over the whole result set, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

impl<T> Page<T> {
    /// Creates a new page with the given items and page info.
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self {
            items,
            page_info,
            facets: Vec::new(),
        }
    }

    /// Creates an empty page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), PageInfo::end())
    }

    /// Attaches facets.
    pub fn with_facets(mut self, facets: Vec<Facet>) -> Self {
        self.facets = facets;
        self
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
            facets: self.facets,
        }
    }

    /// Keeps the items matching `predicate`.
    ///
    /// Page info is left as is; the total still counts engine hits.
    pub fn retain<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(predicate);
        self
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
