//! Client-side search and pagination over fetched lists.

use serde::Serialize;

use crate::model::{Connection, EtlPipeline};

/// Rows per page in list views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Items that can be matched by a free-text search.
pub trait Searchable {
    /// Text fields matched case-insensitively by [`search`].
    fn search_fields(&self) -> Vec<&str>;

    /// Returns true if any search field contains the lowercased query.
    fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self
                .search_fields()
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Searchable for Connection {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.connection_type.as_str(),
            self.host.as_str(),
            self.database.as_str(),
        ]
    }
}

impl Searchable for EtlPipeline {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.status.as_ref()];
        if let Some(description) = self.description.as_deref() {
            fields.push(description);
        }
        fields
    }
}

/// Items matching the query, in their original order.
pub fn search<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.matches(query)).collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page actually shown.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slices `items` into the requested 1-based page.
///
/// Page 0 is treated as page 1 and pages past the end are clamped to the
/// last page. A zero page size falls back to [`DEFAULT_PAGE_SIZE`].
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Search box plus pager over a fetched list.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    items: Vec<T>,
    query: String,
    page: usize,
    page_size: usize,
}

impl<T: Searchable + Clone> ListView<T> {
    /// Creates a view on page 1 with no query.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            query: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Replaces the items after a refetch. The query and page are kept.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Changes the query and resets to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Moves to a page; out-of-range pages are clamped when rendered.
    pub fn go_to(&mut self, page: usize) {
        self.page = page;
    }

    /// All items matching the current query.
    pub fn filtered(&self) -> Vec<T> {
        search(&self.items, &self.query).into_iter().cloned().collect()
    }

    /// The current page of filtered items.
    pub fn current(&self) -> Page<T> {
        paginate(&self.filtered(), self.page, self.page_size)
    }
}
