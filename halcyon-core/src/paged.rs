//! Paged collection state.
//!
//! A [`PagedCollection`] is a hydrated page of items plus the HAL page
//! metadata and navigational hrefs needed to move to a sibling page. The
//! value itself is immutable; every transition (driven by the client) builds
//! a fresh collection.

use std::slice;

use crate::constants::{DEFAULT_EMBEDDED_KEY, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, DEFAULT_TOTAL_PAGES};
use crate::error::{HalError, HalResult, PageLink};
use crate::options::Sort;
use crate::url::QueryUrl;

#[derive(Debug, Clone, PartialEq)]
pub struct PagedCollection<T> {
    pub items: Vec<T>,
    /// Payload property the items were read from.
    pub embedded_key: String,
    pub self_uri: Option<String>,
    pub next_uri: Option<String>,
    pub prev_uri: Option<String>,
    pub first_uri: Option<String>,
    pub last_uri: Option<String>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page_number: u64,
    pub page_size: u64,
    /// Sort spec carried across page transitions.
    pub sort: Vec<Sort>,
}

impl<T> PagedCollection<T> {
    /// Collection with no items and default page metadata.
    pub fn empty(embedded_key: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            embedded_key: embedded_key.into(),
            self_uri: None,
            next_uri: None,
            prev_uri: None,
            first_uri: None,
            last_uri: None,
            total_elements: 0,
            total_pages: DEFAULT_TOTAL_PAGES,
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, sort: Vec<Sort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn has_next(&self) -> bool {
        self.next_uri.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev_uri.is_some()
    }

    pub fn has_first(&self) -> bool {
        self.first_uri.is_some()
    }

    pub fn has_last(&self) -> bool {
        self.last_uri.is_some()
    }

    /// The href behind `link`, or `NavigationNotAvailable` when the server
    /// did not supply it.
    pub fn link_uri(&self, link: PageLink) -> HalResult<&str> {
        let uri = match link {
            PageLink::Next => &self.next_uri,
            PageLink::Prev => &self.prev_uri,
            PageLink::First => &self.first_uri,
            PageLink::Last => &self.last_uri,
            PageLink::Current => &self.self_uri,
        };
        uri.as_deref()
            .ok_or(HalError::NavigationNotAvailable { link })
    }

    /// URL of page `page` at the current size, built from `base` (the
    /// absolute self URI).
    pub fn page_request_uri(&self, base: &str, page: u64) -> HalResult<String> {
        self.rebuild(
            base,
            &[("size", self.page_size.to_string()), ("page", page.to_string())],
            &[],
            &self.sort,
        )
    }

    /// URL of the first page at a new page size.
    pub fn size_request_uri(&self, base: &str, size: u64) -> HalResult<String> {
        self.rebuild(base, &[("size", size.to_string())], &["page"], &self.sort)
    }

    /// URL of the current page under a new sort spec.
    pub fn sort_request_uri(&self, base: &str, sort: &[Sort]) -> HalResult<String> {
        self.rebuild(
            base,
            &[
                ("size", self.page_size.to_string()),
                ("page", self.page_number.to_string()),
            ],
            &[],
            sort,
        )
    }

    fn rebuild(
        &self,
        base: &str,
        set: &[(&str, String)],
        remove: &[&str],
        sort: &[Sort],
    ) -> HalResult<String> {
        let mut url = QueryUrl::parse(base)?;
        for (key, value) in set {
            url.set(key, value.clone());
        }
        for key in remove {
            url.remove(key);
        }
        url.remove("sort");
        for s in sort {
            url.append("sort", s.query_value());
        }
        Ok(url.to_string())
    }
}

impl<T> Default for PagedCollection<T> {
    fn default() -> Self {
        Self::empty(DEFAULT_EMBEDDED_KEY)
    }
}

impl<'a, T> IntoIterator for &'a PagedCollection<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for PagedCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
