//! Page results backed by a total count.

use serde::Serialize;

use crate::error::QueryError;

use super::request::PageRequest;

/// A window of results plus total-count metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    content: Vec<T>,
    total_elements: usize,
    page_number: usize,
    page_size: usize,
    total_pages: usize,
    is_first: bool,
    has_next: bool,
}

impl<T> PageResult<T> {
    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    /// Zero-based page index.
    pub fn number(&self) -> usize {
        self.page_number
    }

    pub fn size(&self) -> usize {
        self.page_size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_first(&self) -> bool {
        self.is_first
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        !self.is_first
    }

    /// Maps the content, keeping page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PageResult<U> {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            is_first: self.is_first,
            has_next: self.has_next,
        }
    }

    /// Fallible variant of [`PageResult::map`].
    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<PageResult<U>, E> {
        Ok(PageResult {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            total_elements: self.total_elements,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            is_first: self.is_first,
            has_next: self.has_next,
        })
    }
}

/// Builds a page from already fetched rows and a separately counted total.
///
/// # Arguments
/// * `items` - Rows of the requested page, already sorted and windowed
/// * `total_count` - Number of rows matching the query across all pages
/// * `request` - The page request the rows were fetched for
///
/// # Returns
/// `Err(QueryError::InvalidArgument)` if `items` holds more rows than the page
/// size.
///
/// # Notes
/// - When the page is not empty and reaches past `total_count`, the total is
///   taken from the rows actually seen (`row_offset + items.len()`), since a
///   short last page is more recent than the count.
pub fn paginate<T>(
    items: Vec<T>,
    total_count: usize,
    request: &PageRequest,
) -> Result<PageResult<T>, QueryError> {
    let limit = request.limit();
    if items.len() > limit {
        return Err(QueryError::invalid(format!(
            "page content has {} rows but page size is {}",
            items.len(),
            limit
        )));
    }

    let row_offset = request.row_offset()?;
    let mut total_elements = total_count;
    if !items.is_empty() && row_offset.saturating_add(limit) > total_count {
        let seen = row_offset + items.len();
        if seen != total_count {
            tracing::warn!(
                "Reconciling page total from {} to {} (page {}, size {})",
                total_count,
                seen,
                request.offset(),
                limit
            );
        }
        total_elements = seen;
    }

    let page_number = request.offset();
    Ok(PageResult {
        content: items,
        total_elements,
        page_number,
        page_size: limit,
        total_pages: total_elements.div_ceil(limit),
        is_first: page_number == 0,
        has_next: page_number.saturating_add(1).saturating_mul(limit) < total_elements,
    })
}
