//! Slice results decided by a one-row probe instead of a count.

use serde::Serialize;

use crate::error::QueryError;

use super::request::PageRequest;

/// A window of results that only knows whether a next window exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceResult<T> {
    content: Vec<T>,
    page_number: usize,
    page_size: usize,
    is_first: bool,
    has_next: bool,
}

impl<T> SliceResult<T> {
    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> usize {
        self.page_number
    }

    pub fn size(&self) -> usize {
        self.page_size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
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

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> SliceResult<U> {
        SliceResult {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            is_first: self.is_first,
            has_next: self.has_next,
        }
    }

    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<SliceResult<U>, E> {
        Ok(SliceResult {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            page_number: self.page_number,
            page_size: self.page_size,
            is_first: self.is_first,
            has_next: self.has_next,
        })
    }
}

/// Builds a slice from rows fetched with `request.probe_limit()`.
///
/// # Arguments
/// * `items_with_one_extra` - Up to `limit + 1` rows starting at the page's row offset
/// * `request` - The page request
///
/// # Returns
/// A slice of at most `limit` rows; `has_next` is `true` when the probe row
/// was present. More than `limit + 1` rows is an `InvalidArgument`.
pub fn slice<T>(
    mut items_with_one_extra: Vec<T>,
    request: &PageRequest,
) -> Result<SliceResult<T>, QueryError> {
    let limit = request.limit();
    if items_with_one_extra.len() > request.probe_limit() {
        return Err(QueryError::invalid(format!(
            "slice probe returned {} rows, expected at most {}",
            items_with_one_extra.len(),
            request.probe_limit()
        )));
    }

    let has_next = items_with_one_extra.len() > limit;
    items_with_one_extra.truncate(limit);

    Ok(SliceResult {
        content: items_with_one_extra,
        page_number: request.offset(),
        page_size: limit,
        is_first: request.offset() == 0,
        has_next,
    })
}
