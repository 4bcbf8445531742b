//! Page requests.

use crate::error::QueryError;

use super::sort::{Direction, NullOrdering, Order, Sort};

/// Zero-based page index, page size and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
    sort: Sort,
}

impl PageRequest {
    /// Creates an unsorted page request.
    ///
    /// # Arguments
    /// * `offset` - Zero-based page index
    /// * `limit` - Page size
    ///
    /// # Returns
    /// `Err(QueryError::InvalidArgument)` if `offset < 0` or `limit <= 0`.
    pub fn of(offset: i64, limit: i64) -> Result<Self, QueryError> {
        if offset < 0 {
            return Err(QueryError::invalid(format!(
                "page offset must not be negative, got {}",
                offset
            )));
        }
        if limit <= 0 {
            return Err(QueryError::invalid(format!(
                "page limit must be positive, got {}",
                limit
            )));
        }
        let offset = usize::try_from(offset)
            .map_err(|_| QueryError::invalid(format!("page offset {} is too large", offset)))?;
        let limit = usize::try_from(limit)
            .map_err(|_| QueryError::invalid(format!("page limit {} is too large", limit)))?;

        Ok(Self {
            offset,
            limit,
            sort: Sort::unsorted(),
        })
    }

    /// First page of the given size.
    pub fn of_size(limit: i64) -> Result<Self, QueryError> {
        Self::of(0, limit)
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Sorts by a single key.
    pub fn sorted_by(
        self,
        key: impl Into<String>,
        direction: Direction,
        nulls: NullOrdering,
    ) -> Self {
        self.with_sort(Sort::by(Order::new(key, direction, nulls)))
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of rows preceding this page.
    pub fn row_offset(&self) -> Result<usize, QueryError> {
        self.offset.checked_mul(self.limit).ok_or_else(|| {
            QueryError::invalid(format!(
                "page {} of size {} overflows the row offset",
                self.offset, self.limit
            ))
        })
    }

    /// Rows to fetch when probing for a following slice.
    pub fn probe_limit(&self) -> usize {
        self.limit.saturating_add(1)
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(1),
            ..self.clone()
        }
    }

    pub fn first(&self) -> Self {
        Self {
            offset: 0,
            ..self.clone()
        }
    }
}
